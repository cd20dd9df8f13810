//! Unit tests for precheck configuration types.
//!
//! - [`helpers`] - Shared fixtures and helper functions
//! - [`types_tests`] - Defaults and TOML deserialisation
//! - [`validation`] - Scenario and wait validation
//! - [`layer_precedence_tests`] - `MergeComposer` layer precedence

mod helpers;
