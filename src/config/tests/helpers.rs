//! Shared fixtures and helper functions for config tests.

use std::sync::Arc;

use ortho_config::MergeComposer;
use ortho_config::serde_json::json;
use rstest::fixture;

use crate::config::{AppConfig, ScenarioConfig, WaitStrategyKind};
use crate::engine::ContainerStatus;

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        engine_socket = "unix:///run/podman/podman.sock"
        image = "registry.example/ldp-web:1.4"

        [scenario]
        container_name = "ldp-precheck"
        service_user = "app"
        tty = false
        accepted_statuses = ["exited"]

        [[scenario.mounts]]
        source = "/nowhere/uploads"
        target = "/srv/uploads"

        [[scenario.file_references]]
        name = "TLS_KEY"
        path = "/missing/tls.key"

        [wait]
        strategy = "fixed"
        settle_delay_ms = 5000
        timeout_ms = 60000
        poll_interval_ms = 500
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        image = "registry.example/ldp-web:1.4"

        [wait]
        timeout_ms = 5000
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing the default scenario.
#[fixture]
pub fn default_scenario() -> ScenarioConfig {
    ScenarioConfig::default()
}

/// Creates a `MergeComposer` with the defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Asserts that a config carries every default value.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(config.engine_socket.is_none(), "engine_socket should be None");
    assert!(config.image.is_none(), "image should be None");
    assert!(config.scenario.container_name.is_none());
    assert_eq!(config.scenario.service_user, "node");
    assert!(config.scenario.tty, "scenario.tty should be true");
    assert_eq!(
        config.scenario.accepted_statuses,
        vec![ContainerStatus::Created, ContainerStatus::Exited]
    );
    assert_eq!(config.scenario.mounts.len(), 3);
    assert_eq!(config.scenario.file_references.len(), 2);
    assert_eq!(config.wait.strategy, WaitStrategyKind::Poll);
    assert_eq!(config.wait.settle_delay_ms, 2_000);
    assert_eq!(config.wait.timeout_ms, 30_000);
    assert_eq!(config.wait.poll_interval_ms, 250);
}

/// Creates a composer with defaults, a file layer and an env layer.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "engine_socket": "unix:///from/file.sock",
            "image": "file-image:latest",
            "wait": { "strategy": "fixed", "settle_delay_ms": 3000 }
        }),
        None,
    );

    composer.push_environment(json!({
        "engine_socket": "unix:///from/env.sock",
        "wait": { "settle_delay_ms": 4000 }
    }));

    Ok(composer)
}
