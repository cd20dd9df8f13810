//! Startup diagnostics emitted by the image under test, and the verdict
//! derived from them.
//!
//! The image prints one line per precondition check, `✓ <detail>` when the
//! check passes and `✗ <detail>` when it fails, then a single
//! `Finished: SUCCESS` or `Finished: ERROR` line. Output captured through a
//! tty uses `\r\n` line endings; both are accepted.
//!
//! [`StartupReport`] is a structured view of that output for display.
//! [`evaluate`] decides pass or fail by substring membership against the raw
//! log text, so a diagnostic counts as present wherever it appears.

mod verdict;


use std::fmt;

pub use verdict::{Mismatch, Verdict, evaluate, evaluate_snapshot};

/// Glyph prefixing a passed check.
const PASS_GLYPH: char = '✓';

/// Glyph prefixing a failed check.
const FAIL_GLYPH: char = '✗';

/// Prefix of the line that ends the diagnostic output.
pub const FINISHED_PREFIX: &str = "Finished:";

/// Final line of a startup whose preconditions all held.
pub const SUCCESS_MARKER: &str = "Finished: SUCCESS";

/// Final line of a startup with at least one failed precondition.
pub const ERROR_MARKER: &str = "Finished: ERROR";

/// Whether `logs` already contain a `Finished:` line.
#[must_use]
pub fn contains_finished_marker(logs: &str) -> bool {
    logs.contains(FINISHED_PREFIX)
}

/// A diagnostic line the image must print for a broken precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedDiagnostic {
    /// A mounted directory the service user cannot write to.
    NotWritable {
        /// Container path of the directory.
        path: String,
        /// User the check runs as.
        user: String,
    },
    /// A referenced file that does not exist.
    DoesNotExist {
        /// Path of the missing file.
        path: String,
    },
}

impl ExpectedDiagnostic {
    /// Render the exact line the image prints.
    #[must_use]
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExpectedDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotWritable { path, user } => {
                write!(f, "{FAIL_GLYPH} {path} not writable by {user}")
            }
            Self::DoesNotExist { path } => write!(f, "{FAIL_GLYPH} {path} does not exist"),
        }
    }
}

/// A `✗` line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailedCheck {
    /// `✗ <path> not writable by <user>`
    NotWritable {
        /// Directory path.
        path: String,
        /// User named by the check.
        user: String,
    },
    /// `✗ <path> does not exist`
    DoesNotExist {
        /// File path.
        path: String,
    },
    /// Any other failed check, verbatim after the glyph.
    Other(String),
}

impl FailedCheck {
    fn classify(detail: &str) -> Self {
        if let Some(path) = detail.strip_suffix(" does not exist") {
            return Self::DoesNotExist {
                path: path.to_owned(),
            };
        }
        match detail.rsplit_once(" not writable by ") {
            Some((path, user)) => Self::NotWritable {
                path: path.to_owned(),
                user: user.to_owned(),
            },
            None => Self::Other(detail.to_owned()),
        }
    }
}

/// The `Finished:` marker, if the image printed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishedMarker {
    /// `Finished: SUCCESS`
    Success,
    /// `Finished: ERROR`
    Error,
    /// Some other word after `Finished:`.
    Other(String),
}

impl fmt::Display for FinishedMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Error => f.write_str("ERROR"),
            Self::Other(word) => f.write_str(word),
        }
    }
}

/// Structured view of the image's startup output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Detail text of each `✓` line, in order.
    pub passed: Vec<String>,
    /// Each `✗` line, in order.
    pub failed: Vec<FailedCheck>,
    /// The last `Finished:` marker seen.
    pub finished: Option<FinishedMarker>,
}

impl StartupReport {
    /// Parse captured log text.
    ///
    /// Lines are split on `\n` with a trailing `\r` removed. Text before the
    /// glyph or marker on a line (a timestamp, a log prefix) is ignored.
    #[must_use]
    pub fn parse(logs: &str) -> Self {
        let mut report = Self::default();

        for raw_line in logs.lines() {
            let line = raw_line.trim_end_matches('\r');

            if let Some((_, detail)) = line.split_once(FAIL_GLYPH) {
                report.failed.push(FailedCheck::classify(detail.trim()));
            } else if let Some((_, detail)) = line.split_once(PASS_GLYPH) {
                report.passed.push(detail.trim().to_owned());
            } else if let Some((_, word)) = line.split_once(FINISHED_PREFIX) {
                report.finished = Some(match word.trim() {
                    "SUCCESS" => FinishedMarker::Success,
                    "ERROR" => FinishedMarker::Error,
                    other => FinishedMarker::Other(other.to_owned()),
                });
            }
        }

        report
    }
}
