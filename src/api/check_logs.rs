//! Offline evaluation of captured container output.

use std::io::ErrorKind;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::config::AppConfig;
use crate::engine::ContainerStatus;
use crate::error::{FilesystemError, Result as PrecheckResult};
use crate::report::{Verdict, evaluate};
use crate::scenario::BrokenScenario;

/// Judge a log file captured from the image against the configured scenario.
///
/// `status` is the container status observed when the logs were captured.
///
/// # Errors
///
/// Returns `FilesystemError` when the file cannot be read and
/// `ConfigError::InvalidValue` when the scenario is invalid.
pub fn check_logs(
    path: &Utf8Path,
    status: ContainerStatus,
    config: &AppConfig,
) -> PrecheckResult<Verdict> {
    config.scenario.validate()?;
    let logs = read_log_file(path)?;
    let scenario = BrokenScenario::from_config(&config.scenario);
    Ok(evaluate(
        &scenario,
        &config.scenario.accepted_statuses,
        status,
        &logs,
    ))
}

fn read_log_file(path: &Utf8Path) -> PrecheckResult<String> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().unwrap_or(path.as_str());

    let bytes = Dir::open_ambient_dir(parent, ambient_authority())
        .and_then(|dir| dir.read(file_name))
        .map_err(|error| filesystem_error(path, &error))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn filesystem_error(path: &Utf8Path, error: &std::io::Error) -> FilesystemError {
    let std_path = path.as_std_path().to_path_buf();
    match error.kind() {
        ErrorKind::NotFound => FilesystemError::NotFound { path: std_path },
        ErrorKind::PermissionDenied => FilesystemError::PermissionDenied { path: std_path },
        _ => FilesystemError::IoError {
            path: std_path,
            message: error.to_string(),
        },
    }
}
