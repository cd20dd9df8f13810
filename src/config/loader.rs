//! Configuration loading with layered precedence.
//!
//! Layers, lowest to highest: application defaults, configuration file,
//! `PRECHECK_*` environment variables, command-line arguments.
//!
//! Layers are composed by hand with `MergeComposer` rather than through the
//! derived `load()`: the clap `Cli` owns subcommand dispatch, and the
//! environment layer below rejects unparseable typed values instead of
//! silently dropping them. A `PRECHECK_WAIT_TIMEOUT_MS=soon` is an error, not a
//! fallback to the default timeout.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use clap::ValueEnum;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli, Commands, WaitStrategyKind};
use crate::error::{ConfigError, Result};

/// Expected shape of an environment variable value.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// Accepted verbatim.
    String,
    /// `true` or `false`.
    Bool,
    /// Unsigned 64-bit integer.
    U64,
    /// `poll` or `fixed`, case-insensitive.
    WaitStrategy,
}

/// Maps one environment variable onto a configuration path.
struct EnvVarSpec {
    env_var: &'static str,
    path: &'static [&'static str],
    var_type: EnvVarType,
}

const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "PRECHECK_ENGINE_SOCKET",
        path: &["engine_socket"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "PRECHECK_IMAGE",
        path: &["image"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "PRECHECK_SCENARIO_CONTAINER_NAME",
        path: &["scenario", "container_name"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "PRECHECK_SCENARIO_SERVICE_USER",
        path: &["scenario", "service_user"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "PRECHECK_SCENARIO_TTY",
        path: &["scenario", "tty"],
        var_type: EnvVarType::Bool,
    },
    EnvVarSpec {
        env_var: "PRECHECK_WAIT_STRATEGY",
        path: &["wait", "strategy"],
        var_type: EnvVarType::WaitStrategy,
    },
    EnvVarSpec {
        env_var: "PRECHECK_WAIT_SETTLE_DELAY_MS",
        path: &["wait", "settle_delay_ms"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "PRECHECK_WAIT_TIMEOUT_MS",
        path: &["wait", "timeout_ms"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "PRECHECK_WAIT_POLL_INTERVAL_MS",
        path: &["wait", "poll_interval_ms"],
        var_type: EnvVarType::U64,
    },
];

/// Returns the environment variable names the loader reads.
///
/// Tests use this to clear every `PRECHECK_*` variable before loading.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Read and parse a TOML file, pushing it as the file layer.
fn load_config_file(path: &Utf8Path, composer: &mut MergeComposer) -> Result<()> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    tracing::debug!(%path, "loaded configuration file");
    composer.push_file(value, Some(path.to_path_buf()));
    Ok(())
}

/// Pick the configuration file: an explicit `--config` must exist, otherwise
/// the first discovered candidate is used.
fn resolve_config_path(cli: &Cli) -> Result<Option<Utf8PathBuf>> {
    if let Some(explicit) = &cli.config {
        if !explicit.exists() {
            return Err(ConfigError::FileNotFound {
                path: explicit.clone().into_std_path_buf(),
            }
            .into());
        }
        return Ok(Some(explicit.clone()));
    }

    let discovery = ConfigDiscovery::builder("precheck")
        .env_var("PRECHECK_CONFIG_PATH")
        .config_file_name("config.toml")
        .dotfile_name(".precheck.toml")
        .build();
    Ok(discovery
        .candidates()
        .into_iter()
        .filter(|candidate| candidate.exists())
        .find_map(|candidate| Utf8PathBuf::try_from(candidate).ok()))
}

/// Load configuration with full layer precedence.
///
/// # Errors
///
/// Returns `ConfigError` when:
/// - an explicit `--config` path does not exist
/// - a configuration file cannot be read or parsed
/// - a typed `PRECHECK_*` variable has an unparseable value
/// - the merged layers do not deserialise into [`AppConfig`]
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(path) = resolve_config_path(cli)? {
        load_config_file(&path, &mut composer)?;
    }

    let env_values = collect_env_vars()?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;
    Ok(config)
}

/// Collect `PRECHECK_*` variables into a nested JSON object.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` when a bool or integer variable does
/// not parse, or when `PRECHECK_WAIT_STRATEGY` names an unknown strategy.
fn collect_env_vars() -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Ok(raw_value) = std::env::var(spec.env_var) else {
            continue;
        };
        let json_value = parse_env_value(spec, raw_value)?;
        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

fn parse_env_value(spec: &EnvVarSpec, raw_value: String) -> Result<Value> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: spec.env_var.to_owned(),
        reason,
    };

    match spec.var_type {
        EnvVarType::String => Ok(Value::String(raw_value)),
        EnvVarType::Bool => raw_value
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| invalid(format!("expected bool (true/false), got '{raw_value}'")).into()),
        EnvVarType::U64 => raw_value
            .parse::<u64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| invalid(format!("expected unsigned integer, got '{raw_value}'")).into()),
        EnvVarType::WaitStrategy => WaitStrategyKind::from_str(&raw_value, true)
            .map(|strategy| Value::String(strategy.as_str().to_owned()))
            .map_err(|_| invalid(format!("expected poll or fixed, got '{raw_value}'")).into()),
    }
}

/// Insert `value` at a nested `path`, creating intermediate objects.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

/// Build the CLI layer from global flags and `verify` arguments.
fn build_cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();

    if let Some(socket) = &cli.engine_socket {
        overrides.insert("engine_socket".to_owned(), Value::String(socket.clone()));
    }
    if let Some(image) = &cli.image {
        overrides.insert("image".to_owned(), Value::String(image.clone()));
    }

    if let Commands::Verify(args) = &cli.command {
        if let Some(name) = &args.name {
            insert_at_path(
                &mut overrides,
                &["scenario", "container_name"],
                Value::String(name.clone()),
            );
        }
        if let Some(strategy) = args.wait {
            insert_at_path(
                &mut overrides,
                &["wait", "strategy"],
                Value::String(strategy.as_str().to_owned()),
            );
        }
    }

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}
