//! Structured logging setup for the `precheck` binary.
//!
//! Logs go to stderr so the verification report on stdout stays
//! machine-readable. `RUST_LOG` takes precedence over `--verbose`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Default directive without `--verbose`.
const DEFAULT_DIRECTIVE: &str = "precheck=info,warn";

/// Default directive with `--verbose`.
const VERBOSE_DIRECTIVE: &str = "precheck=debug,info";

/// Pick the filter directive used when `RUST_LOG` is unset.
#[must_use]
pub const fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    }
}

/// Install the global subscriber.
///
/// A second call leaves the first subscriber in place.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();

    if let Err(error) = installed {
        tracing::debug!(%error, "tracing subscriber already installed");
    }
}
