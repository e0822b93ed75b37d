use std::time::Duration;

use goldfish_domain::GoldfishError;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,goldfish=debug,tower_http=info";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. `GOLDFISH_LOG_JSON=1` switches
/// to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("GOLDFISH_LOG_JSON").is_ok_and(|value| value == "1" || value == "true");

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    if let Err(err) = result {
        warn!(error = %err, "tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"tasks::list"`).
/// * `elapsed` - Duration the command execution took.
/// * `error` - Failure, if any.
///
/// Callers must avoid forwarding credentials in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&GoldfishError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => {
            warn!(command, duration_ms, error_type = error_label(err), error = %err, "command_execution_failure");
        }
    }
}

/// Convert a `GoldfishError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &GoldfishError) -> &'static str {
    match error {
        GoldfishError::Database(_) => "database",
        GoldfishError::Config(_) => "config",
        GoldfishError::Network(_) => "network",
        GoldfishError::Auth(_) => "auth",
        GoldfishError::Upstream { .. } => "upstream",
        GoldfishError::PartialItem(_) => "partial_item",
        GoldfishError::NotFound(_) => "not_found",
        GoldfishError::InvalidInput(_) => "invalid_input",
        GoldfishError::Internal(_) => "internal",
    }
}
