//! Logging setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Set to `json` for one JSON object per log line.
pub const LOG_FORMAT_ENV: &str = "DOCCHAT_LOG_FORMAT";

/// Install the global subscriber. `RUST_LOG` filters, defaulting to `info`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let _ = if json {
        registry.with(tracing_subscriber::fmt::layer().json().with_target(false)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(false)).try_init()
    };
}
