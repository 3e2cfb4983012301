//! Structured logging configuration.
//!
//! Logs go to stderr so command output on stdout stays machine readable.
//! Records emitted through the `log` facade by the standings library are
//! picked up by the subscriber as well.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var
/// (default: `info,sqlx=warn`).
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Log the outcome of a standings recompute
pub fn log_recompute(event_id: i32, applied: usize, failed: &[i32]) {
    if failed.is_empty() {
        tracing::info!(event_id, applied, "Recompute complete");
    } else {
        tracing::warn!(
            event_id,
            applied,
            failed = ?failed,
            "Recompute incomplete, rerun to retry failed teams"
        );
    }
}
