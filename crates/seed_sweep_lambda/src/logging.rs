use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Installs a JSON line subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second call in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .with_target(false)
        .try_init();
}

pub(crate) fn log_info(component: &str, event: &str, job_id: &str, details: Value) {
    tracing::info!(component, event, job_id, details = %details);
}

pub(crate) fn log_warn(component: &str, event: &str, job_id: &str, details: Value) {
    tracing::warn!(component, event, job_id, details = %details);
}

pub(crate) fn log_error(component: &str, event: &str, job_id: &str, details: Value) {
    tracing::error!(component, event, job_id, details = %details);
}
