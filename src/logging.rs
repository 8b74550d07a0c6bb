use std::path::Path;
use tracing::subscriber::set_global_default;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initialize structured logging: JSON audit file (daily rotation) plus
/// console output. Credentials and patient details stay out of log fields.
pub fn init_logging(log_dir: impl AsRef<Path>, log_level: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.as_ref(), "audit.log");

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_target(true);

    let console_layer = fmt::layer().with_target(true);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = Registry::default()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer);

    set_global_default(subscriber)?;

    tracing::info!("Logging initialized with level: {}", log_level);

    Ok(())
}

/// Audit events for authentication activity.
#[macro_export]
macro_rules! audit_log {
    ($event_type:expr, $action:expr, $username:expr, $success:expr) => {
        tracing::info!(
            event_type = $event_type,
            action = $action,
            username = %$username,
            success = $success,
            timestamp = chrono::Utc::now().to_rfc3339(),
            "AUDIT_EVENT"
        );
    };
}
