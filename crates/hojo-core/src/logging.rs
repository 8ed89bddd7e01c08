//! Logging integration for hojo.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-unit-of-work spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` (e.g. "debug", "info",
/// "`hojo_db=debug`"). In debug mode a pretty, human-readable format is used;
/// otherwise a structured JSON format is used. Installing twice is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one unit of work against the database.
///
/// Every statement logged while the span is entered carries the model name
/// and the operation.
///
/// # Examples
///
/// ```
/// use hojo_core::logging::unit_of_work_span;
///
/// let span = unit_of_work_span("Soldier", "bulk_create");
/// let _guard = span.enter();
/// tracing::debug!("inserting rows");
/// ```
pub fn unit_of_work_span(model: &str, operation: &str) -> tracing::Span {
    tracing::debug_span!("unit_of_work", model = model, operation = operation)
}
