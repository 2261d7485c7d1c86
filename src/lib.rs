//! Helpers for configuring a structured logger.
//!
//! * [`configure_json_formatter`] switches a logger to JSON output with the `@timestamp`,
//!   `message` and `level_name` keys.
//! * [`configure_level`] applies a textual level and falls back to `warn` if it is invalid.
//! * [`enrich_with_trace`] attaches trace and span IDs, plus the trace ID in UUID form when it
//!   is 16 bytes long.
//!
//! The helpers work with any logger implementing [`ConfigurableLogger`] and [`FieldLogger`].
//! [`Logger`] is the implementation shipped with this crate; it also acts as a `tracing`
//! [`Layer`](tracing_subscriber::Layer), so events emitted with the `tracing` macros go through
//! the same formatter and level.
//!
//! ```rust
//! use logger_kit::{configure_json_formatter, configure_level, enrich_with_trace, FieldLogger, Logger};
//!
//! let logger = Logger::builder().with_writer(std::io::sink).build();
//! configure_level(configure_json_formatter(&logger), "debug");
//!
//! enrich_with_trace(&logger, "4bf92f3577b34da6", "00f067aa").debug("handling request");
//! ```

mod builder;
mod configure;
mod entry;
mod fields;
mod formatter;
mod layer;
mod level;
mod logger;
mod trace;
mod visitor;
mod write_adaptor;

#[cfg(test)]
mod tests;

use std::error::Error;

pub use builder::LoggerBuilder;
pub use configure::{
    configure_from_env,
    configure_json_formatter,
    configure_level,
    json_field_map,
    FORMAT_ENV,
    LEVEL_ENV,
};
pub use entry::{Entry, ERROR_KEY};
pub use formatter::{FieldKey, FieldMap, Fields, Formatter, JsonFormatter, Record, TextFormatter};
pub use level::{Level, ParseLevelError};
pub use logger::{ConfigurableLogger, FieldLogger, Logger};
pub use trace::{
    enrich_with_trace,
    trace_span,
    trace_uuid,
    TraceIdError,
    SPAN_ID_KEY,
    TRACE_ID_KEY,
    TRACE_UUID_KEY,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a [`Logger`] as the global `tracing` subscriber, configured from the
/// [`LOG_LEVEL`](LEVEL_ENV) and [`LOG_FORMAT`](FORMAT_ENV) environment variables.
///
/// If the `tracing-log` feature is enabled, this will also install the [`LogTracer`] to convert
/// `log` records into `tracing` `Event`s.
///
/// The returned handle can be used to log entries directly or to change the configuration
/// later.
///
/// # Errors
///
/// Returns an Error if the initialization was unsuccessful, likely because a global subscriber
/// was already installed by another call to `try_init`.
///
/// [`LogTracer`]: https://docs.rs/tracing-log/0.2.0/tracing_log/struct.LogTracer.html
pub fn try_init() -> Result<Logger, Box<dyn Error + Send + Sync + 'static>> {
    let logger = Logger::default();
    configure_from_env(&logger);

    tracing_subscriber::registry()
        .with(logger.clone())
        .try_init()?;

    Ok(logger)
}

/// Install a [`Logger`] as the global `tracing` subscriber.
///
/// See [`try_init`] for details.
///
/// # Panics
/// Panics if the initialization was unsuccessful, likely because a global subscriber was
/// already installed by another call to `try_init`.
pub fn init() -> Logger {
    try_init().expect("Unable to install global subscriber")
}
