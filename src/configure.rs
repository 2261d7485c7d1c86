use std::env::{self, VarError};

use crate::{
    formatter::{FieldKey, FieldMap, Formatter, JsonFormatter},
    level::Level,
    logger::{ConfigurableLogger, FieldLogger},
};

/// Environment variable read by [`configure_from_env`] for the level.
pub const LEVEL_ENV: &str = "LOG_LEVEL";
/// Environment variable read by [`configure_from_env`] for the formatter, `json` or `text`.
pub const FORMAT_ENV: &str = "LOG_FORMAT";

/// The field names used by [`configure_json_formatter`]:
///
/// * time -> `@timestamp`
/// * message -> `message`
/// * level -> `level_name`
pub fn json_field_map() -> FieldMap {
    FieldMap::new()
        .with(FieldKey::Time, "@timestamp")
        .with(FieldKey::Message, "message")
        .with(FieldKey::Level, "level_name")
}

/// Sets the formatter of the given logger to a [`JsonFormatter`] using [`json_field_map`].
///
/// Any previously configured formatter is replaced.
///
/// # Examples
///
/// ```rust
/// use logger_kit::{configure_json_formatter, json_field_map, Logger};
///
/// let logger = Logger::default();
/// configure_json_formatter(&logger);
///
/// let formatter = logger.formatter();
/// assert_eq!(formatter.as_json().unwrap().field_map(), &json_field_map());
/// ```
pub fn configure_json_formatter<L: ConfigurableLogger>(logger: &L) -> &L {
    logger.set_formatter(Formatter::Json(
        JsonFormatter::new().with_field_map(json_field_map()),
    ));
    logger
}

/// Sets a textual log level on the given logger.
///
/// If `level` cannot be parsed the logger is set to [`Level::Warn`], whatever its previous
/// level was, and a warning with the `previous` and `desired` levels and the parse error is
/// logged on it.
///
/// # Examples
///
/// ```rust
/// use logger_kit::{configure_level, Level, Logger};
///
/// let logger = Logger::builder().with_writer(std::io::sink).build();
///
/// configure_level(&logger, "debug");
/// assert_eq!(logger.level(), Level::Debug);
///
/// configure_level(&logger, "dbug");
/// assert_eq!(logger.level(), Level::Warn);
/// ```
pub fn configure_level<'a, L>(logger: &'a L, level: &str) -> &'a L
where
    L: ConfigurableLogger + FieldLogger,
{
    let previous = logger.level();
    match level.parse::<Level>() {
        Ok(level) => logger.set_level(level),
        Err(error) => {
            logger.set_level(Level::Warn);
            logger
                .with_fields([("previous", previous.to_string()), ("desired", level.to_owned())])
                .with_error(&error)
                .warn("could not change logger level, setting level to warning");
        },
    }

    logger
}

/// Applies [`LEVEL_ENV`] through [`configure_level`] and [`FORMAT_ENV`] through
/// [`configure_json_formatter`] when they are set.
///
/// Values that are not unicode, and formats other than `json` and `text`, are reported on stderr
/// and ignored.
pub fn configure_from_env<L>(logger: &L) -> &L
where
    L: ConfigurableLogger + FieldLogger,
{
    match env::var(LEVEL_ENV) {
        Ok(level) => {
            configure_level(logger, &level);
        },
        Err(VarError::NotPresent) => {},
        Err(e) => eprintln!("[logger-kit] Ignoring `{LEVEL_ENV}`: {e}"),
    }

    match env::var(FORMAT_ENV).as_deref() {
        Ok("json") => {
            configure_json_formatter(logger);
        },
        Ok("text") => logger.set_formatter(Formatter::default()),
        Ok(other) => {
            eprintln!("[logger-kit] Ignoring `{FORMAT_ENV}={other:?}`: expected `json` or `text`");
        },
        Err(VarError::NotPresent) => {},
        Err(e) => eprintln!("[logger-kit] Ignoring `{FORMAT_ENV}`: {e}"),
    }

    logger
}
