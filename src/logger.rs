use std::{
    cell::RefCell,
    fmt,
    io,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
        PoisonError,
        RwLock,
    },
};

use serde::Serialize;
use tracing::Metadata;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime, writer::BoxMakeWriter, MakeWriter};

use crate::{
    builder::LoggerBuilder,
    entry::Entry,
    formatter::{Fields, Formatter, Record},
    level::Level,
};

/// Configuration side of a logger: which formatter renders records and which level gates them.
///
/// Setters take `&self` because loggers are shared handles; implementations synchronize
/// internally.
pub trait ConfigurableLogger {
    /// Replaces the current formatter.
    fn set_formatter(&self, formatter: Formatter);

    fn set_level(&self, level: Level);

    fn level(&self) -> Level;
}

/// Something structured fields can be attached to and records emitted from.
///
/// Attaching fields never changes `self`, it derives a new [`Self::Entry`] instead.
pub trait FieldLogger {
    type Entry: FieldLogger<Entry = Self::Entry>;

    fn with_field<V: Serialize>(&self, key: impl Into<String>, value: V) -> Self::Entry;

    fn with_fields<I, K, V>(&self, fields: I) -> Self::Entry
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize;

    /// Attaches the `Display` form of `error` under the `error` key.
    fn with_error(&self, error: &dyn std::error::Error) -> Self::Entry;

    fn log(&self, level: Level, message: &str);

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// A shared handle to a structured logger.
///
/// Cloning a `Logger` is cheap and every clone observes the same level and formatter. Records
/// at a level below the configured one are discarded.
///
/// A `Logger` is also a [`Layer`](tracing_subscriber::Layer), so events emitted with the
/// `tracing` macros are filtered and rendered the same way as records logged through
/// [`FieldLogger`].
///
/// # Examples
///
/// ```rust
/// use logger_kit::{FieldLogger, Level, Logger};
///
/// let logger = Logger::builder()
///     .with_writer(std::io::sink)
///     .with_level(Level::Debug)
///     .build();
///
/// logger
///     .with_field("request", 7)
///     .debug("handling request");
/// ```
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
}

struct Shared {
    level: AtomicU8,
    formatter: RwLock<Formatter>,
    make_writer: BoxMakeWriter,
    timer: Box<dyn FormatTime + Send + Sync>,
    log_internal_errors: bool,
}

impl Default for Logger {
    fn default() -> Self {
        LoggerBuilder::default().build()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("formatter", &self.formatter())
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Returns a new [`LoggerBuilder`] with the default configuration: writing text to stderr
    /// at the `info` level.
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    pub(crate) fn new<W, T>(
        make_writer: W,
        timer: T,
        level: Level,
        formatter: Formatter,
        log_internal_errors: bool,
    ) -> Self
    where
        W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
        T: FormatTime + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                level: AtomicU8::new(level as u8),
                formatter: RwLock::new(formatter),
                make_writer: BoxMakeWriter::new(make_writer),
                timer: Box::new(timer),
                log_internal_errors,
            }),
        }
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.shared.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.shared.level.store(level as u8, Ordering::Relaxed);
    }

    /// Returns whether a record at `level` would be emitted.
    pub fn is_level_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Returns a copy of the current formatter.
    pub fn formatter(&self) -> Formatter {
        self.shared
            .formatter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_formatter(&self, formatter: impl Into<Formatter>) {
        *self
            .shared
            .formatter
            .write()
            .unwrap_or_else(PoisonError::into_inner) = formatter.into();
    }

    pub fn with_field<V: Serialize>(&self, key: impl Into<String>, value: V) -> Entry {
        Entry::new(self.clone()).with_field(key, value)
    }

    pub fn with_fields<I, K, V>(&self, fields: I) -> Entry
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        Entry::new(self.clone()).with_fields(fields)
    }

    pub fn with_error(&self, error: &dyn std::error::Error) -> Entry {
        Entry::new(self.clone()).with_error(error)
    }

    /// Emits a record without any fields.
    pub fn log(&self, level: Level, message: &str) {
        self.write_record(level, message, &Fields::new(), None);
    }

    pub(crate) fn log_internal_errors(&self) -> bool {
        self.shared.log_internal_errors
    }

    /// Formats a record with the current formatter and writes it, unless `level` is disabled.
    ///
    /// `metadata` is forwarded to [`MakeWriter::make_writer_for`] when the record originates
    /// from a `tracing` event.
    pub(crate) fn write_record(
        &self,
        level: Level,
        message: &str,
        fields: &Fields,
        metadata: Option<&Metadata<'_>>,
    ) {
        if !self.is_level_enabled(level) {
            return;
        }

        thread_local! {
            static BUF: RefCell<String> = const { RefCell::new(String::new()) };
        }

        BUF.with(|buf| {
            let borrow = buf.try_borrow_mut();
            let mut a;
            let mut b;
            let buf = if let Ok(buf) = borrow {
                a = buf;
                &mut *a
            } else {
                b = String::new();
                &mut b
            };

            if self.format_record(level, message, fields, buf).is_ok() {
                let mut writer = match metadata {
                    Some(metadata) => self.shared.make_writer.make_writer_for(metadata),
                    None => self.shared.make_writer.make_writer(),
                };
                let res = io::Write::write_all(&mut writer, buf.as_bytes());
                if self.log_internal_errors() {
                    if let Err(e) = res {
                        eprintln!("[logger-kit] Unable to write a record to the writer! Error: {e}");
                    }
                }
            } else if self.log_internal_errors() {
                eprintln!(
                    "[logger-kit] Unable to format the following record. Message: {message:?}; \
                     Fields: {fields:?}",
                );
            }

            buf.clear();
        });
    }

    fn format_record(
        &self,
        level: Level,
        message: &str,
        fields: &Fields,
        buf: &mut String,
    ) -> fmt::Result {
        let mut time = String::with_capacity(32);
        self.shared.timer.format_time(&mut Writer::new(&mut time))?;

        let record = Record {
            time: &time,
            level,
            message,
            fields,
        };

        self.shared
            .formatter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .format(&record, buf)
    }
}

impl ConfigurableLogger for Logger {
    fn set_formatter(&self, formatter: Formatter) {
        Logger::set_formatter(self, formatter);
    }

    fn set_level(&self, level: Level) {
        Logger::set_level(self, level);
    }

    fn level(&self) -> Level {
        Logger::level(self)
    }
}

impl FieldLogger for Logger {
    type Entry = Entry;

    fn with_field<V: Serialize>(&self, key: impl Into<String>, value: V) -> Entry {
        Logger::with_field(self, key, value)
    }

    fn with_fields<I, K, V>(&self, fields: I) -> Entry
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        Logger::with_fields(self, fields)
    }

    fn with_error(&self, error: &dyn std::error::Error) -> Entry {
        Logger::with_error(self, error)
    }

    fn log(&self, level: Level, message: &str) {
        Logger::log(self, level, message);
    }
}
