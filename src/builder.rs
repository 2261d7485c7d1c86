use std::io;

use tracing_subscriber::fmt::{
    time::{FormatTime, SystemTime},
    MakeWriter,
    TestWriter,
};

use crate::{formatter::Formatter, level::Level, logger::Logger};

/// Configures and builds a [`Logger`].
///
/// By default the logger writes text records to stderr with [`SystemTime`] timestamps and
/// emits records at the `info` level and above.
pub struct LoggerBuilder<W = fn() -> io::Stderr, T = SystemTime> {
    make_writer: W,
    timer: T,
    level: Level,
    formatter: Formatter,
    log_internal_errors: bool,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            make_writer: io::stderr,
            timer: SystemTime,
            level: Level::Info,
            formatter: Formatter::default(),
            log_internal_errors: false,
        }
    }
}

impl<W, T> LoggerBuilder<W, T>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
    T: FormatTime + Send + Sync + 'static,
{
    pub fn build(self) -> Logger {
        Logger::new(
            self.make_writer,
            self.timer,
            self.level,
            self.formatter,
            self.log_internal_errors,
        )
    }
}

impl<W, T> LoggerBuilder<W, T> {
    /// Sets the [`MakeWriter`] that the [`Logger`] being built will use to write records.
    ///
    /// # Examples
    ///
    /// Using `stdout` rather than `stderr`:
    ///
    /// ```rust
    /// let logger = logger_kit::Logger::builder()
    ///     .with_writer(std::io::stdout)
    ///     .build();
    /// # drop(logger);
    /// ```
    pub fn with_writer<W2>(self, make_writer: W2) -> LoggerBuilder<W2, T>
    where
        W2: for<'writer> MakeWriter<'writer> + 'static,
    {
        LoggerBuilder {
            make_writer,
            timer: self.timer,
            level: self.level,
            formatter: self.formatter,
            log_internal_errors: self.log_internal_errors,
        }
    }

    /// Borrows the [writer] for this logger.
    ///
    /// [writer]: MakeWriter
    pub fn writer(&self) -> &W {
        &self.make_writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.make_writer
    }

    /// Configures the logger to support [`libtest`'s output capturing][capturing] when used in
    /// unit tests.
    ///
    /// See [`TestWriter`] for additional details.
    ///
    /// [capturing]:
    /// https://doc.rust-lang.org/book/ch11-02-running-tests.html#showing-function-output
    pub fn with_test_writer(self) -> LoggerBuilder<TestWriter, T> {
        self.with_writer(TestWriter::default())
    }

    /// Updates the [`MakeWriter`] by applying a function to the existing [`MakeWriter`].
    ///
    /// # Examples
    ///
    /// Redirect records to stdout if level is <= INFO:
    ///
    /// ```rust
    /// use tracing_subscriber::fmt::writer::MakeWriterExt;
    ///
    /// let stdout = std::io::stdout.with_max_level(tracing::Level::INFO);
    /// let logger = logger_kit::Logger::builder()
    ///     .map_writer(move |w| stdout.or_else(w))
    ///     .build();
    /// # drop(logger);
    /// ```
    pub fn map_writer<W2>(self, f: impl FnOnce(W) -> W2) -> LoggerBuilder<W2, T>
    where
        W2: for<'writer> MakeWriter<'writer> + 'static,
    {
        LoggerBuilder {
            make_writer: f(self.make_writer),
            timer: self.timer,
            level: self.level,
            formatter: self.formatter,
            log_internal_errors: self.log_internal_errors,
        }
    }

    /// Use the given [`timer`] for record timestamps.
    ///
    /// See the [`time` module] for the provided timer implementations.
    ///
    /// [`timer`]: tracing_subscriber::fmt::time::FormatTime
    /// [`time` module]: mod@tracing_subscriber::fmt::time
    pub fn with_timer<T2>(self, timer: T2) -> LoggerBuilder<W, T2> {
        LoggerBuilder {
            make_writer: self.make_writer,
            timer,
            level: self.level,
            formatter: self.formatter,
            log_internal_errors: self.log_internal_errors,
        }
    }

    /// Do not emit timestamps with records.
    pub fn without_time(self) -> LoggerBuilder<W, ()> {
        self.with_timer(())
    }

    pub fn with_level(self, level: Level) -> Self {
        Self { level, ..self }
    }

    pub fn with_formatter(self, formatter: impl Into<Formatter>) -> Self {
        Self {
            formatter: formatter.into(),
            ..self
        }
    }

    /// Sets whether failures to format or write a record are reported on stderr.
    /// Defaults to false.
    pub fn log_internal_errors(self, log_internal_errors: bool) -> Self {
        Self {
            log_internal_errors,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::{
        formatter::{JsonFormatter, TextFormatter},
        level::Level,
        logger::{FieldLogger, Logger},
        tests::{MockMakeWriter, MockTime},
    };

    #[test]
    fn builder_settings_are_applied() {
        let writer = MockMakeWriter::default();
        let logger = Logger::builder()
            .with_writer(writer.clone())
            .with_timer(MockTime)
            .with_level(Level::Error)
            .with_formatter(JsonFormatter::new())
            .log_internal_errors(true)
            .build();

        assert_eq!(logger.level(), Level::Error);
        assert!(logger.log_internal_errors());

        logger.error("boom");
        assert_eq!(writer.json_lines()[0]["msg"], "boom");
    }

    #[test]
    fn without_time_omits_the_timestamp() {
        let writer = MockMakeWriter::default();
        let logger = Logger::builder()
            .with_writer(writer.clone())
            .without_time()
            .with_formatter(TextFormatter::new())
            .build();

        logger.info("no time");
        assert_eq!(writer.contents(), "level=info msg=\"no time\"\n");
    }

    #[test]
    fn writer_can_be_replaced_before_building() {
        let writer = MockMakeWriter::default();
        let mut builder = Logger::builder()
            .with_writer(io::sink)
            .map_writer(|_| writer.clone());
        let _: &mut MockMakeWriter = builder.writer_mut();

        let logger = builder.without_time().build();
        logger.info("redirected");
        assert!(writer.contents().contains("redirected"));
    }
}
