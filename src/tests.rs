use std::{
    fmt,
    io,
    sync::{Arc, Mutex, MutexGuard, TryLockError},
};

use tracing_subscriber::fmt::{format::Writer, time::FormatTime, MakeWriter};

use crate::{formatter::JsonFormatter, logger::Logger};

pub(crate) struct MockWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MockWriter {
    pub(crate) fn new(buf: Arc<Mutex<Vec<u8>>>) -> Self {
        Self { buf }
    }

    #[allow(clippy::needless_pass_by_value)]
    pub(crate) fn map_error<Guard>(err: TryLockError<Guard>) -> io::Error {
        match err {
            TryLockError::WouldBlock => io::Error::from(io::ErrorKind::WouldBlock),
            TryLockError::Poisoned(_) => io::Error::from(io::ErrorKind::Other),
        }
    }

    pub(crate) fn buf(&self) -> io::Result<MutexGuard<'_, Vec<u8>>> {
        self.buf.try_lock().map_err(Self::map_error)
    }
}

impl io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buf()?.flush()
    }
}

/// Collects everything written by a logger in memory.
#[derive(Clone, Default)]
pub(crate) struct MockMakeWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MockMakeWriter {
    pub(crate) fn buf(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap()
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.buf().to_vec()).unwrap()
    }

    /// Parses every written line as a JSON object.
    pub(crate) fn json_lines(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .map(|line| match serde_json::from_str(line) {
                Ok(value) => value,
                Err(e) => panic!(
                    "assertion failed: JSON shouldn't be malformed\n  error: {e}\n  json: {line}"
                ),
            })
            .collect()
    }
}

impl<'a> MakeWriter<'a> for MockMakeWriter {
    type Writer = MockWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MockWriter::new(self.buf.clone())
    }
}

pub(crate) struct MockTime;
impl FormatTime for MockTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "fake time")
    }
}

/// A JSON logger at the `info` level writing into memory with a fixed timestamp.
pub(crate) fn test_logger() -> (Logger, MockMakeWriter) {
    let writer = MockMakeWriter::default();
    let logger = Logger::builder()
        .with_writer(writer.clone())
        .with_timer(MockTime)
        .with_formatter(JsonFormatter::new())
        .build();
    (logger, writer)
}
