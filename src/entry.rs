use serde::Serialize;
use serde_json::Value;

use crate::{
    formatter::Fields,
    level::Level,
    logger::{FieldLogger, Logger},
};

/// Key under which [`Entry::with_error`] stores the error.
pub const ERROR_KEY: &str = "error";

/// A logging context: a [`Logger`] together with structured fields.
///
/// Every record emitted through an entry carries its fields. Adding fields returns a new entry
/// and leaves the original untouched, so an entry can be used as a base for several derived
/// contexts.
#[derive(Debug, Clone)]
pub struct Entry {
    logger: Logger,
    fields: Fields,
}

impl Entry {
    /// Creates an entry without any fields.
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            fields: Fields::new(),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Fields attached to this entry, sorted by key.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns a new entry with `key` set to `value`, replacing any previous value of `key`.
    ///
    /// Values that cannot be represented as JSON (for example maps with non-string keys) are
    /// replaced by a string describing the serialization failure.
    pub fn with_field<V: Serialize>(&self, key: impl Into<String>, value: V) -> Entry {
        self.with_fields([(key, value)])
    }

    pub fn with_fields<I, K, V>(&self, fields: I) -> Entry
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        let mut entry = self.clone();
        entry.fields.extend(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), to_value(value))),
        );
        entry
    }

    pub fn with_error(&self, error: &dyn std::error::Error) -> Entry {
        self.with_field(ERROR_KEY, error.to_string())
    }

    pub fn log(&self, level: Level, message: &str) {
        self.logger.write_record(level, message, &self.fields, None);
    }
}

fn to_value<V: Serialize>(value: V) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|error| Value::String(format!("failed to serialize field: {error}")))
}

impl FieldLogger for Entry {
    type Entry = Entry;

    fn with_field<V: Serialize>(&self, key: impl Into<String>, value: V) -> Entry {
        Entry::with_field(self, key, value)
    }

    fn with_fields<I, K, V>(&self, fields: I) -> Entry
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        Entry::with_fields(self, fields)
    }

    fn with_error(&self, error: &dyn std::error::Error) -> Entry {
        Entry::with_error(self, error)
    }

    fn log(&self, level: Level, message: &str) {
        Entry::log(self, level, message);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use crate::{logger::FieldLogger, tests::test_logger};

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct ConnectionError;

    #[test]
    fn deriving_does_not_touch_the_parent() {
        let (logger, _writer) = test_logger();
        let parent = logger.with_field("a", 1);
        let child = parent.with_field("b", 2);

        assert_eq!(parent.fields().len(), 1);
        assert_eq!(child.fields().len(), 2);
    }

    #[test]
    fn later_values_replace_earlier_ones() {
        let (logger, _writer) = test_logger();
        let entry = logger.with_field("a", 1).with_field("a", "two");

        assert_eq!(entry.fields().len(), 1);
        assert_eq!(entry.fields()["a"], json!("two"));
    }

    #[test]
    fn error_is_stored_as_text() {
        let (logger, writer) = test_logger();
        logger
            .with_fields([("previous", "info"), ("desired", "dbug")])
            .with_error(&ConnectionError)
            .warn("something failed");

        assert_eq!(
            writer.json_lines(),
            vec![json!({
                "time": "fake time",
                "level": "warning",
                "msg": "something failed",
                "previous": "info",
                "desired": "dbug",
                "error": "connection refused",
            })],
        );
    }

    #[test]
    fn unserializable_value_becomes_a_description() {
        let (logger, _writer) = test_logger();
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys are not JSON");

        let entry = logger.with_field("map", map);
        let value = entry.fields()["map"].as_str().unwrap();
        assert!(value.starts_with("failed to serialize field:"));
    }
}
