use std::fmt;

use serde_json::Value;

use super::{prefix_field_clashes, FieldKey, FieldMap, Fields, Record};
use crate::write_adaptor::WriteAdaptor;

/// Formats records as one JSON object per line.
///
/// Object keys are sorted. Entry fields are written next to the metadata keys unless a
/// [data key](Self::with_data_key) is configured.
///
/// # Examples
///
/// ```rust
/// use logger_kit::{FieldKey, FieldMap, JsonFormatter};
///
/// let formatter = JsonFormatter::new()
///     .with_field_map(FieldMap::new().with(FieldKey::Message, "message"))
///     .with_data_key("fields");
/// # let _ = formatter;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonFormatter {
    field_map: FieldMap,
    disable_timestamp: bool,
    data_key: Option<String>,
    pretty_print: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames the time, message and level keys.
    pub fn with_field_map(self, field_map: FieldMap) -> Self {
        Self { field_map, ..self }
    }

    /// Nests all entry fields in an object under `key`.
    pub fn with_data_key(self, key: impl Into<String>) -> Self {
        Self {
            data_key: Some(key.into()),
            ..self
        }
    }

    /// Do not emit timestamps.
    pub fn without_time(self) -> Self {
        Self {
            disable_timestamp: true,
            ..self
        }
    }

    /// Sets whether records are written as indented, multi-line JSON.
    pub fn pretty_print(self, pretty_print: bool) -> Self {
        Self {
            pretty_print,
            ..self
        }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    pub fn data_key(&self) -> Option<&str> {
        self.data_key.as_deref()
    }

    pub(crate) fn format(&self, record: &Record<'_>, buf: &mut String) -> fmt::Result {
        // Nesting happens before clash handling so a data key named like a metadata key is
        // renamed too.
        let nested;
        let data = match &self.data_key {
            Some(data_key) => {
                let inner = record
                    .fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                nested = Fields::from([(data_key.clone(), Value::Object(inner))]);
                &nested
            },
            None => record.fields,
        };

        let mut object: serde_json::Map<String, Value> =
            prefix_field_clashes(data, &self.field_map)
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

        if !self.disable_timestamp && !record.time.is_empty() {
            object.insert(
                self.field_map.resolve(FieldKey::Time).to_owned(),
                Value::from(record.time),
            );
        }
        object.insert(
            self.field_map.resolve(FieldKey::Message).to_owned(),
            Value::from(record.message),
        );
        object.insert(
            self.field_map.resolve(FieldKey::Level).to_owned(),
            Value::from(record.level.as_str()),
        );

        let writer = WriteAdaptor::new(buf);
        let res = if self.pretty_print {
            serde_json::to_writer_pretty(writer, &object)
        } else {
            serde_json::to_writer(writer, &object)
        };
        res.map_err(|_| fmt::Error)?;

        buf.push('\n');
        Ok(())
    }
}
