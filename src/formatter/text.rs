use std::fmt::{self, Write as _};

use serde_json::Value;

use super::{prefix_field_clashes, FieldKey, FieldMap, Record};

/// Formats records as `key=value` pairs separated by spaces.
///
/// The time, level and message come first, followed by the entry fields sorted by key:
///
/// ```text
/// time="2024-01-01T00:00:00.000000Z" level=warning msg="could not parse" desired=dbug
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFormatter {
    field_map: FieldMap,
    disable_timestamp: bool,
    disable_quote: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_map(self, field_map: FieldMap) -> Self {
        Self { field_map, ..self }
    }

    /// Do not emit timestamps.
    pub fn without_time(self) -> Self {
        Self {
            disable_timestamp: true,
            ..self
        }
    }

    /// Never quote values, even if they contain spaces or other special characters.
    pub fn disable_quote(self, disable_quote: bool) -> Self {
        Self {
            disable_quote,
            ..self
        }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    pub(crate) fn format(&self, record: &Record<'_>, buf: &mut String) -> fmt::Result {
        let fields = prefix_field_clashes(record.fields, &self.field_map);
        let mut first = true;

        if !self.disable_timestamp && !record.time.is_empty() {
            self.write_pair(buf, &mut first, self.field_map.resolve(FieldKey::Time), record.time)?;
        }
        self.write_pair(
            buf,
            &mut first,
            self.field_map.resolve(FieldKey::Level),
            record.level.as_str(),
        )?;
        if !record.message.is_empty() {
            self.write_pair(
                buf,
                &mut first,
                self.field_map.resolve(FieldKey::Message),
                record.message,
            )?;
        }

        for (key, value) in fields.iter() {
            match value {
                Value::String(value) => self.write_pair(buf, &mut first, key, value)?,
                value => self.write_pair(buf, &mut first, key, &value.to_string())?,
            }
        }

        buf.push('\n');
        Ok(())
    }

    fn write_pair(&self, buf: &mut String, first: &mut bool, key: &str, value: &str) -> fmt::Result {
        if !*first {
            buf.push(' ');
        }
        *first = false;

        buf.push_str(key);
        buf.push('=');
        if self.needs_quoting(value) {
            write!(buf, "{value:?}")
        } else {
            buf.push_str(value);
            Ok(())
        }
    }

    fn needs_quoting(&self, value: &str) -> bool {
        if self.disable_quote {
            return false;
        }
        !value.chars().all(|ch| {
            ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '/' | '@' | '^' | '+')
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::TextFormatter;
    use crate::{
        formatter::{FieldKey, FieldMap, Fields, Record},
        level::Level,
    };

    fn format(formatter: &TextFormatter, message: &str, fields: &Fields) -> String {
        let record = Record {
            time: "fake time",
            level: Level::Warn,
            message,
            fields,
        };
        let mut buf = String::new();
        formatter.format(&record, &mut buf).unwrap();
        buf
    }

    #[test]
    fn metadata_first_then_sorted_fields() {
        let mut fields = Fields::new();
        fields.insert("previous".to_owned(), json!("fatal"));
        fields.insert("desired".to_owned(), json!("dbug"));
        fields.insert("answer".to_owned(), json!(42));

        assert_eq!(
            format(&TextFormatter::new(), "could not change level", &fields),
            "time=\"fake time\" level=warning msg=\"could not change level\" answer=42 \
             desired=dbug previous=fatal\n",
        );
    }

    #[test]
    fn quoting() {
        let mut fields = Fields::new();
        fields.insert("path".to_owned(), json!("/var/log@host^1+2"));
        fields.insert("quoted".to_owned(), json!("has \"quotes\""));
        fields.insert("empty".to_owned(), json!(""));

        let formatter = TextFormatter::new().without_time();
        assert_eq!(
            format(&formatter, "hello", &fields),
            "level=warning msg=hello empty= path=/var/log@host^1+2 quoted=\"has \\\"quotes\\\"\"\n",
        );

        let formatter = formatter.disable_quote(true);
        assert_eq!(
            format(&formatter, "hello world", &Fields::new()),
            "level=warning msg=hello world\n",
        );
    }

    #[test]
    fn renamed_and_clashing_keys() {
        let mut fields = Fields::new();
        fields.insert("severity".to_owned(), json!("user data"));

        let formatter = TextFormatter::new()
            .without_time()
            .with_field_map(FieldMap::new().with(FieldKey::Level, "severity"));
        assert_eq!(
            format(&formatter, "hello", &fields),
            "severity=warning msg=hello fields.severity=\"user data\"\n",
        );
    }
}
