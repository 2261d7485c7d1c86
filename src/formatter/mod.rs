//! Formatters turn a single [`Record`] into one line of output.

use std::{borrow::Cow, collections::BTreeMap, fmt};

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::level::Level;

/// Structured fields attached to an [`Entry`](crate::Entry), sorted by key.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Everything a [`Formatter`] needs to render a single log line.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// Already formatted timestamp. Empty if the logger does not emit timestamps.
    pub time: &'a str,
    pub level: Level,
    pub message: &'a str,
    pub fields: &'a Fields,
}

/// The metadata keys every record carries besides its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Time,
    Message,
    Level,
}

impl FieldKey {
    fn default_name(self) -> &'static str {
        match self {
            FieldKey::Time => "time",
            FieldKey::Message => "msg",
            FieldKey::Level => "level",
        }
    }
}

/// Renames the metadata keys of a record in the formatted output.
///
/// Keys without an explicit rename fall back to `time`, `msg` and `level`.
///
/// # Examples
///
/// ```rust
/// use logger_kit::{FieldKey, FieldMap};
///
/// let map = FieldMap::new().with(FieldKey::Time, "@timestamp");
/// assert_eq!(map.resolve(FieldKey::Time), "@timestamp");
/// assert_eq!(map.resolve(FieldKey::Message), "msg");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    renames: BTreeMap<FieldKey, Cow<'static, str>>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outputs `key` under `name` instead of its default name.
    pub fn with(mut self, key: FieldKey, name: impl Into<Cow<'static, str>>) -> Self {
        self.renames.insert(key, name.into());
        self
    }

    /// Returns the name `key` is written under.
    pub fn resolve(&self, key: FieldKey) -> &str {
        match self.renames.get(&key) {
            Some(name) => name,
            None => key.default_name(),
        }
    }
}

/// Renders records as text lines.
///
/// A logger holds exactly one formatter at a time; installing a new one replaces the old one.
#[derive(Debug, Clone, PartialEq)]
pub enum Formatter {
    Text(TextFormatter),
    Json(JsonFormatter),
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Text(TextFormatter::default())
    }
}

impl From<TextFormatter> for Formatter {
    fn from(formatter: TextFormatter) -> Self {
        Formatter::Text(formatter)
    }
}

impl From<JsonFormatter> for Formatter {
    fn from(formatter: JsonFormatter) -> Self {
        Formatter::Json(formatter)
    }
}

impl Formatter {
    /// Appends the formatted `record`, terminated by a newline, to `buf`.
    pub fn format(&self, record: &Record<'_>, buf: &mut String) -> fmt::Result {
        match self {
            Formatter::Text(text) => text.format(record, buf),
            Formatter::Json(json) => json.format(record, buf),
        }
    }

    pub fn as_json(&self) -> Option<&JsonFormatter> {
        match self {
            Formatter::Json(json) => Some(json),
            Formatter::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextFormatter> {
        match self {
            Formatter::Text(text) => Some(text),
            Formatter::Json(_) => None,
        }
    }
}

/// Moves fields whose key collides with a metadata key to `fields.<key>`, so that user data
/// never overwrites the time, message or level of a record.
fn prefix_field_clashes<'a>(fields: &'a Fields, field_map: &FieldMap) -> Cow<'a, Fields> {
    let mut fields = Cow::Borrowed(fields);
    for key in [FieldKey::Time, FieldKey::Message, FieldKey::Level] {
        let name = field_map.resolve(key);
        if fields.contains_key(name) {
            let owned = fields.to_mut();
            if let Some(value) = owned.remove(name) {
                owned.insert(format!("fields.{name}"), value);
            }
        }
    }
    fields
}
