use std::fmt;

use tracing_core::field;

use crate::formatter::Fields;

/// [Visitor] collecting `tracing` span and event fields as JSON values.
///
/// [visitor]: tracing_subscriber::field::Visit
pub(crate) struct FieldVisitor<'a>(&'a mut Fields);

impl<'a> FieldVisitor<'a> {
    pub fn new(fields: &'a mut Fields) -> Self {
        Self(fields)
    }

    fn insert(&mut self, field: &field::Field, value: serde_json::Value) {
        match field.name() {
            // Skip fields that are actually log metadata that have already been handled
            #[cfg(feature = "tracing-log")]
            name if name.starts_with("log.") => (),
            name if name.starts_with("r#") => {
                self.0.insert(name[2..].to_owned(), value);
            },
            name => {
                self.0.insert(name.to_owned(), value);
            },
        }
    }
}

impl field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &field::Field, value: f64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_i64(&mut self, field: &field::Field, value: i64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &field::Field, value: u64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &field::Field, value: bool) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_str(&mut self, field: &field::Field, value: &str) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &field::Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, serde_json::Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &field::Field, value: &dyn fmt::Debug) {
        self.insert(field, serde_json::Value::from(format!("{value:?}")));
    }
}
