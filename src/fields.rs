use crate::formatter::Fields;

/// Span extension holding the fields recorded on a span so far.
#[derive(Debug, Default)]
pub(crate) struct SpanFields {
    pub(crate) fields: Fields,
}
