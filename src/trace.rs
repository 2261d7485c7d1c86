//! Attaching distributed-tracing identifiers to logging contexts.

use uuid::Uuid;

use crate::logger::FieldLogger;

pub const TRACE_ID_KEY: &str = "traceID";
pub const SPAN_ID_KEY: &str = "spanID";
pub const TRACE_UUID_KEY: &str = "traceUUID";

/// Returned by [`trace_uuid`] when a trace ID cannot be read as a UUID.
#[derive(Debug, thiserror::Error)]
pub enum TraceIdError {
    #[error("trace ID is {len} bytes long, a UUID needs exactly 16")]
    InvalidLength {
        len: usize,
        #[source]
        source: uuid::Error,
    },
}

/// Reads the raw bytes of `trace_id` as a UUID and returns its hyphenated, lowercase form.
///
/// Only the length is validated: any 16-byte string is accepted, even if it is not a UUID in
/// textual form.
///
/// # Examples
///
/// ```rust
/// let uuid = logger_kit::trace_uuid("0123456789abcdef").unwrap();
/// assert_eq!(uuid, "30313233-3435-3637-3839-616263646566");
///
/// assert!(logger_kit::trace_uuid("too short").is_err());
/// ```
pub fn trace_uuid(trace_id: &str) -> Result<String, TraceIdError> {
    let uuid =
        Uuid::from_slice(trace_id.as_bytes()).map_err(|source| TraceIdError::InvalidLength {
            len: trace_id.len(),
            source,
        })?;

    Ok(uuid.hyphenated().to_string())
}

/// Attaches trace information to the logger.
///
/// The returned context always carries [`TRACE_ID_KEY`] and [`SPAN_ID_KEY`]. If the trace ID
/// can be formatted by [`trace_uuid`], [`TRACE_UUID_KEY`] is attached as well; otherwise a
/// warning is logged on the context and it is returned with only the two IDs.
///
/// # Examples
///
/// ```rust
/// use logger_kit::{enrich_with_trace, Logger};
///
/// let logger = Logger::builder().with_writer(std::io::sink).build();
/// let entry = enrich_with_trace(&logger, "0123456789abcdef", "span-1");
///
/// assert_eq!(entry.fields().len(), 3);
/// assert_eq!(entry.fields()["traceUUID"], "30313233-3435-3637-3839-616263646566");
/// ```
pub fn enrich_with_trace<L: FieldLogger>(logger: &L, trace_id: &str, span_id: &str) -> L::Entry {
    let entry = logger
        .with_field(TRACE_ID_KEY, trace_id)
        .with_field(SPAN_ID_KEY, span_id);

    match trace_uuid(trace_id) {
        Ok(uuid) => entry.with_field(TRACE_UUID_KEY, uuid),
        Err(error) => {
            entry
                .with_error(&error)
                .warn("could not format trace ID to UUID");
            entry
        },
    }
}

/// Creates a `trace` span carrying the trace information, the `tracing` counterpart of
/// [`enrich_with_trace`].
///
/// Events inside the span carry [`TRACE_ID_KEY`], [`SPAN_ID_KEY`] and, when the trace ID can be
/// formatted by [`trace_uuid`], [`TRACE_UUID_KEY`]. Otherwise a warning event is emitted inside
/// the span.
pub fn trace_span(trace_id: &str, span_id: &str) -> tracing::Span {
    let span = tracing::info_span!(
        "trace",
        traceID = trace_id,
        spanID = span_id,
        traceUUID = tracing::field::Empty
    );

    match trace_uuid(trace_id) {
        Ok(uuid) => {
            span.record(TRACE_UUID_KEY, uuid.as_str());
        },
        Err(error) => {
            span.in_scope(|| tracing::warn!(error = %error, "could not format trace ID to UUID"));
        },
    }

    span
}
