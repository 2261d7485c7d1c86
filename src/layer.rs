use serde_json::Value;
use tracing_core::{
    span::{Attributes, Id, Record},
    subscriber::Interest,
    Event,
    Metadata,
    Subscriber,
};
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

use crate::{
    fields::SpanFields,
    formatter::Fields,
    level::Level,
    logger::Logger,
    visitor::FieldVisitor,
};

impl<S> Layer<S> for Logger
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // The level can change at any time so `enabled` must be asked on every event.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        // Spans are always kept so their fields are available to events inside them.
        !metadata.is_event() || self.is_level_enabled(Level::from(*metadata.level()))
    }

    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            if self.log_internal_errors() {
                eprintln!("[logger-kit] Span not found, this is a bug.");
            }
            return;
        };

        let mut extensions = span.extensions_mut();

        if extensions.get_mut::<SpanFields>().is_none() {
            let mut fields = SpanFields::default();
            attrs.record(&mut FieldVisitor::new(&mut fields.fields));
            extensions.insert(fields);
        } else if self.log_internal_errors() {
            eprintln!("[logger-kit] Span fields were already recorded, ignoring: {attrs:?}");
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            if self.log_internal_errors() {
                eprintln!("[logger-kit] Span not found, this is a bug.");
            }
            return;
        };

        let mut extensions = span.extensions_mut();
        let Some(fields) = extensions.get_mut::<SpanFields>() else {
            if self.log_internal_errors() {
                eprintln!(
                    "[logger-kit] Span was created but does not contain recorded fields, this \
                     is a bug and some fields may have been lost."
                );
            }
            return;
        };

        values.record(&mut FieldVisitor::new(&mut fields.fields));
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        let level = Level::from(*meta.level());
        if !self.is_level_enabled(level) {
            return;
        }

        let mut event_fields = Fields::new();
        event.record(&mut FieldVisitor::new(&mut event_fields));

        // Only the event's own `message` is the record message, a span field of that name is
        // kept as data.
        let message = match event_fields.remove("message") {
            Some(Value::String(message)) => message,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let mut fields = Fields::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(span_fields) = extensions.get::<SpanFields>() {
                    fields.extend(
                        span_fields
                            .fields
                            .iter()
                            .map(|(key, value)| (key.clone(), value.clone())),
                    );
                }
            }
        }
        fields.extend(event_fields);

        self.write_record(level, &message, &fields, Some(meta));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing::subscriber::with_default;
    use tracing_subscriber::{layer::SubscriberExt, registry};

    use crate::{
        configure::{configure_json_formatter, configure_level},
        level::Level,
        tests::test_logger,
    };

    #[test]
    fn events_use_the_logger_format() {
        let (logger, writer) = test_logger();
        let subscriber = registry().with(logger);

        with_default(subscriber, || {
            tracing::info!(answer = 42, "some json test");
        });

        assert_eq!(
            writer.json_lines(),
            vec![json!({
                "time": "fake time",
                "level": "info",
                "msg": "some json test",
                "answer": 42,
            })],
        );
    }

    #[test]
    fn span_fields_are_merged_into_events() {
        let (logger, writer) = test_logger();
        let subscriber = registry().with(logger);

        with_default(subscriber, || {
            let span = tracing::info_span!("outer", depth = 0, shadowed = "outer");
            let _guard = span.enter();
            let span = tracing::info_span!("inner", depth = 1, recorded = tracing::field::Empty);
            span.record("recorded", true);
            let _guard = span.enter();
            tracing::warn!(shadowed = "event", "in inner");
        });

        assert_eq!(
            writer.json_lines(),
            vec![json!({
                "time": "fake time",
                "level": "warning",
                "msg": "in inner",
                "depth": 1,
                "recorded": true,
                "shadowed": "event",
            })],
        );
    }

    #[test]
    fn span_message_field_is_not_the_event_message() {
        let (logger, writer) = test_logger();
        let subscriber = registry().with(logger);

        with_default(subscriber, || {
            let span = tracing::info_span!("s", message = "from span");
            let _guard = span.enter();
            tracing::info!(n = 1);
            tracing::info!("own message");
        });

        let lines = writer.json_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["msg"], "");
        assert_eq!(lines[0]["n"], 1);
        assert_eq!(lines[0]["message"], "from span");
        assert_eq!(lines[1]["msg"], "own message");
        assert_eq!(lines[1]["message"], "from span");
    }

    #[test]
    fn level_changes_apply_to_registered_callsites() {
        let (logger, writer) = test_logger();
        let subscriber = registry().with(logger.clone());

        with_default(subscriber, || {
            for _ in 0..2 {
                tracing::debug!("maybe");
                configure_level(&logger, "debug");
            }
            logger.set_level(Level::Error);
            tracing::warn!("dropped");
        });

        let lines = writer.json_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["msg"], "maybe");
    }

    #[test]
    fn formatter_changes_apply_to_events() {
        let (logger, writer) = test_logger();
        let subscriber = registry().with(logger.clone());

        with_default(subscriber, || {
            configure_json_formatter(&logger);
            tracing::error!(error = "boom", "failed");
        });

        assert_eq!(
            writer.json_lines(),
            vec![json!({
                "@timestamp": "fake time",
                "level_name": "error",
                "message": "failed",
                "error": "boom",
            })],
        );
    }

    #[test]
    fn raw_identifiers_are_unescaped() {
        let (logger, writer) = test_logger();
        let subscriber = registry().with(logger);

        with_default(subscriber, || {
            tracing::info!(r#type = "raw", "typed");
        });

        assert_eq!(writer.json_lines()[0]["type"], "raw");
    }
}
