//! Custom tracing layer for forwarding SDK log events to the host shell
//!
//! Mobile hosts route these events into their own logging (logcat, os_log)
//! by draining the receiving end of the channel. Any field whose name
//! mentions a token is masked before it leaves the layer.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use woot_core::config::redact;

/// Event data sent to the host
#[derive(Debug, Clone, serde::Serialize)]
pub struct SdkLogEvent {
    /// Event target (e.g., "woot_application::session::controller")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    /// Human-readable message
    pub message: String,
    /// Structured fields from the event
    pub fields: HashMap<String, Value>,
    /// Fields of the innermost enclosing span
    pub span: HashMap<String, Value>,
    /// Timestamp
    pub timestamp: String,
}

/// A tracing layer that sends SDK events to a channel
pub struct SdkLogLayer {
    sender: mpsc::UnboundedSender<SdkLogEvent>,
}

impl SdkLogLayer {
    /// Create a new layer with the given channel sender
    pub fn new(sender: mpsc::UnboundedSender<SdkLogEvent>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for SdkLogLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(fields);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        let mut visitor = FieldVisitor(&mut fields);
        event.record(&mut visitor);

        let span_fields = ctx
            .event_span(event)
            .and_then(|span| {
                let extensions = span.extensions();
                extensions.get::<HashMap<String, Value>>().cloned()
            })
            .unwrap_or_default();

        let message = fields
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let sdk_event = SdkLogEvent {
            target: event.metadata().target().to_string(),
            level: event.metadata().level().to_string(),
            message,
            fields,
            span: span_fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Non-blocking send - if the host dropped the receiver, we just skip
        let _ = self.sender.send(sdk_event);
    }
}

fn is_secret(field: &tracing::field::Field) -> bool {
    field.name().to_ascii_lowercase().contains("token")
}

/// Field visitor that extracts tracing event fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl<'a> tracing::field::Visit for FieldVisitor<'a> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        let value = if is_secret(field) {
            redact(value)
        } else {
            value.to_string()
        };
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        let rendered = if is_secret(field) {
            redact(&rendered)
        } else {
            rendered
        };
        self.0
            .insert(field.name().to_string(), serde_json::json!(rendered));
    }
}
