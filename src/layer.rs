use crate::shipper::LogShipper;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Field name read as the trace identifier of an event.
pub const TRACE_ID_FIELD: &str = "trace_id";

// Events from these targets would be produced while shipping and must not
// be shipped themselves.
const IGNORED_TARGETS: &[&str] = &["log_shipper", "reqwest", "hyper", "h2", "rustls"];

/// `tracing_subscriber` layer that forwards events into a [`LogShipper`].
///
/// Events at or above `min_level` become log lines: the level name is the
/// level, a `trace_id` field becomes the trace identifier and the message
/// followed by the remaining `key=value` fields becomes the content.
pub struct ShipperLayer {
    shipper: Arc<LogShipper>,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Events forwarded into the shipper.
    pub forwarded_events: Arc<AtomicU64>,
}

impl ShipperLayer {
    pub fn new(shipper: Arc<LogShipper>, min_level: Level) -> Self {
        Self {
            shipper,
            min_level,
            total_events: Arc::new(AtomicU64::new(0)),
            forwarded_events: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn shipper(&self) -> &Arc<LogShipper> {
        &self.shipper
    }
}

impl<S> Layer<S> for ShipperLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if *meta.level() > self.min_level {
            return;
        }
        let target = meta.target();
        if IGNORED_TARGETS.iter().any(|t| target.starts_with(t)) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        self.shipper.log(
            meta.level().as_str(),
            visitor.trace_id.as_deref(),
            &visitor.content(),
        );
        self.forwarded_events.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct EventVisitor {
    pub message: Option<String>,
    pub trace_id: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl EventVisitor {
    /// Message followed by ` key=value` for every other field.
    pub fn content(&self) -> String {
        let mut out = self.message.clone().unwrap_or_default();
        for (key, value) in &self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{key}={value}");
        }
        out
    }

    fn put(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            TRACE_ID_FIELD => self.trace_id = Some(value),
            name => self.fields.push((name.to_string(), value)),
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }
}
