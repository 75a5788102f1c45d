use crate::event::{Caller, FieldValue, Level, LogEvent};
use crate::format::LogsFormatter;
use crate::sink::LogSink;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that formats every event into a JSON line
/// and forwards it to an asynchronous [`LogSink`] via a bounded channel
/// and background task.
///
/// Formatting happens on the application thread (it is allocation-light
/// thanks to the formatter's pools); sink I/O is fully decoupled to
/// minimize impact on request latency. When the channel is full the
/// line is dropped and counted rather than blocking the caller.
pub struct SchemaLogLayer {
    formatter: Arc<LogsFormatter>,
    sender: mpsc::Sender<Bytes>,
    /// Total events seen by the layer.
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into the channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
    /// Events whose JSON encoding failed.
    pub encode_failures: Arc<AtomicU64>,
}

impl SchemaLogLayer {
    /// Create a new layer and spawn a background task that pulls
    /// encoded lines from a bounded channel and sends them to the
    /// provided [`LogSink`].
    ///
    /// A minimal threshold is enforced for `channel_buffer` to avoid
    /// degenerate configurations. The task exits, after a final sink
    /// flush, once the layer is dropped and the channel drains.
    pub fn new(
        formatter: Arc<LogsFormatter>,
        sink: Arc<dyn LogSink>,
        channel_buffer: usize,
    ) -> (Self, JoinHandle<()>) {
        let channel_buffer = channel_buffer.max(16);
        let (tx, mut rx) = mpsc::channel::<Bytes>(channel_buffer);

        let handle = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = sink.send(line).await {
                    eprintln!("log sink send failed: {}", e);
                }
            }
            if let Err(e) = sink.flush().await {
                eprintln!("log sink flush failed: {}", e);
            }
        });

        (
            Self {
                formatter,
                sender: tx,
                total_events: Arc::new(AtomicU64::new(0)),
                enqueued_events: Arc::new(AtomicU64::new(0)),
                dropped_events: Arc::new(AtomicU64::new(0)),
                encode_failures: Arc::new(AtomicU64::new(0)),
            },
            handle,
        )
    }
}

impl<S> Layer<S> for SchemaLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let meta = event.metadata();
        let mut log_event = LogEvent::new(
            Level::from(*meta.level()),
            message.unwrap_or_default(),
        );
        log_event.fields = fields;
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            let function = meta.module_path().unwrap_or_else(|| meta.target());
            log_event = log_event.with_caller(Caller::new(file, line, function));
        }

        match self.formatter.format(&log_event) {
            Ok(line) => {
                if self.sender.try_send(line).is_ok() {
                    self.enqueued_events.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.dropped_events.fetch_add(1, Ordering::Relaxed);
                    eprintln!("log channel full, dropping log record");
                }
            }
            Err(e) => {
                self.encode_failures.fetch_add(1, Ordering::Relaxed);
                eprintln!("failed to encode log record: {}", e);
            }
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, FieldValue>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), FieldValue::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields
            .insert(field.name().to_string(), FieldValue::error_message(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            *self.message = Some(rendered);
        } else {
            self.fields.insert(field.name().to_string(), FieldValue::from(rendered));
        }
    }
}
