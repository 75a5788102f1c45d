use crate::classify::classify;
use crate::event::LogEvent;
use crate::pool::{BufferPool, RecordPool};
use crate::schema::Schema;
use crate::trace::DEFAULT_MAX_STACK_TRACE;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use thiserror::Error;

/// Timestamp layout used unless overridden, millisecond UTC.
pub const DEFAULT_TIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const DEFAULT_POOL_SIZE: usize = 64;
const DEFAULT_BUFFER_CAPACITY: usize = 4 * 1024;

/// Error surfaced by [`LogsFormatter::format`]. Everything else the
/// formatter encounters degrades into the record instead of failing.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("json encode {schema} log")]
    Encode {
        schema: Schema,
        #[source]
        source: serde_json::Error,
    },
}

/// Formats [`LogEvent`]s into newline-terminated JSON lines.
///
/// Every line is stamped with the service and environment given at
/// construction. Events carrying a request snapshot under the
/// `request` field come out under the `http.request.v1` schema with a
/// nested request object; all other events use `general.logs.v1`.
///
/// The formatter is safe to share across threads. Intermediate
/// records and encode buffers come from internal lock-free pools, so
/// steady-state formatting does not allocate for the record or the
/// output line.
pub struct LogsFormatter {
    service: String,
    environment: String,
    time_layout: String,
    max_stack_trace: usize,
    records: RecordPool,
    buffers: BufferPool,
}

impl LogsFormatter {
    pub fn new(service: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            environment: environment.into(),
            time_layout: DEFAULT_TIME_LAYOUT.to_string(),
            max_stack_trace: DEFAULT_MAX_STACK_TRACE,
            records: RecordPool::new(DEFAULT_POOL_SIZE),
            buffers: BufferPool::new(DEFAULT_POOL_SIZE, DEFAULT_BUFFER_CAPACITY),
        }
    }

    /// Replace the timestamp layout (chrono `strftime` syntax). A
    /// layout that fails to format leaves the `t` field empty.
    pub fn with_time_layout(mut self, layout: impl Into<String>) -> Self {
        self.time_layout = layout.into();
        self
    }

    /// Cap the number of frames kept from an error's stack trace.
    pub fn with_max_stack_trace(mut self, max: usize) -> Self {
        self.max_stack_trace = max;
        self
    }

    /// Resize the record and buffer pools. Sizing is fixed once the
    /// formatter is shared.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.records = RecordPool::new(pool_size);
        self.buffers = BufferPool::new(pool_size, DEFAULT_BUFFER_CAPACITY);
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Format one event into an owned line.
    ///
    /// **Parameters**
    /// - `event`: the event to encode. The event is only read; the
    ///   same event formats to the same bytes every time.
    ///
    /// **Returns**
    /// The encoded line including its trailing newline, or
    /// [`FormatError::Encode`] when JSON encoding itself fails.
    pub fn format(&self, event: &LogEvent) -> Result<Bytes, FormatError> {
        let mut buffer = self.buffers.get();
        let result = self.format_into(event, &mut buffer);
        let line = result.map(|()| Bytes::copy_from_slice(&buffer));
        self.buffers.put(buffer);
        line
    }

    /// Format one event, appending the line to `buffer`. Bytes already
    /// in the buffer are left in place; on error nothing is appended.
    pub fn format_into(&self, event: &LogEvent, buffer: &mut BytesMut) -> Result<(), FormatError> {
        let fields = classify(event, self.max_stack_trace);
        let mut record = self.records.acquire();

        record.schema = if fields.request.is_some() {
            Schema::HttpRequestV1
        } else {
            Schema::GeneralLogsV1
        };
        self.write_time(&event.timestamp, &mut record.time);
        record.level.push_str(event.level.as_str());
        record.service.push_str(&self.service);
        record.channel = fields.channel;
        record.environment.push_str(&self.environment);
        record.user = fields.user;
        record.message.push_str(&event.message);
        record.context = fields.context;
        record.request = fields
            .request
            .map(|request| request.enrich(fields.status, fields.duration));

        let start = buffer.len();
        match serde_json::to_writer((&mut *buffer).writer(), &*record) {
            Ok(()) => {
                buffer.put_u8(b'\n');
                self.records.release(record);
                Ok(())
            }
            Err(source) => {
                let schema = record.schema;
                buffer.truncate(start);
                self.records.release(record);
                Err(FormatError::Encode { schema, source })
            }
        }
    }

    fn write_time(&self, timestamp: &DateTime<Utc>, out: &mut String) {
        if write!(out, "{}", timestamp.format(&self.time_layout)).is_err() {
            out.clear();
        }
    }
}
