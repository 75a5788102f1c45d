use crate::request::CapturedRequest;
use crate::trace::{self, Traceback, TracedError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

/// Severity of a log event. String forms are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            Level::Error
        } else if level == tracing::Level::WARN {
            Level::Warn
        } else if level == tracing::Level::INFO {
            Level::Info
        } else if level == tracing::Level::DEBUG {
            Level::Debug
        } else {
            Level::Trace
        }
    }
}

/// Call-site descriptor attached to an event by the logging engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl Caller {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }
}

/// A single event field. The classifier dispatches on the variant:
/// plain values pass through to the context map, error values are
/// replaced by their `{msg, trace?}` extraction, and a request value
/// under the reserved `request` key selects the request schema.
///
/// A `Request` under any other key degrades to its `"METHOD path"`
/// display string in the context map.
#[derive(Debug)]
pub enum FieldValue {
    Value(serde_json::Value),
    Error(Box<dyn Traceback + Send + Sync>),
    Request(CapturedRequest),
}

impl FieldValue {
    /// Wrap a plain error. No call stack is recorded; formatting will
    /// produce a `{msg}` object without a `trace` key.
    pub fn error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        FieldValue::Error(trace::untraced(err))
    }

    /// Wrap an error that carries the [`Traceback`] capability, keeping
    /// its captured call stack.
    pub fn traced<E>(err: E) -> Self
    where
        E: Traceback + Send + Sync + 'static,
    {
        FieldValue::Error(Box::new(err))
    }

    /// Error field reconstructed from a display message alone, for call
    /// sites that only hold a borrowed error.
    pub fn error_message(message: impl Into<String>) -> Self {
        FieldValue::Error(Box::new(trace::MessageError(message.into())))
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Value(serde_json::Value::String(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Value(serde_json::Value::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Value(serde_json::Value::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Value(serde_json::Value::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Value(serde_json::Value::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Value(serde_json::Value::from(value))
    }
}

impl From<CapturedRequest> for FieldValue {
    fn from(request: CapturedRequest) -> Self {
        FieldValue::Request(request)
    }
}

impl From<TracedError> for FieldValue {
    fn from(err: TracedError) -> Self {
        FieldValue::traced(err)
    }
}

/// One log event, as handed to the formatter by the logging engine.
/// The formatter never constructs these itself outside the tracing
/// layer adapter.
#[derive(Debug)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub caller: Option<Caller>,
}

impl LogEvent {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            fields: BTreeMap::new(),
            caller: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
