use crate::event::{FieldValue, LogEvent};
use crate::request::CapturedRequest;
use crate::schema::{
    CTX_KEY_FILE, CTX_KEY_FUNC, ERR_KEY_MSG, ERR_KEY_TRACE, FIELD_CHANNEL, FIELD_DURATION,
    FIELD_REQUEST, FIELD_STATUS, FIELD_USER,
};
use crate::trace::{self, Traceback};
use serde_json::Value;
use std::collections::BTreeMap;

/// Event fields routed to their wire positions. Reserved keys are
/// consumed here and never appear in `context`.
pub(crate) struct ClassifiedFields<'a> {
    pub channel: String,
    pub user: String,
    pub status: String,
    pub duration: String,
    pub context: BTreeMap<String, Value>,
    pub request: Option<&'a CapturedRequest>,
}

/// Split an event's fields into record slots and the context map.
///
/// Caller keys go in first so an explicit `file` or `func` field wins.
/// `channel` is honored only for string values, `request` only for
/// request snapshots; anything else under those keys is discarded.
/// `user`, `status` and `duration` take the display form of whatever
/// value they hold.
pub(crate) fn classify(event: &LogEvent, max_stack_trace: usize) -> ClassifiedFields<'_> {
    let mut fields = ClassifiedFields {
        channel: String::new(),
        user: String::new(),
        status: String::new(),
        duration: String::new(),
        context: BTreeMap::new(),
        request: None,
    };

    if let Some(caller) = &event.caller {
        fields.context.insert(
            CTX_KEY_FILE.to_string(),
            Value::String(format!("{}:{}", caller.file, caller.line)),
        );
        fields
            .context
            .insert(CTX_KEY_FUNC.to_string(), Value::String(caller.function.clone()));
    }

    for (key, value) in &event.fields {
        match key.as_str() {
            FIELD_CHANNEL => {
                if let FieldValue::Value(Value::String(channel)) = value {
                    fields.channel = channel.clone();
                }
            }
            FIELD_REQUEST => {
                if let FieldValue::Request(request) = value {
                    fields.request = Some(request);
                }
            }
            FIELD_USER => fields.user = display_string(value),
            FIELD_STATUS => fields.status = display_string(value),
            FIELD_DURATION => fields.duration = display_string(value),
            _ => {
                fields
                    .context
                    .insert(key.clone(), context_value(value, max_stack_trace));
            }
        }
    }

    fields
}

/// Display form of a field value for the stringly-typed record slots.
/// Strings come through unquoted, scalars print as themselves, and
/// composites fall back to their compact JSON text.
fn display_string(value: &FieldValue) -> String {
    match value {
        FieldValue::Value(Value::String(s)) => s.clone(),
        FieldValue::Value(v) => v.to_string(),
        FieldValue::Error(err) => err.to_string(),
        FieldValue::Request(request) => request.display_line(),
    }
}

fn context_value(value: &FieldValue, max_stack_trace: usize) -> Value {
    match value {
        FieldValue::Value(v) => v.clone(),
        FieldValue::Error(err) => error_object(err.as_ref(), max_stack_trace),
        FieldValue::Request(request) => Value::String(request.display_line()),
    }
}

/// `{msg}` object for an error field, with a `trace` array added when
/// the error carries captured frames.
fn error_object(err: &(dyn Traceback + Send + Sync), max_stack_trace: usize) -> Value {
    let (message, stack) = trace::extract_error(err, max_stack_trace);
    let mut object = serde_json::Map::new();
    object.insert(ERR_KEY_MSG.to_string(), Value::String(message));
    if !stack.is_empty() {
        object.insert(
            ERR_KEY_TRACE.to_string(),
            Value::Array(stack.into_iter().map(Value::String).collect()),
        );
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Caller, Level};
    use crate::trace::{StackFrame, TracedError};
    use http::Method;
    use serde_json::json;

    fn frame(n: usize) -> StackFrame {
        StackFrame {
            function: format!("f{n}"),
            file: "src/handler.rs".to_string(),
            line: n as u32,
        }
    }

    #[test]
    fn caller_is_injected_under_file_and_func() {
        let event = LogEvent::new(Level::Info, "m")
            .with_caller(Caller::new("src/main.rs", 42, "app::run"));
        let fields = classify(&event, 10);
        assert_eq!(fields.context.get("file"), Some(&json!("src/main.rs:42")));
        assert_eq!(fields.context.get("func"), Some(&json!("app::run")));
    }

    #[test]
    fn explicit_field_overrides_injected_caller() {
        let event = LogEvent::new(Level::Info, "m")
            .with_caller(Caller::new("src/main.rs", 42, "app::run"))
            .field("file", "custom");
        let fields = classify(&event, 10);
        assert_eq!(fields.context.get("file"), Some(&json!("custom")));
    }

    #[test]
    fn string_channel_is_promoted() {
        let event = LogEvent::new(Level::Info, "m").field("channel", "web");
        let fields = classify(&event, 10);
        assert_eq!(fields.channel, "web");
        assert!(!fields.context.contains_key("channel"));
    }

    #[test]
    fn non_string_channel_is_discarded() {
        let event = LogEvent::new(Level::Info, "m").field("channel", 7_i64);
        let fields = classify(&event, 10);
        assert_eq!(fields.channel, "");
        assert!(!fields.context.contains_key("channel"));
    }

    #[test]
    fn user_status_duration_take_display_form() {
        let event = LogEvent::new(Level::Info, "m")
            .field("user", 65535_i64)
            .field("status", 202_i64)
            .field("duration", 1.2_f64);
        let fields = classify(&event, 10);
        assert_eq!(fields.user, "65535");
        assert_eq!(fields.status, "202");
        assert_eq!(fields.duration, "1.2");
    }

    #[test]
    fn string_user_is_not_requoted() {
        let event = LogEvent::new(Level::Info, "m").field("user", "alice");
        let fields = classify(&event, 10);
        assert_eq!(fields.user, "alice");
    }

    #[test]
    fn composite_user_prints_compact_json() {
        let event = LogEvent::new(Level::Info, "m")
            .field("user", json!({"id": 1}))
            .field("status", json!(null))
            .field("duration", true);
        let fields = classify(&event, 10);
        assert_eq!(fields.user, r#"{"id":1}"#);
        assert_eq!(fields.status, "null");
        assert_eq!(fields.duration, "true");
    }

    #[test]
    fn plain_error_field_becomes_msg_object() {
        let event = LogEvent::new(Level::Error, "m").field(
            "err",
            FieldValue::error(std::io::Error::new(std::io::ErrorKind::Other, "error occurred")),
        );
        let fields = classify(&event, 10);
        assert_eq!(fields.context.get("err"), Some(&json!({"msg": "error occurred"})));
    }

    #[test]
    fn traced_error_field_carries_truncated_trace() {
        let frames: Vec<StackFrame> = (0..5).map(frame).collect();
        let err = TracedError::with_frames("boom", frames);
        let event = LogEvent::new(Level::Error, "m").field("err", FieldValue::traced(err));
        let fields = classify(&event, 3);
        let object = fields.context.get("err").unwrap();
        assert_eq!(object["msg"], json!("boom"));
        let stack = object["trace"].as_array().unwrap();
        assert_eq!(stack.len(), 3);
        assert_eq!(stack[0], json!("f0 src/handler.rs:0"));
    }

    #[test]
    fn request_snapshot_is_captured_from_reserved_key() {
        let request = CapturedRequest::new(Method::GET, "/foo".parse().unwrap());
        let event = LogEvent::new(Level::Info, "m").field("request", request);
        let fields = classify(&event, 10);
        assert!(fields.request.is_some());
        assert!(!fields.context.contains_key("request"));
    }

    #[test]
    fn non_request_value_under_request_key_is_discarded() {
        let event = LogEvent::new(Level::Info, "m").field("request", "GET /foo");
        let fields = classify(&event, 10);
        assert!(fields.request.is_none());
        assert!(!fields.context.contains_key("request"));
    }

    #[test]
    fn request_under_other_key_degrades_to_display_line() {
        let request = CapturedRequest::new(Method::PUT, "/bar".parse().unwrap());
        let event = LogEvent::new(Level::Info, "m").field("upstream", request);
        let fields = classify(&event, 10);
        assert_eq!(fields.context.get("upstream"), Some(&json!("PUT /bar")));
        assert!(fields.request.is_none());
    }

    #[test]
    fn plain_values_pass_through_untouched() {
        let event = LogEvent::new(Level::Info, "m")
            .field("count", 3_i64)
            .field("tags", json!(["a", "b"]));
        let fields = classify(&event, 10);
        assert_eq!(fields.context.get("count"), Some(&json!(3)));
        assert_eq!(fields.context.get("tags"), Some(&json!(["a", "b"])));
    }
}
