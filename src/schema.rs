use serde::Serialize;

/// Wire-level schema identifier of an encoded record.
///
/// `GeneralLogsV1` is the default; `HttpRequestV1` is selected when a
/// request is attached to the event being formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Schema {
    #[serde(rename = "general.logs.v1")]
    GeneralLogsV1,
    #[serde(rename = "http.request.v1")]
    HttpRequestV1,
}

impl Schema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::GeneralLogsV1 => "general.logs.v1",
            Schema::HttpRequestV1 => "http.request.v1",
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::GeneralLogsV1
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Reserved event field keys. The classifier consumes these instead of
// copying them into the context map.
pub const FIELD_CHANNEL: &str = "channel";
pub const FIELD_REQUEST: &str = "request";
pub const FIELD_USER: &str = "user";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_DURATION: &str = "duration";

// Context keys injected from caller info. Explicit event fields of the
// same name take precedence.
pub const CTX_KEY_FILE: &str = "file";
pub const CTX_KEY_FUNC: &str = "func";

// Keys of the context object an error field is replaced with.
pub const ERR_KEY_MSG: &str = "msg";
pub const ERR_KEY_TRACE: &str = "trace";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_strings() {
        assert_eq!(Schema::GeneralLogsV1.as_str(), "general.logs.v1");
        assert_eq!(Schema::HttpRequestV1.as_str(), "http.request.v1");
        assert_eq!(Schema::default(), Schema::GeneralLogsV1);
    }

    #[test]
    fn schema_serializes_as_wire_string() {
        let json = serde_json::to_string(&Schema::HttpRequestV1).unwrap();
        assert_eq!(json, r#""http.request.v1""#);
    }
}
