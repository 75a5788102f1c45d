use crate::schema::Schema;
use serde::Serialize;
use std::collections::BTreeMap;

/// Encoded record shape. Top-level key order is fixed by field
/// declaration order; `ctx` and `param` are ordered maps, so repeated
/// encoding of the same event is byte-identical.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub schema: Schema,
    #[serde(rename = "t")]
    pub time: String,
    #[serde(rename = "l")]
    pub level: String,
    #[serde(rename = "s")]
    pub service: String,
    #[serde(rename = "c")]
    pub channel: String,
    #[serde(rename = "e")]
    pub environment: String,
    #[serde(rename = "u")]
    pub user: String,
    #[serde(rename = "m")]
    pub message: String,
    #[serde(rename = "ctx")]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestRecord>,
}

impl Default for LogRecord {
    fn default() -> Self {
        Self {
            schema: Schema::GeneralLogsV1,
            time: String::new(),
            level: String::new(),
            service: String::new(),
            channel: String::new(),
            environment: String::new(),
            user: String::new(),
            message: String::new(),
            context: BTreeMap::new(),
            request: None,
        }
    }
}

impl LogRecord {
    /// Clear all fields so a pooled instance carries nothing over from
    /// the call that released it. String capacity is retained.
    pub fn reset(&mut self) {
        self.schema = Schema::GeneralLogsV1;
        self.time.clear();
        self.level.clear();
        self.service.clear();
        self.channel.clear();
        self.environment.clear();
        self.user.clear();
        self.message.clear();
        self.context = BTreeMap::new();
        self.request = None;
    }
}

/// Request portion of an `http.request.v1` record.
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    pub ip: String,
    pub method: String,
    pub path: String,
    #[serde(rename = "header")]
    pub headers: BTreeMap<String, String>,
    pub status: String,
    pub duration: String,
    pub param: BTreeMap<String, serde_json::Value>,
}
