use crate::addr::parse_ip;
use crate::record::RequestRecord;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use std::collections::BTreeMap;

/// Immutable snapshot of an inbound HTTP request, taken before the
/// event is handed off. Formatting reads from the snapshot only, so
/// the request body is never consumed and repeated formatting of the
/// same event yields identical output.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub remote_addr: String,
    /// Pre-parsed form pairs, when the server framework already decoded
    /// the body. Left empty to have the body parsed here instead.
    pub form: Vec<(String, String)>,
    pub body: Bytes,
}

impl CapturedRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            remote_addr: String::new(),
            form: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Snapshot an `http::Request` whose body has been buffered.
    pub fn from_http(request: &http::Request<Bytes>, remote_addr: impl Into<String>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            remote_addr: remote_addr.into(),
            form: Vec::new(),
            body: request.body().clone(),
        }
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    /// Append a header. Invalid names or values are dropped.
    pub fn with_header<N, V>(mut self, name: N, value: V) -> Self
    where
        N: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_form_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Request line short form, used when a request value sits under a
    /// non-reserved key and has to degrade to a context string.
    pub fn display_line(&self) -> String {
        format!("{} {}", self.method, self.uri.path())
    }

    fn content_type(&self) -> String {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    /// Build the wire-level request object. `status` and `duration`
    /// arrive already stringified from the field classifier.
    pub(crate) fn enrich(&self, status: String, duration: String) -> RequestRecord {
        RequestRecord {
            ip: parse_ip(&self.remote_addr),
            method: self.method.to_string(),
            path: self.uri.path().to_string(),
            headers: self.collect_headers(),
            status,
            duration,
            param: self.collect_params(),
        }
    }

    fn collect_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        for name in self.headers.keys() {
            let joined = self
                .headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            headers.insert(name.as_str().to_string(), joined);
        }
        headers
    }

    /// Query, form, then JSON body, later sources overwriting earlier
    /// ones on the same key. Every parse failure leaves the parameter
    /// map as it was.
    fn collect_params(&self) -> BTreeMap<String, serde_json::Value> {
        let mut params = BTreeMap::new();

        if let Some(query) = self.uri.query() {
            if let Ok(pairs) = serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
                merge_pairs(&pairs, &mut params);
            }
        }

        let content_type = self.content_type();
        if !self.form.is_empty() {
            merge_pairs(&self.form, &mut params);
        } else if content_type.contains("application/x-www-form-urlencoded") {
            if let Ok(pairs) = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&self.body) {
                merge_pairs(&pairs, &mut params);
            }
        }

        if content_type.contains("application/json") {
            if let Ok(serde_json::Value::Object(body)) =
                serde_json::from_slice::<serde_json::Value>(&self.body)
            {
                for (key, value) in body {
                    params.insert(key, value);
                }
            }
        }

        params
    }
}

/// Fold repeated keys within one source: a single value stays a string,
/// repeats become an array of strings.
fn merge_pairs(pairs: &[(String, String)], params: &mut BTreeMap<String, serde_json::Value>) {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in pairs {
        grouped.entry(key.as_str()).or_default().push(value.as_str());
    }
    for (key, values) in grouped {
        let value = if values.len() == 1 {
            serde_json::Value::String(values[0].to_string())
        } else {
            serde_json::Value::Array(
                values
                    .into_iter()
                    .map(|v| serde_json::Value::String(v.to_string()))
                    .collect(),
            )
        };
        params.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enriched(request: &CapturedRequest) -> RequestRecord {
        request.enrich("202".to_string(), "0.05".to_string())
    }

    #[test]
    fn query_params_are_collected() {
        let request = CapturedRequest::new(Method::GET, "/foo?getPram=bar".parse().unwrap());
        let record = enriched(&request);
        assert_eq!(record.param.get("getPram"), Some(&json!("bar")));
        assert_eq!(record.path, "/foo");
        assert_eq!(record.method, "GET");
    }

    #[test]
    fn form_body_is_parsed_when_urlencoded() {
        let request = CapturedRequest::new(Method::POST, "/foo".parse().unwrap())
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_body("formPram=baz");
        let record = enriched(&request);
        assert_eq!(record.param.get("formPram"), Some(&json!("baz")));
    }

    #[test]
    fn preparsed_form_pairs_win_over_body() {
        let request = CapturedRequest::new(Method::POST, "/foo".parse().unwrap())
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_form_pair("formPram", "baz")
            .with_body("ignored=1");
        let record = enriched(&request);
        assert_eq!(record.param.get("formPram"), Some(&json!("baz")));
        assert_eq!(record.param.get("ignored"), None);
    }

    #[test]
    fn json_body_keys_are_merged_as_is() {
        let request = CapturedRequest::new(Method::POST, "/foo".parse().unwrap())
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonParam":"brz","nested":{"a":1}}"#);
        let record = enriched(&request);
        assert_eq!(record.param.get("jsonParam"), Some(&json!("brz")));
        assert_eq!(record.param.get("nested"), Some(&json!({"a": 1})));
    }

    #[test]
    fn json_content_type_matches_with_a_charset_suffix() {
        let request = CapturedRequest::new(Method::POST, "/foo".parse().unwrap())
            .with_header("Content-Type", "application/json; charset=UTF-8")
            .with_body(r#"{"jsonParam":"brz"}"#);
        let record = enriched(&request);
        assert_eq!(record.param.get("jsonParam"), Some(&json!("brz")));
    }

    #[test]
    fn json_body_overrides_query_on_same_key() {
        let request = CapturedRequest::new(Method::POST, "/foo?k=query".parse().unwrap())
            .with_header("content-type", "application/json")
            .with_body(r#"{"k":"body"}"#);
        let record = enriched(&request);
        assert_eq!(record.param.get("k"), Some(&json!("body")));
    }

    #[test]
    fn repeated_query_keys_become_an_array() {
        let request = CapturedRequest::new(Method::GET, "/foo?a=1&a=2&b=3".parse().unwrap());
        let record = enriched(&request);
        assert_eq!(record.param.get("a"), Some(&json!(["1", "2"])));
        assert_eq!(record.param.get("b"), Some(&json!("3")));
    }

    #[test]
    fn malformed_json_body_is_ignored() {
        let request = CapturedRequest::new(Method::POST, "/foo?ok=1".parse().unwrap())
            .with_header("content-type", "application/json")
            .with_body("{not json");
        let record = enriched(&request);
        assert_eq!(record.param.get("ok"), Some(&json!("1")));
        assert_eq!(record.param.len(), 1);
    }

    #[test]
    fn repeated_headers_join_with_comma() {
        let request = CapturedRequest::new(Method::GET, "/".parse().unwrap())
            .with_header("X-Tag", "one")
            .with_header("X-Tag", "two")
            .with_header("Accept", "text/plain");
        let record = enriched(&request);
        assert_eq!(record.headers.get("x-tag").map(String::as_str), Some("one, two"));
        assert_eq!(record.headers.get("accept").map(String::as_str), Some("text/plain"));
    }

    #[test]
    fn remote_addr_is_reduced_to_the_ip() {
        let request = CapturedRequest::new(Method::GET, "/".parse().unwrap())
            .with_remote_addr("1.2.3.4:1234");
        let record = enriched(&request);
        assert_eq!(record.ip, "1.2.3.4");
    }

    #[test]
    fn enriching_twice_reads_the_same_snapshot() {
        let request = CapturedRequest::new(Method::POST, "/foo?q=1".parse().unwrap())
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonParam":"brz"}"#);
        let first = enriched(&request);
        let second = enriched(&request);
        assert_eq!(first.param, second.param);
        assert_eq!(first.headers, second.headers);
    }

    #[test]
    fn display_line_is_method_and_path() {
        let request = CapturedRequest::new(Method::PUT, "/api/v1/items?x=1".parse().unwrap());
        assert_eq!(request.display_line(), "PUT /api/v1/items");
    }

    #[test]
    fn status_and_duration_pass_through() {
        let request = CapturedRequest::new(Method::GET, "/".parse().unwrap());
        let record = request.enrich("404".to_string(), "1.5".to_string());
        assert_eq!(record.status, "404");
        assert_eq!(record.duration, "1.5");
    }
}
