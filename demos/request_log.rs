use bytes::Bytes;
use http::Method;

use schemalog::event::{Level, LogEvent};
use schemalog::format::LogsFormatter;
use schemalog::request::CapturedRequest;

fn main() {
    let formatter = LogsFormatter::new("api-gateway", "production");

    let request = http::Request::builder()
        .method(Method::POST)
        .uri("/api/orders?source=web")
        .header("content-type", "application/json")
        .header("x-request-id", "f3a1")
        .body(Bytes::from_static(br#"{"sku":"A-1001","qty":2}"#))
        .expect("build request");
    let request = CapturedRequest::from_http(&request, "203.0.113.7:52114");

    let event = LogEvent::new(Level::Info, "order created")
        .field("request", request)
        .field("user", 65535_i64)
        .field("status", 201_i64)
        .field("duration", 0.042_f64);

    let line = formatter.format(&event).expect("format request log");
    print!("{}", String::from_utf8_lossy(&line));
}
