use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use schemalog::env::{env_or, LOG_ENVIRONMENT_ENV, LOG_SERVICE_NAME_ENV};
use schemalog::format::LogsFormatter;
use schemalog::init::{init_tracing_with_config, LayerConfig};
use schemalog::stdout_sink::StdoutSink;

#[tokio::main]
async fn main() {
    let service = env_or(LOG_SERVICE_NAME_ENV, "demo-service");
    let environment = env_or(LOG_ENVIRONMENT_ENV, "development");

    let formatter = Arc::new(LogsFormatter::new(service, environment));
    let sink = Arc::new(StdoutSink::new());

    init_tracing_with_config(
        formatter,
        sink,
        LayerConfig {
            channel_buffer: 1024,
            enable_stdout: false,
        },
    );

    info!(channel = "checkout", user = 65535_u64, order = "A-1001", "order accepted");
    info!(channel = "checkout", amount = 149.9, "payment captured");

    let err = std::io::Error::new(std::io::ErrorKind::Other, "inventory lookup failed");
    error!(
        err = &err as &(dyn std::error::Error + 'static),
        channel = "checkout",
        "order failed"
    );

    // Give the background task a little time to drain the channel
    sleep(Duration::from_millis(200)).await;
}
