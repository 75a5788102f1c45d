use crate::format::LogsFormatter;
use crate::layer::SchemaLogLayer;
use crate::sink::LogSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration for the logging layer.
///
/// **Fields**
/// - `channel_buffer`: maximum number of encoded lines queued for the
///   sink before new lines are dropped.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is
///   stacked on top of [`SchemaLogLayer`] so events also print to the
///   console in human-readable form.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            enable_stdout: true,
        }
    }
}

/// Initialize the global `tracing` subscriber using the provided
/// formatter, sink and [`LayerConfig`].
///
/// **Parameters**
/// - `formatter`: [`LogsFormatter`] carrying the service and
///   environment stamps.
/// - `sink`: implementation of [`LogSink`] that will receive encoded
///   lines.
/// - `config`: [`LayerConfig`] controlling channel sizing and console
///   echo.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`SchemaLogLayer`] as the
/// global default subscriber, so all `tracing` events in the process
/// are observed by the layer. The returned handle completes once the
/// layer is dropped and the background task has drained the channel.
pub fn init_tracing_with_config(
    formatter: Arc<LogsFormatter>,
    sink: Arc<dyn LogSink>,
    config: LayerConfig,
) -> JoinHandle<()> {
    let (layer, handle) = SchemaLogLayer::new(formatter, sink, config.channel_buffer);

    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }

    handle
}

/// Initialize tracing with sensible defaults.
///
/// **Parameters**
/// - `formatter`: [`LogsFormatter`] carrying the service and
///   environment stamps.
/// - `sink`: implementation of [`LogSink`] that will receive encoded
///   lines.
///
/// **Behavior**
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`]. This is the recommended entrypoint for
/// typical microservices.
pub fn init_tracing(formatter: Arc<LogsFormatter>, sink: Arc<dyn LogSink>) -> JoinHandle<()> {
    init_tracing_with_config(formatter, sink, LayerConfig::default())
}
