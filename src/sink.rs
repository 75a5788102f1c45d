use async_trait::async_trait;
use bytes::Bytes;
use std::error::Error;

/// Asynchronous destination for encoded log lines produced by the
/// logging layer.
///
/// Implementations are responsible for transporting lines to a concrete
/// backend (stdout, a file, a log shipper, etc). The layer calls `send`
/// from a background task and never awaits it on the application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send a single encoded line to the underlying backend.
    ///
    /// **Parameters**
    /// - `line`: one newline-terminated JSON line produced by the
    ///   formatter.
    ///
    /// **Returns**
    /// - `Ok(())` if the line was accepted by the backend.
    /// - `Err(..)` if the backend failed (I/O error, closed pipe,
    ///   etc.). The layer logs the failure and moves on to the next
    ///   line.
    ///
    /// This method is called from a Tokio task that owns the delivery
    /// loop. Implementations should strive to be non-blocking and use
    /// async I/O under the hood.
    async fn send(&self, line: Bytes) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered lines, if the backend implements buffering.
    ///
    /// **Returns**
    /// - `Ok(())` if all local buffers were successfully flushed.
    /// - `Err(..)` if the backend reported an error during flush.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
