use crate::sink::LogSink;
use async_trait::async_trait;
use bytes::Bytes;
use std::error::Error;
use tokio::io::{self, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

/// A sink that writes each line to the process stdout.
///
/// Lines already carry their trailing newline, so the sink writes them
/// verbatim. Writes are serialized through a mutex so concurrent sends
/// cannot interleave partial lines.
pub struct StdoutSink {
    stdout: Mutex<Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(io::stdout()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSink for StdoutSink {
    async fn send(&self, line: Bytes) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(&line).await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut stdout = self.stdout.lock().await;
        stdout.flush().await?;
        Ok(())
    }
}
