//! PTY Streams
//!
//! Provides async-friendly interfaces for PTY I/O by bridging blocking
//! PTY master reads/writes to async code using channels.

use crate::error::{Error, Result};
use std::sync::mpsc::Sender as StdSender;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{timeout_at, Instant};

/// What a bounded read produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A chunk of raw bytes from the shell
    Data(Vec<u8>),
    /// The reader thread is gone; no more output will arrive
    Eof,
    /// The deadline passed with nothing to read
    Deadline,
}

/// PTY I/O streams wrapper
pub struct PtyStreams {
    /// Receiver for output bytes from the PTY (stdout/stderr)
    output_rx: UnboundedReceiver<Vec<u8>>,
    /// Sender for input bytes to the PTY (stdin)
    input_tx: StdSender<Vec<u8>>,
}

impl PtyStreams {
    /// Create new PTY streams from channels
    pub fn from_channels(
        output_rx: UnboundedReceiver<Vec<u8>>,
        input_tx: StdSender<Vec<u8>>,
    ) -> Self {
        Self {
            output_rx,
            input_tx,
        }
    }

    /// Write data to the PTY stdin
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.input_tx
            .send(data.to_vec())
            .map_err(|e| Error::PtyInputSendFailed {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Wait for the next chunk of output, giving up at `deadline`
    pub async fn read_until(&mut self, deadline: Instant) -> ReadEvent {
        match timeout_at(deadline, self.output_rx.recv()).await {
            Ok(Some(bytes)) => ReadEvent::Data(bytes),
            Ok(None) => ReadEvent::Eof,
            Err(_) => ReadEvent::Deadline,
        }
    }
}
