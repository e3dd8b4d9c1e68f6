//! Expect Engine
//!
//! Watches shell output as it arrives and reports the first pattern that
//! matches, together with the text before it. The pattern list always has
//! the shape `[ready, caller_0 .. caller_n, timeout, eof]`.

use regex::Regex;
use std::time::Duration;
use tokio::time::Instant;

use super::decode::IncrementalDecoder;
use crate::config::TextEncoding;
use crate::error::{Error, Result};
use crate::pty::{ReadEvent, ShellProcess};

/// What a match index stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The session's ready prompt came back
    Ready,
    /// Caller pattern at this position matched
    Interactive(usize),
    /// The deadline passed with no match
    Timeout,
    /// The output stream closed
    Eof,
}

/// Ready pattern plus caller patterns, compiled once per wait
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile `ready` and the caller patterns.
    ///
    /// # Errors
    /// `InvalidPattern` naming the first caller pattern that fails to compile
    pub fn new<S: AsRef<str>>(ready: &str, caller: &[S]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(caller.len() + 1);
        patterns.push(Regex::new(ready)?);

        for pattern in caller {
            let pattern = pattern.as_ref();
            let compiled = Regex::new(pattern).map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            patterns.push(compiled);
        }

        Ok(Self { patterns })
    }

    pub fn timeout_index(&self) -> usize {
        self.patterns.len()
    }

    pub fn eof_index(&self) -> usize {
        self.patterns.len() + 1
    }

    /// Interpret an index from an [`ExpectResult`]
    pub fn signal(&self, index: usize) -> Signal {
        match index {
            0 => Signal::Ready,
            i if i == self.timeout_index() => Signal::Timeout,
            i if i >= self.eof_index() => Signal::Eof,
            i => Signal::Interactive(i - 1),
        }
    }

    /// Earliest match in `text` as `(index, start, end)`.
    ///
    /// Lower start wins; on equal start the pattern declared first wins.
    pub fn earliest_match(&self, text: &str) -> Option<(usize, usize, usize)> {
        self.patterns
            .iter()
            .enumerate()
            .filter_map(|(index, re)| re.find(text).map(|m| (index, m.start(), m.end())))
            .min_by_key(|&(index, start, _)| (start, index))
    }
}

/// Tokio's own "far future": about 30 years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Deadline `timeout` from now, capped for durations the clock cannot hold
pub fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout.min(FAR_FUTURE))
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Result of one wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectResult {
    /// Index into the combined pattern list
    pub index: usize,
    /// Raw text received before the match
    pub before: String,
    /// Raw text of the match itself, empty for timeout and EOF
    pub after: String,
}

/// Incremental matcher over one shell's output
#[derive(Debug)]
pub struct ExpectEngine {
    decoder: IncrementalDecoder,
    /// Text received but not yet consumed by a match
    buffer: String,
    max_buffer_bytes: usize,
}

impl ExpectEngine {
    pub fn new(encoding: TextEncoding, max_buffer_bytes: usize) -> Self {
        Self {
            decoder: IncrementalDecoder::new(encoding),
            buffer: String::new(),
            max_buffer_bytes,
        }
    }

    /// Unconsumed text
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Wait up to `timeout` for one of `patterns`.
    ///
    /// On a pattern match everything up to the match end is consumed. On
    /// timeout the buffer is kept, so a later wait sees the same text again.
    /// On end-of-stream the remaining text is handed out and the buffer is
    /// emptied.
    pub async fn expect(
        &mut self,
        process: &mut dyn ShellProcess,
        patterns: &PatternSet,
        timeout: Duration,
    ) -> Result<ExpectResult> {
        self.expect_until(process, patterns, deadline_after(timeout))
            .await
    }

    /// Like [`expect`](Self::expect), with an absolute deadline
    pub async fn expect_until(
        &mut self,
        process: &mut dyn ShellProcess,
        patterns: &PatternSet,
        deadline: Instant,
    ) -> Result<ExpectResult> {
        loop {
            if let Some((index, start, end)) = patterns.earliest_match(&self.buffer) {
                let before = self.buffer[..start].to_string();
                let after = self.buffer[start..end].to_string();
                self.buffer.drain(..end);
                return Ok(self.finish(index, before, after));
            }

            // A chatty process must not keep the wait alive past its deadline
            if Instant::now() >= deadline {
                let before = self.buffer.clone();
                return Ok(self.finish(patterns.timeout_index(), before, String::new()));
            }

            match process.read_until(deadline).await? {
                ReadEvent::Data(bytes) => {
                    let text = self.decoder.decode(&bytes);
                    self.push(&text);
                }
                ReadEvent::Deadline => {
                    let before = self.buffer.clone();
                    return Ok(self.finish(patterns.timeout_index(), before, String::new()));
                }
                ReadEvent::Eof => {
                    let tail = self.decoder.finish();
                    self.push(&tail);
                    let before = std::mem::take(&mut self.buffer);
                    return Ok(self.finish(patterns.eof_index(), before, String::new()));
                }
            }
        }
    }

    fn finish(&self, index: usize, before: String, after: String) -> ExpectResult {
        trace!("expect finished with index {} ({} bytes before)", index, before.len());
        ExpectResult {
            index,
            before,
            after,
        }
    }

    /// Append text, dropping the oldest output beyond the buffer limit
    fn push(&mut self, text: &str) {
        self.buffer.push_str(text);

        if self.buffer.len() > self.max_buffer_bytes {
            let mut cut = self.buffer.len() - self.max_buffer_bytes;
            while !self.buffer.is_char_boundary(cut) {
                cut += 1;
            }
            self.buffer.drain(..cut);
            debug!("expect buffer over {} bytes, dropped {} bytes", self.max_buffer_bytes, cut);
        }
    }
}
