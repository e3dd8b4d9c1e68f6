//! Incremental decoding of PTY bytes into text.
//!
//! A read may end in the middle of a multi-byte character; the incomplete
//! tail is held back until the next chunk arrives.

use crate::config::TextEncoding;

#[derive(Debug, Clone)]
pub struct IncrementalDecoder {
    encoding: TextEncoding,
    pending: Vec<u8>,
}

impl IncrementalDecoder {
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            pending: Vec::new(),
        }
    }

    /// Decode a chunk, returning all text that is complete so far
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        match self.encoding {
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Utf8 => {
                self.pending.extend_from_slice(bytes);
                let mut text = String::new();
                let mut rest: &[u8] = &self.pending;

                loop {
                    match std::str::from_utf8(rest) {
                        Ok(valid) => {
                            text.push_str(valid);
                            rest = &[];
                            break;
                        }
                        Err(e) => {
                            let (valid, after) = rest.split_at(e.valid_up_to());
                            // valid_up_to guarantees this prefix is UTF-8
                            text.push_str(&String::from_utf8_lossy(valid));
                            match e.error_len() {
                                Some(len) => {
                                    text.push(char::REPLACEMENT_CHARACTER);
                                    rest = &after[len..];
                                }
                                // Incomplete sequence at the end: wait for more
                                None => {
                                    rest = after;
                                    break;
                                }
                            }
                        }
                    }
                }

                self.pending = rest.to_vec();
                text
            }
        }
    }

    /// Flush any held-back bytes, replacing them with U+FFFD
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            String::new()
        } else {
            String::from_utf8_lossy(&pending).into_owned()
        }
    }
}
