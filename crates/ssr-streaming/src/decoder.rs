//! Incremental UTF-8 decoding.

/// Replacement character emitted for malformed input.
pub const REPLACEMENT: char = '\u{FFFD}';

/// Stateful UTF-8 decoder for chunked input.
///
/// A multi-byte sequence split across chunk boundaries is held back until
/// the rest arrives. Malformed bytes decode to [`REPLACEMENT`].
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text completed so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        let mut out = String::with_capacity(buf.len());
        let mut input = buf.as_slice();

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&input[..valid]));

                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            input = &input[valid + len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            self.pending = input[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Whether bytes of an incomplete sequence are buffered.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush the decoder at end of input.
    ///
    /// A truncated trailing sequence decodes to a single [`REPLACEMENT`].
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }
}
