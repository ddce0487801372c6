//! Streaming text utilities
//!
//! Provides the incremental decoder used by the streaming relay to turn
//! upstream byte chunks into text without corrupting characters that
//! straddle a chunk boundary.

/// Incremental UTF-8 decoder for chunked byte streams.
///
/// Upstream chunks are cut at arbitrary byte offsets, so a multi-byte
/// character may arrive split across two chunks. The decoder emits every
/// complete character immediately and carries at most three trailing bytes
/// of an unfinished character into the next call.
///
/// # Example
/// ```
/// use genrelay::streaming::Utf8ChunkDecoder;
///
/// let mut decoder = Utf8ChunkDecoder::new();
///
/// // "é" is 0xC3 0xA9; the first chunk ends mid-character
/// assert_eq!(decoder.decode(b"caf\xC3"), "caf");
/// assert_eq!(decoder.decode(b"\xA9!"), "é!");
/// assert!(!decoder.has_pending());
/// ```
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    /// Bytes of a character whose remainder has not arrived yet
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Create a new empty decoder
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decode the next chunk.
    ///
    /// Returns all text that can be decoded so far. Invalid sequences are
    /// replaced with U+FFFD; an incomplete sequence at the end of the chunk
    /// is held back until the next call or [`finish`](Self::finish).
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(bytes);

        let mut out = String::with_capacity(buf.len());
        let mut rest: &[u8] = &buf;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));

                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            // Truncated character at the end of the input
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Check if bytes of an unfinished character are held back.
    ///
    /// Useful for detecting truncated streams at end of response.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush held-back bytes at end of stream.
    ///
    /// A character that never completed decodes to U+FFFD.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}
