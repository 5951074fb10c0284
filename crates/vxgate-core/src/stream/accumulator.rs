//! Per-stream accumulation state.

use serde_json::Value;

use super::transform::{TransformOutcome, reframe_json_array};
use super::{StreamError, Utf8StreamDecoder};

/// Accumulates one JSON-array response stream and yields complete records.
///
/// Owned by exactly one relay and fed chunks in arrival order. The buffer
/// keeps the raw decoded text; framing is only stripped when evaluating it,
/// so a chunk that ends on array punctuation loses nothing.
#[derive(Debug)]
pub struct Accumulator {
    buffer: String,
    decoder: Utf8StreamDecoder,
    in_progress: bool,
    max_bytes: usize,
}

impl Accumulator {
    /// Create an accumulator that fails once more than `max_bytes` of text
    /// are held without completing an element.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buffer: String::new(),
            decoder: Utf8StreamDecoder::new(),
            in_progress: false,
            max_bytes,
        }
    }

    /// Feed the next transport chunk and return the records it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Value>, StreamError> {
        let text = self.decoder.decode(chunk);
        self.append(&text)
    }

    /// Flush the decoder at end of stream.
    ///
    /// Returns any records completed by the final bytes. Fails with
    /// [`StreamError::Truncated`] if an element was left unfinished.
    pub fn finish(&mut self) -> Result<Vec<Value>, StreamError> {
        let tail = self.decoder.finish();
        let records = self.append(&tail)?;
        if self.in_progress {
            let buffered = self.buffer.len();
            self.reset();
            return Err(StreamError::Truncated { buffered });
        }
        Ok(records)
    }

    /// Returns true while an element has started but not completed.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Bytes of text currently held.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true when nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn append(&mut self, text: &str) -> Result<Vec<Value>, StreamError> {
        self.buffer.push_str(text);
        if self.buffer.len() > self.max_bytes {
            self.reset();
            return Err(StreamError::BufferOverflow {
                limit: self.max_bytes,
            });
        }

        match reframe_json_array(&self.buffer) {
            Ok(TransformOutcome::Idle) => {
                self.reset();
                Ok(Vec::new())
            }
            Ok(TransformOutcome::Accumulating) => {
                self.in_progress = true;
                Ok(Vec::new())
            }
            Ok(TransformOutcome::Complete(records)) => {
                self.reset();
                Ok(records)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.in_progress = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LIMIT: usize = 1024 * 1024;

    #[test]
    fn test_two_chunks_two_records() {
        let mut acc = Accumulator::new(LIMIT);
        assert_eq!(acc.push(b"[{\"a\":1},").unwrap(), vec![json!({"a": 1})]);
        assert_eq!(acc.push(b"{\"b\":2}]").unwrap(), vec![json!({"b": 2})]);
        assert!(acc.is_empty());
        assert!(acc.finish().unwrap().is_empty());
    }

    #[test]
    fn test_object_split_across_chunks() {
        let mut acc = Accumulator::new(LIMIT);
        assert!(acc.push(b"{\"a\":").unwrap().is_empty());
        assert!(acc.is_in_progress());
        assert_eq!(acc.push(b"1}").unwrap(), vec![json!({"a": 1})]);
        assert!(acc.finish().unwrap().is_empty());
    }

    #[test]
    fn test_empty_array_stream() {
        let mut acc = Accumulator::new(LIMIT);
        assert!(acc.push(b"[").unwrap().is_empty());
        assert!(acc.push(b"]").unwrap().is_empty());
        assert!(acc.finish().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_text_errors_without_records() {
        let mut acc = Accumulator::new(LIMIT);
        let err = acc.push(b"{\"a\":1}}").unwrap_err();
        assert!(matches!(err, StreamError::Malformed { .. }));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_multibyte_split_inside_string() {
        let bytes = "[{\"t\":\"né\"}]".as_bytes();
        let split = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut acc = Accumulator::new(LIMIT);
        assert!(acc.push(&bytes[..split]).unwrap().is_empty());
        assert_eq!(acc.push(&bytes[split..]).unwrap(), vec![json!({"t": "né"})]);
    }

    #[test]
    fn test_truncated_stream_reported_on_finish() {
        let mut acc = Accumulator::new(LIMIT);
        assert!(acc.push(b"[{\"a\":").unwrap().is_empty());
        let err = acc.finish().unwrap_err();
        assert!(matches!(err, StreamError::Truncated { .. }));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_buffer_limit_enforced() {
        let mut acc = Accumulator::new(8);
        assert!(acc.push(b"{\"a\":").unwrap().is_empty());
        let err = acc.push(b"\"0123456789\"").unwrap_err();
        assert_eq!(err, StreamError::BufferOverflow { limit: 8 });
    }

    #[test]
    fn test_three_elements_over_five_chunks() {
        let chunks: [&[u8]; 5] = [b"[{\"i\"", b":0},{\"i\":1", b"},", b"{\"i\":2}", b"]"];
        let mut acc = Accumulator::new(LIMIT);
        let mut records = Vec::new();
        for chunk in chunks {
            records.extend(acc.push(chunk).unwrap());
        }
        records.extend(acc.finish().unwrap());
        assert_eq!(records, vec![json!({"i": 0}), json!({"i": 1}), json!({"i": 2})]);
    }
}
