//! The JSON-array re-framing step.
//!
//! Works on the whole accumulated text, not only the newest chunk: array
//! punctuation left over from earlier chunks is stripped, and the remainder
//! is either empty, still incomplete, or one or more complete elements.

use serde_json::Value;

use super::StreamError;

/// Longest prefix of offending text kept in a [`StreamError::Malformed`].
const SNIPPET_LEN: usize = 120;

/// Result of evaluating accumulated text.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    /// Only array punctuation or whitespace; nothing to emit.
    Idle,
    /// An element has started but is not complete yet.
    Accumulating,
    /// One or more complete elements, in arrival order.
    Complete(Vec<Value>),
}

impl TransformOutcome {
    /// Returns true while more text is needed.
    #[must_use]
    pub const fn in_progress(&self) -> bool {
        matches!(self, Self::Accumulating)
    }
}

/// Strip array framing from both ends of `text`.
///
/// Leading `[` and `,` and trailing `]` and `,` are removed one at a time,
/// trimming whitespace between removals.
fn strip_framing(text: &str) -> &str {
    let mut body = text.trim();
    while let Some(rest) = body.strip_prefix([',', '[']) {
        body = rest.trim();
    }
    while let Some(rest) = body.strip_suffix([',', ']']) {
        body = rest.trim();
    }
    body
}

/// Evaluate accumulated text from a JSON-array stream.
///
/// Text that does not end in `}` is still accumulating. Text that does is
/// parsed as comma-separated objects; the whole pass succeeds or fails
/// together, so no record is emitted from a pass that ends in an error.
///
/// A trailing `}` does not always close an element. In `[{"a":{"b":1}` it
/// closes the nested object, and the parser reports end-of-input rather
/// than a syntax error. That case returns [`TransformOutcome::Accumulating`]
/// and the text is kept for the next chunk. Only genuine syntax or data
/// errors are terminal.
pub fn reframe_json_array(text: &str) -> Result<TransformOutcome, StreamError> {
    let body = strip_framing(text);

    if body.is_empty() {
        return Ok(TransformOutcome::Idle);
    }
    if !body.ends_with('}') {
        return Ok(TransformOutcome::Accumulating);
    }

    let mut records = Vec::new();
    let mut rest = body;
    loop {
        let mut values = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) => {
                if !value.is_object() {
                    return Err(malformed("element is not a JSON object", rest));
                }
                records.push(value);
                let tail = rest[values.byte_offset()..].trim_start();
                if tail.is_empty() {
                    return Ok(TransformOutcome::Complete(records));
                }
                let Some(next) = tail.strip_prefix(',') else {
                    return Err(malformed("unexpected text after element", tail));
                };
                rest = next.trim_start();
            }
            Some(Err(e)) if e.is_eof() => return Ok(TransformOutcome::Accumulating),
            Some(Err(e)) => return Err(malformed(&e.to_string(), rest)),
            None => return Ok(TransformOutcome::Complete(records)),
        }
    }
}

fn malformed(message: &str, text: &str) -> StreamError {
    StreamError::Malformed {
        message: message.to_string(),
        snippet: text.chars().take(SNIPPET_LEN).collect(),
    }
}
