//! Streaming response reassembly.
//!
//! Some upstream streaming endpoints deliver one JSON array whose elements
//! arrive spread across transport chunks. The types here turn that byte
//! stream back into complete JSON records as soon as each one is available.

mod accumulator;
mod decoder;
mod transform;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use accumulator::Accumulator;
pub use decoder::Utf8StreamDecoder;
pub use transform::{TransformOutcome, reframe_json_array};

/// How a streaming route's upstream body is relayed to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamTransform {
    /// Bytes are relayed untouched.
    #[default]
    Passthrough,
    /// The body is a JSON array; each element is re-emitted as one event.
    JsonArray,
}

impl StreamTransform {
    /// Returns true when the body is decoded and re-framed.
    #[must_use]
    pub const fn is_reframing(self) -> bool {
        matches!(self, Self::JsonArray)
    }

    /// Stable name used in logs and route listings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::JsonArray => "json_array",
        }
    }
}

impl std::fmt::Display for StreamTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal errors for one streamed response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Buffered text ended with `}` but is not valid JSON.
    #[error("Failed to parse streamed element: {message}")]
    Malformed {
        /// Parser diagnostic.
        message: String,
        /// Leading part of the offending text.
        snippet: String,
    },

    /// The accumulator grew past its configured limit.
    #[error("Stream buffer exceeded {limit} bytes without completing an element")]
    BufferOverflow { limit: usize },

    /// Upstream finished while an element was still incomplete.
    #[error("Upstream stream ended inside an unterminated element ({buffered} bytes buffered)")]
    Truncated { buffered: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_serde_names() {
        let t: StreamTransform = serde_json::from_str("\"json_array\"").unwrap();
        assert_eq!(t, StreamTransform::JsonArray);
        assert_eq!(
            serde_json::to_string(&StreamTransform::Passthrough).unwrap(),
            "\"passthrough\""
        );
        assert_eq!(StreamTransform::default(), StreamTransform::Passthrough);
    }

    #[test]
    fn test_is_reframing() {
        assert!(StreamTransform::JsonArray.is_reframing());
        assert!(!StreamTransform::Passthrough.is_reframing());
    }

    #[test]
    fn test_error_messages() {
        let err = StreamError::BufferOverflow { limit: 10 };
        assert!(err.to_string().contains("10 bytes"));
        let err = StreamError::Truncated { buffered: 3 };
        assert!(err.to_string().contains("unterminated"));
    }
}
