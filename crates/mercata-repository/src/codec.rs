//! The document identifier codec.
//!
//! Business identifiers embedded in documents are stored as the fixed-width
//! 16-byte binary form of a UUID, represented in JSON as a base64 string.
//! Equality filters on encoded fields must encode the probe value with this
//! same codec; concrete repositories never hand-roll the encoding.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use uuid::Uuid;

/// Errors raised while decoding a stored identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The stored value is not a string.
    #[error("encoded identifier is not a string")]
    NotText,

    /// The stored string is not valid base64.
    #[error("encoded identifier is not valid base64: {0}")]
    BadEncoding(String),

    /// The decoded bytes are not exactly 16 wide.
    #[error("encoded identifier has {0} bytes, expected 16")]
    BadLength(usize),
}

/// Encode a UUID as its stored document representation.
pub fn encode_uuid(id: Uuid) -> Value {
    Value::String(BASE64.encode(id.as_bytes()))
}

/// Decode a stored document identifier back to a UUID.
pub fn decode_uuid(value: &Value) -> Result<Uuid, CodecError> {
    let text = value.as_str().ok_or(CodecError::NotText)?;
    let bytes = BASE64.decode(text).map_err(|e| CodecError::BadEncoding(e.to_string()))?;
    let raw: [u8; 16] = bytes.as_slice().try_into().map_err(|_| CodecError::BadLength(bytes.len()))?;
    Ok(Uuid::from_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(decode_uuid(&encode_uuid(id)).unwrap(), id);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        // Equality filters on encoded fields depend on this.
        let id = Uuid::new_v4();
        assert_eq!(encode_uuid(id), encode_uuid(id));
    }

    #[test]
    fn test_decode_rejects_non_text() {
        assert_eq!(decode_uuid(&serde_json::json!(42)), Err(CodecError::NotText));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let result = decode_uuid(&serde_json::json!("not base64!!"));
        assert!(matches!(result, Err(CodecError::BadEncoding(_))));
    }

    #[test]
    fn test_decode_rejects_wrong_width() {
        let short = Value::String(BASE64.encode([1u8, 2, 3]));
        assert_eq!(decode_uuid(&short), Err(CodecError::BadLength(3)));
    }
}
