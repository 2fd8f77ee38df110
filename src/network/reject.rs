//! `reject` message decoding
//!
//! Layout: `msgLen(varint) | msg | code(1) | reasonLen(varint) | reason | extra data`.
//! The extra data (usually the rejected object's hash) is optional and runs
//! to the end of the payload.

use std::fmt;

use super::reader::Reader;
use super::varint::CodecError;

/// Reason class of a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCode {
    Malformed,
    Invalid,
    Obsolete,
    Duplicate,
    NonStandard,
    Dust,
    InsufficientFee,
    Checkpoint,
    Other(u8),
}

impl From<u8> for RejectCode {
    fn from(byte: u8) -> Self {
        match byte {
            0x01 => RejectCode::Malformed,
            0x10 => RejectCode::Invalid,
            0x11 => RejectCode::Obsolete,
            0x12 => RejectCode::Duplicate,
            0x40 => RejectCode::NonStandard,
            0x41 => RejectCode::Dust,
            0x42 => RejectCode::InsufficientFee,
            0x43 => RejectCode::Checkpoint,
            other => RejectCode::Other(other),
        }
    }
}

impl RejectCode {
    pub fn as_byte(self) -> u8 {
        match self {
            RejectCode::Malformed => 0x01,
            RejectCode::Invalid => 0x10,
            RejectCode::Obsolete => 0x11,
            RejectCode::Duplicate => 0x12,
            RejectCode::NonStandard => 0x40,
            RejectCode::Dust => 0x41,
            RejectCode::InsufficientFee => 0x42,
            RejectCode::Checkpoint => 0x43,
            RejectCode::Other(byte) => byte,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectMessage {
    /// Command of the rejected message, e.g. `tx`
    pub message: String,
    pub code: RejectCode,
    pub reason: String,
    pub extra_data: Option<String>,
}

impl RejectMessage {
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(payload);

        let message = String::from_utf8_lossy(reader.read_var_bytes()?).into_owned();
        let code = RejectCode::from(reader.read_u8()?);
        let reason = String::from_utf8_lossy(reader.read_var_bytes()?).into_owned();

        let rest = reader.read_to_end();
        let extra_data = if rest.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(rest).into_owned())
        };

        Ok(Self {
            message,
            code,
            reason,
            extra_data,
        })
    }
}

impl fmt::Display for RejectMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rejected (code 0x{:02x}): {}",
            self.message,
            self.code.as_byte(),
            self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(extra: &[u8]) -> Vec<u8> {
        let mut raw = vec![0x02];
        raw.extend_from_slice(b"tx");
        raw.push(0x42);
        raw.push(0x0b);
        raw.extend_from_slice(b"fee too low");
        raw.extend_from_slice(extra);
        raw
    }

    #[test]
    fn test_decode_without_extra() {
        let msg = RejectMessage::decode(&payload(&[])).unwrap();
        assert_eq!(msg.message, "tx");
        assert_eq!(msg.code, RejectCode::InsufficientFee);
        assert_eq!(msg.reason, "fee too low");
        assert_eq!(msg.extra_data, None);
        assert_eq!(msg.to_string(), "tx rejected (code 0x42): fee too low");
    }

    #[test]
    fn test_decode_with_extra() {
        let msg = RejectMessage::decode(&payload(b"abc")).unwrap();
        assert_eq!(msg.extra_data.as_deref(), Some("abc"));
    }

    #[test]
    fn test_unknown_code_kept() {
        assert_eq!(RejectCode::from(0x99), RejectCode::Other(0x99));
        assert_eq!(RejectCode::Other(0x99).as_byte(), 0x99);
    }

    #[test]
    fn test_truncated_reason() {
        let raw = payload(&[]);
        assert!(matches!(
            RejectMessage::decode(&raw[..8]),
            Err(CodecError::TruncatedInput { .. })
        ));
    }
}
