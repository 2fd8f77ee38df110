//! Variable-length integer (CompactSize) encoding
//!
//! The prefix byte decides the width of the value:
//! - `< 0xfd`: the byte itself
//! - `0xfd`: next 2 bytes, little-endian
//! - `0xfe`: next 4 bytes, little-endian
//! - `0xff`: next 8 bytes, little-endian

use thiserror::Error;

/// Errors raised while decoding wire data
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: u64, remaining: usize },
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A decoded variable-length integer and the bytes its encoding occupied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarLength {
    pub size: u64,
    pub consumed: usize,
}

impl VarLength {
    /// Decode the value starting at `offset`
    pub fn decode(buffer: &[u8], offset: usize) -> Result<Self, CodecError> {
        let rest = buffer.get(offset..).unwrap_or(&[]);
        let prefix = *rest.first().ok_or(CodecError::TruncatedInput {
            needed: 1,
            remaining: 0,
        })?;

        let width = match prefix {
            0xfd => 2,
            0xfe => 4,
            0xff => 8,
            n => {
                return Ok(Self {
                    size: n as u64,
                    consumed: 1,
                })
            }
        };

        let body = rest.get(1..1 + width).ok_or(CodecError::TruncatedInput {
            needed: 1 + width as u64,
            remaining: rest.len(),
        })?;

        let mut le = [0u8; 8];
        le[..width].copy_from_slice(body);

        Ok(Self {
            size: u64::from_le_bytes(le),
            consumed: 1 + width,
        })
    }

    /// Shortest encoding of `size`
    pub fn encode(size: u64) -> Vec<u8> {
        let mut buf = Vec::with_capacity(9);
        write_varint(&mut buf, size);
        buf
    }

    /// Number of bytes the shortest encoding of `size` takes
    pub fn encoded_len(size: u64) -> usize {
        match size {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }
}

/// Append the shortest encoding of `n` to `buf`
pub fn write_varint(buf: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&n.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_roundtrip() {
        for n in [
            0u64,
            1,
            0xfc,
            0xfd,
            0xffff,
            0x1_0000,
            0xffff_ffff,
            0x1_0000_0000,
            u64::MAX,
        ] {
            let encoded = VarLength::encode(n);
            assert_eq!(encoded.len(), VarLength::encoded_len(n));
            let decoded = VarLength::decode(&encoded, 0).unwrap();
            assert_eq!(decoded.size, n);
            assert_eq!(decoded.consumed, encoded.len());
        }
    }

    #[test]
    fn test_shortest_encoding_chosen() {
        assert_eq!(VarLength::encode(0xfc), vec![0xfc]);
        assert_eq!(VarLength::encode(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(VarLength::encode(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_decode_accepts_non_minimal() {
        // 5 encoded with a 2-byte body is well formed, just not minimal
        let decoded = VarLength::decode(&[0xfd, 0x05, 0x00], 0).unwrap();
        assert_eq!(decoded.size, 5);
        assert_eq!(decoded.consumed, 3);
    }

    #[test]
    fn test_decode_at_offset() {
        let buf = [0xaa, 0xbb, 0xfe, 0x01, 0x02, 0x03, 0x04];
        let decoded = VarLength::decode(&buf, 2).unwrap();
        assert_eq!(decoded.size, 0x0403_0201);
        assert_eq!(decoded.consumed, 5);
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            VarLength::decode(&[], 0),
            Err(CodecError::TruncatedInput { .. })
        ));
        assert!(matches!(
            VarLength::decode(&[0xff, 0x01, 0x02], 0),
            Err(CodecError::TruncatedInput {
                needed: 9,
                remaining: 3
            })
        ));
        assert!(matches!(
            VarLength::decode(&[0x01], 5),
            Err(CodecError::TruncatedInput { .. })
        ));
    }
}
