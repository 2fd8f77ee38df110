//! `getblocks` request encoding
//!
//! Layout: `version(i32) | hashCount(varint) | locator hashes(32 each) | stopHash(32)`.
//! A zero stop hash asks the peer for as many blocks as it will send.

use super::types::Hash256;
use super::varint::write_varint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetBlocksMessage {
    pub version: i32,
    /// Known block hashes, newest first
    pub locator_hashes: Vec<Hash256>,
    pub stop_hash: Hash256,
}

impl GetBlocksMessage {
    /// Request everything after the locator
    pub fn new(version: i32, locator_hashes: Vec<Hash256>) -> Self {
        Self {
            version,
            locator_hashes,
            stop_hash: Hash256::ZERO,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + 9 + 32 * (self.locator_hashes.len() + 1));
        buf.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut buf, self.locator_hashes.len() as u64);
        for hash in &self.locator_hashes {
            buf.extend_from_slice(hash.as_wire());
        }
        buf.extend_from_slice(self.stop_hash.as_wire());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let first = Hash256::hash(b"tip");
        let second = Hash256::hash(b"tip-1");
        let msg = GetBlocksMessage::new(70015, vec![first, second]);
        let raw = msg.encode();

        assert_eq!(raw.len(), 4 + 1 + 32 * 3);
        assert_eq!(&raw[..4], &70015i32.to_le_bytes());
        assert_eq!(raw[4], 2);
        assert_eq!(&raw[5..37], first.as_wire());
        assert_eq!(&raw[37..69], second.as_wire());
        assert_eq!(&raw[69..], &[0u8; 32]);
    }

    #[test]
    fn test_empty_locator() {
        let raw = GetBlocksMessage::new(1, vec![]).encode();
        assert_eq!(raw.len(), 4 + 1 + 32);
        assert_eq!(raw[4], 0);
    }
}
