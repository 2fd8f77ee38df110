//! Block message codec
//!
//! Layout: `header(80) | txCount(varint) | transactions`, each transaction in
//! the standard transaction encoding, concatenated.

use super::reader::Reader;
use super::transaction::Transaction;
use super::types::Hash256;
use super::varint::{write_varint, CodecError};

/// Block header size in bytes
pub const BLOCK_HEADER_SIZE: usize = 80;

/// A block: opaque header plus its transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: [u8; BLOCK_HEADER_SIZE],
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Decode a block payload.
    ///
    /// A malformed transaction anywhere in the block invalidates the whole
    /// block, and a payload that ends before the declared transaction count
    /// is reached fails with `TruncatedInput`.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(payload);

        let mut header = [0u8; BLOCK_HEADER_SIZE];
        header.copy_from_slice(reader.read_bytes(BLOCK_HEADER_SIZE as u64)?);

        let tx_count = reader.read_varint()?;
        let mut transactions = Vec::new();
        for _ in 0..tx_count {
            transactions.push(Transaction::read_from(&mut reader)?);
        }

        if reader.remaining() > 0 {
            log::debug!(
                "Ignoring {} trailing bytes after {} block transactions",
                reader.remaining(),
                tx_count
            );
        }

        Ok(Self {
            header,
            transactions,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BLOCK_HEADER_SIZE + 9);
        buf.extend_from_slice(&self.header);
        write_varint(&mut buf, self.transactions.len() as u64);
        for tx in &self.transactions {
            buf.extend_from_slice(&tx.encode());
        }
        buf
    }

    /// Double SHA-256 of the header
    pub fn hash(&self) -> Hash256 {
        Hash256::hash(&self.header)
    }

    /// Previous block hash field of the header
    pub fn previous_hash(&self) -> Hash256 {
        let mut prev = [0u8; 32];
        prev.copy_from_slice(&self.header[4..36]);
        Hash256::from_wire(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::transaction::tests::{sample_tx, GENESIS_COINBASE_HEX};

    const GENESIS_HEADER_HEX: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";

    fn genesis_payload() -> Vec<u8> {
        let mut payload = hex::decode(GENESIS_HEADER_HEX).unwrap();
        payload.push(0x01);
        payload.extend_from_slice(&hex::decode(GENESIS_COINBASE_HEX).unwrap());
        payload
    }

    #[test]
    fn test_decode_genesis_block() {
        let block = Block::decode(&genesis_payload()).unwrap();
        assert_eq!(block.transactions.len(), 1);
        assert!(block.transactions[0].is_coinbase());
        assert!(block.previous_hash().is_zero());
        assert_eq!(
            block.hash().to_hex(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
        assert_eq!(block.encode(), genesis_payload());
    }

    #[test]
    fn test_multiple_transactions() {
        let block = Block {
            header: [0x11; BLOCK_HEADER_SIZE],
            transactions: vec![sample_tx(), sample_tx(), sample_tx()],
        };
        let decoded = Block::decode(&block.encode()).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_declared_count_exceeds_transactions() {
        let mut payload = hex::decode(GENESIS_HEADER_HEX).unwrap();
        payload.push(0x02);
        payload.extend_from_slice(&hex::decode(GENESIS_COINBASE_HEX).unwrap());

        assert!(matches!(
            Block::decode(&payload),
            Err(CodecError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            Block::decode(&[0u8; 79]),
            Err(CodecError::TruncatedInput {
                needed: 80,
                remaining: 79
            })
        ));
    }

    #[test]
    fn test_malformed_transaction_invalidates_block() {
        let mut payload = genesis_payload();
        payload.truncate(payload.len() - 2);
        assert!(Block::decode(&payload).is_err());
    }
}
