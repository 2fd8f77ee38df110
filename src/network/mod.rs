//! Peer-to-peer wire protocol
//!
//! Byte-exact codecs for the messages the wallet exchanges with peers:
//! - Variable-length integers
//! - Transactions, including the per-input signing serialization
//! - Blocks
//! - `getblocks` requests and `reject` notices
//! - Message framing (magic, command, length, checksum)
//!
//! Connection management lives outside this crate.

pub mod block;
pub mod codec;
pub mod getblocks;
pub mod message;
pub mod reader;
pub mod reject;
pub mod script;
pub mod transaction;
pub mod types;
pub mod varint;

pub use block::{Block, BLOCK_HEADER_SIZE};
pub use codec::{MessageCodec, RawMessage, HEADER_SIZE, MAX_MESSAGE_SIZE};
pub use getblocks::GetBlocksMessage;
pub use message::{Payload, CMD_BLOCK, CMD_GETBLOCKS, CMD_REJECT, CMD_TX};
pub use reject::{RejectCode, RejectMessage};
pub use script::{
    locking_script, p2pkh_script, p2sh_script, signature_script, ScriptKind, SIGHASH_ALL,
};
pub use transaction::{
    Transaction, TxInput, TxOutput, SEQUENCE_FINAL, SEQUENCE_LOCKTIME, TX_VERSION,
};
pub use types::{Hash256, OutPoint};
pub use varint::{write_varint, CodecError, VarLength};
