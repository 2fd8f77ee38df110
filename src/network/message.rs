//! Typed view of framed messages
//!
//! Only the payloads the wallet consumes are interpreted; everything else is
//! passed through untouched.

use super::block::Block;
use super::codec::RawMessage;
use super::getblocks::GetBlocksMessage;
use super::reject::RejectMessage;
use super::transaction::Transaction;
use super::varint::CodecError;

pub const CMD_TX: &str = "tx";
pub const CMD_BLOCK: &str = "block";
pub const CMD_REJECT: &str = "reject";
pub const CMD_GETBLOCKS: &str = "getblocks";

/// A decoded message payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Tx(Transaction),
    Block(Block),
    Reject(RejectMessage),
    Other(RawMessage),
}

impl Payload {
    /// Interpret a framed message by its command
    pub fn decode(message: RawMessage) -> Result<Self, CodecError> {
        match message.command.as_str() {
            CMD_TX => {
                let (tx, consumed) = Transaction::decode(&message.payload)?;
                if consumed != message.payload.len() {
                    log::debug!(
                        "tx payload has {} trailing bytes",
                        message.payload.len() - consumed
                    );
                }
                Ok(Payload::Tx(tx))
            }
            CMD_BLOCK => Ok(Payload::Block(Block::decode(&message.payload)?)),
            CMD_REJECT => Ok(Payload::Reject(RejectMessage::decode(&message.payload)?)),
            _ => Ok(Payload::Other(message)),
        }
    }

    /// Get message type name for logging
    pub fn type_name(&self) -> &str {
        match self {
            Payload::Tx(_) => CMD_TX,
            Payload::Block(_) => CMD_BLOCK,
            Payload::Reject(_) => CMD_REJECT,
            Payload::Other(raw) => &raw.command,
        }
    }
}

impl From<&Transaction> for RawMessage {
    fn from(tx: &Transaction) -> Self {
        RawMessage::new(CMD_TX, tx.encode())
    }
}

impl From<&GetBlocksMessage> for RawMessage {
    fn from(msg: &GetBlocksMessage) -> Self {
        RawMessage::new(CMD_GETBLOCKS, msg.encode())
    }
}
