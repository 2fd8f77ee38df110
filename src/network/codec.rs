//! Message framing for the peer-to-peer stream
//!
//! Every message is prefixed by a 24-byte header:
//! `magic(u32 LE) | command(12, NUL padded) | length(u32 LE) | checksum(4)`
//! where the checksum is the first four bytes of the payload's double SHA-256.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::crypto::checksum;

use super::varint::CodecError;

/// Header size in bytes
pub const HEADER_SIZE: usize = 24;

/// Command field width
pub const COMMAND_SIZE: usize = 12;

/// Largest payload accepted from a peer (32 MiB)
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// A framed message whose payload has not been interpreted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub command: String,
    pub payload: Bytes,
}

impl RawMessage {
    pub fn new(command: &str, payload: impl Into<Bytes>) -> Self {
        Self {
            command: command.to_string(),
            payload: payload.into(),
        }
    }
}

/// Message codec for magic-prefixed, checksummed framing
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    magic: u32,
}

impl MessageCodec {
    pub fn new(magic: u32) -> Self {
        Self { magic }
    }
}

impl Encoder<RawMessage> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: RawMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let command = item.command.as_bytes();
        if command.len() > COMMAND_SIZE || !item.command.is_ascii() {
            return Err(CodecError::InvalidFrame(format!(
                "invalid command: {}",
                item.command
            )));
        }
        if item.payload.len() > MAX_MESSAGE_SIZE {
            return Err(CodecError::InvalidFrame(format!(
                "payload too large: {} bytes",
                item.payload.len()
            )));
        }

        dst.reserve(HEADER_SIZE + item.payload.len());
        dst.put_u32_le(self.magic);
        dst.put_slice(command);
        dst.put_bytes(0, COMMAND_SIZE - command.len());
        dst.put_u32_le(item.payload.len() as u32);
        dst.put_slice(&checksum(&item.payload));
        dst.put_slice(&item.payload);

        Ok(())
    }
}

impl Decoder for MessageCodec {
    type Item = RawMessage;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Need at least header
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        if src[..4] != self.magic.to_le_bytes() {
            return Err(CodecError::InvalidFrame("invalid magic bytes".to_string()));
        }

        let len = u32::from_le_bytes([src[16], src[17], src[18], src[19]]) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(CodecError::InvalidFrame(format!(
                "payload too large: {} bytes",
                len
            )));
        }

        // Check if we have full message
        if src.len() < HEADER_SIZE + len {
            src.reserve(HEADER_SIZE + len - src.len());
            return Ok(None);
        }

        let command_field = &src[4..4 + COMMAND_SIZE];
        let command_len = command_field
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(COMMAND_SIZE);
        if command_field[command_len..].iter().any(|b| *b != 0) {
            return Err(CodecError::InvalidFrame(
                "command is not NUL padded".to_string(),
            ));
        }
        let command = std::str::from_utf8(&command_field[..command_len])
            .map_err(|_| CodecError::InvalidFrame("command is not ASCII".to_string()))?
            .to_string();

        let expected = [src[20], src[21], src[22], src[23]];

        // Skip header
        src.advance(HEADER_SIZE);
        let payload = src.split_to(len).freeze();

        if checksum(&payload) != expected {
            return Err(CodecError::InvalidFrame(format!(
                "checksum mismatch for {}",
                command
            )));
        }

        Ok(Some(RawMessage { command, payload }))
    }
}
