//! Bounds-checked cursor over a wire buffer

use super::types::Hash256;
use super::varint::{CodecError, VarLength};

/// Reads little-endian fields from a byte slice, failing with
/// `TruncatedInput` instead of reading past the end.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_bytes(&mut self, len: u64) -> Result<&'a [u8], CodecError> {
        let truncated = CodecError::TruncatedInput {
            needed: len,
            remaining: self.remaining(),
        };
        let len = usize::try_from(len).map_err(|_| truncated)?;
        if len > self.remaining() {
            return Err(CodecError::TruncatedInput {
                needed: len as u64,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N as u64)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_hash(&mut self) -> Result<Hash256, CodecError> {
        Ok(Hash256::from_wire(self.read_array()?))
    }

    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let varint = VarLength::decode(self.buf, self.pos)?;
        self.pos += varint.consumed;
        Ok(varint.size)
    }

    /// A varint length prefix followed by that many bytes
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_varint()?;
        self.read_bytes(len)
    }

    /// Everything left in the buffer
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }
}
