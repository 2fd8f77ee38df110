//! Transaction wire codec
//!
//! Layout:
//! `version(i32) | inputCount(varint) | inputs | outputCount(varint) | outputs | lockTime(u32)`
//!
//! input  = `prevHash(32) | prevIndex(u32) | scriptLen(varint) | script | sequence(u32)`
//! output = `value(u64) | scriptLen(varint) | script`
//!
//! All integers are little-endian.

use serde::{Deserialize, Serialize};

use super::reader::Reader;
use super::types::{Hash256, OutPoint};
use super::varint::{write_varint, CodecError};

/// Current transaction version
pub const TX_VERSION: i32 = 1;

/// Sequence number that disables locktime
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Sequence used for wallet-built inputs (locktime enabled, no replacement)
pub const SEQUENCE_LOCKTIME: u32 = 0xFFFF_FFFE;

/// Transaction input (reference to previous output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub previous_output: OutPoint,
    #[serde(with = "hex_bytes")]
    pub signature_script: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    /// Input with no real previous output (block reward)
    pub fn is_coinbase(&self) -> bool {
        self.previous_output.txid.is_zero()
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in base units
    pub value: u64,
    #[serde(with = "hex_bytes")]
    pub script: Vec<u8>,
}

/// A decoded transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            version: TX_VERSION,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    /// Decode a transaction from the start of `buffer`.
    ///
    /// Returns the transaction and the number of bytes it occupied so a
    /// caller can continue through a concatenated stream.
    pub fn decode(buffer: &[u8]) -> Result<(Self, usize), CodecError> {
        let mut reader = Reader::new(buffer);
        let tx = Self::read_from(&mut reader)?;
        Ok((tx, reader.position()))
    }

    pub(crate) fn read_from(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let version = reader.read_i32_le()?;

        let input_count = reader.read_varint()?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let txid = reader.read_hash()?;
            let index = reader.read_u32_le()?;
            let signature_script = reader.read_var_bytes()?.to_vec();
            let sequence = reader.read_u32_le()?;
            inputs.push(TxInput {
                previous_output: OutPoint { txid, index },
                signature_script,
                sequence,
            });
        }

        let output_count = reader.read_varint()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            let value = reader.read_u64_le()?;
            let script = reader.read_var_bytes()?.to_vec();
            outputs.push(TxOutput { value, script });
        }

        let lock_time = reader.read_u32_le()?;

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Canonical wire encoding
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size_hint());
        self.write_to(&mut buf, None);
        buf
    }

    /// Encode, optionally keeping only one input's script (signing pass)
    fn write_to(&self, buf: &mut Vec<u8>, signing_input: Option<usize>) {
        buf.extend_from_slice(&self.version.to_le_bytes());

        write_varint(buf, self.inputs.len() as u64);
        for (i, input) in self.inputs.iter().enumerate() {
            buf.extend_from_slice(input.previous_output.txid.as_wire());
            buf.extend_from_slice(&input.previous_output.index.to_le_bytes());

            let script: &[u8] = match signing_input {
                Some(signing) if signing != i => &[],
                _ => &input.signature_script,
            };
            write_varint(buf, script.len() as u64);
            buf.extend_from_slice(script);

            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_varint(buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            write_varint(buf, output.script.len() as u64);
            buf.extend_from_slice(&output.script);
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());
    }

    fn size_hint(&self) -> usize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| 41 + 9 + i.signature_script.len())
            .sum();
        let outputs: usize = self.outputs.iter().map(|o| 8 + 9 + o.script.len()).sum();
        8 + 18 + inputs + outputs
    }

    /// Transaction id: double SHA-256 of the canonical encoding
    pub fn txid(&self) -> Hash256 {
        Hash256::hash(&self.encode())
    }

    /// Serialization signed for input `input_index`.
    ///
    /// Every other input's script is blanked to zero length, the signed
    /// input keeps whatever its script field holds (the previous output's
    /// locking script while signing), and the 4-byte hash type is appended
    /// after the lock time.
    pub fn build_signing_digest(&self, input_index: usize, hash_type: u32) -> Vec<u8> {
        assert!(
            input_index < self.inputs.len(),
            "signing input {} of a transaction with {} inputs",
            input_index,
            self.inputs.len()
        );
        let mut buf = Vec::with_capacity(self.size_hint() + 4);
        self.write_to(&mut buf, Some(input_index));
        buf.extend_from_slice(&hash_type.to_le_bytes());
        buf
    }

    /// The 32-byte value actually signed for `input_index`
    pub fn signature_hash(&self, input_index: usize, hash_type: u32) -> [u8; 32] {
        *Hash256::hash(&self.build_signing_digest(input_index, hash_type)).as_wire()
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Get total output amount
    pub fn total_output(&self) -> u128 {
        self.outputs.iter().map(|o| o.value as u128).sum()
    }
}

/// Serde helper storing byte vectors as hex strings
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
