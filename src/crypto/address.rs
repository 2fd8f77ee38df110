//! Base58Check address encoding
//!
//! Address = Base58Check( version byte || 20-byte hash ). The version byte
//! selects between pay-to-pubkey-hash and pay-to-script-hash and differs per
//! network.

use super::hash::hash160;
use super::keys::KeyError;

/// Length of the hash carried by an address
pub const ADDRESS_HASH_LEN: usize = 20;

/// What kind of output an address pays to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    PubkeyHash,
    ScriptHash,
}

/// A validated, decoded address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAddress {
    pub kind: AddressKind,
    pub hash: [u8; ADDRESS_HASH_LEN],
}

/// Convert a public key to an address.
///
/// Address = Base58Check( network_byte || RIPEMD160(SHA256(pubkey)) )
pub fn public_key_to_address(public_key: &[u8], network_byte: u8) -> String {
    hash_to_address(&hash160(public_key), network_byte)
}

/// Encode an already hashed script as a pay-to-script-hash address
pub fn script_hash_address(script_hash: &[u8; ADDRESS_HASH_LEN], script_hash_byte: u8) -> String {
    hash_to_address(script_hash, script_hash_byte)
}

/// Base58Check encode a version byte followed by a 20-byte hash
pub fn hash_to_address(hash: &[u8; ADDRESS_HASH_LEN], version: u8) -> String {
    let mut payload = Vec::with_capacity(1 + ADDRESS_HASH_LEN);
    payload.push(version);
    payload.extend_from_slice(hash);
    bs58::encode(payload).with_check().into_string()
}

/// Decode an address, validating its checksum, length and version byte
pub fn decode_address(
    address: &str,
    pubkey_hash_byte: u8,
    script_hash_byte: u8,
) -> Result<DecodedAddress, KeyError> {
    let decoded = bs58::decode(address.trim())
        .with_check(None)
        .into_vec()
        .map_err(|e| KeyError::InvalidAddress(e.to_string()))?;

    if decoded.len() != 1 + ADDRESS_HASH_LEN {
        return Err(KeyError::InvalidAddress(format!(
            "invalid length: {}",
            decoded.len()
        )));
    }

    let kind = match decoded[0] {
        b if b == pubkey_hash_byte => AddressKind::PubkeyHash,
        b if b == script_hash_byte => AddressKind::ScriptHash,
        other => {
            return Err(KeyError::InvalidAddress(format!(
                "unexpected version byte 0x{:02x}",
                other
            )))
        }
    };

    let mut hash = [0u8; ADDRESS_HASH_LEN];
    hash.copy_from_slice(&decoded[1..]);
    Ok(DecodedAddress { kind, hash })
}
