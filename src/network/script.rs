//! Output script classification and standard script construction
//!
//! Only three locking script shapes are recognised, by their leading bytes:
//! - pay-to-pubkey:      `0x21 <33-byte key> ...`
//! - pay-to-pubkey-hash: `0x76 0xa9 0x14 <20-byte hash> ...`
//! - pay-to-script-hash: `0xa9 0x14 <20-byte hash> ...`
//!
//! Anything else is unclassified. This is not a script interpreter.

use crate::crypto::{hash160, AddressKind, DecodedAddress};

use super::varint::write_varint;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;

/// Push of a compressed public key
const PUSH_33: u8 = 0x21;
/// Push of a 20-byte hash
const PUSH_20: u8 = 0x14;

/// Signature hash type committing to all inputs and outputs
pub const SIGHASH_ALL: u32 = 0x01;

/// The type of locking script on an output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptKind {
    PayToPubkey([u8; 33]),
    PayToPubkeyHash([u8; 20]),
    PayToScriptHash([u8; 20]),
    Unclassified,
}

impl ScriptKind {
    /// Classify a locking script by its leading bytes
    pub fn classify(script: &[u8]) -> Self {
        match script {
            [PUSH_33, key @ ..] if key.len() >= 33 => {
                let mut out = [0u8; 33];
                out.copy_from_slice(&key[..33]);
                ScriptKind::PayToPubkey(out)
            }
            [OP_DUP, OP_HASH160, PUSH_20, hash @ ..] if hash.len() >= 20 => {
                ScriptKind::PayToPubkeyHash(first_20(hash))
            }
            [OP_HASH160, PUSH_20, hash @ ..] if hash.len() >= 20 => {
                ScriptKind::PayToScriptHash(first_20(hash))
            }
            _ => ScriptKind::Unclassified,
        }
    }

    /// The 20-byte hash an owner lookup should use, if any.
    ///
    /// Pay-to-pubkey keys are hashed so they can be found by pubkey hash.
    pub fn owner_hash(&self) -> Option<[u8; 20]> {
        match self {
            ScriptKind::PayToPubkey(key) => Some(hash160(key)),
            ScriptKind::PayToPubkeyHash(hash) | ScriptKind::PayToScriptHash(hash) => Some(*hash),
            ScriptKind::Unclassified => None,
        }
    }
}

fn first_20(bytes: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes[..20]);
    out
}

/// OP_DUP OP_HASH160 <20-byte-hash> OP_EQUALVERIFY OP_CHECKSIG
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, PUSH_20]);
    script.extend_from_slice(pubkey_hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

/// OP_HASH160 <20-byte-hash> OP_EQUAL
pub fn p2sh_script(script_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.extend_from_slice(&[OP_HASH160, PUSH_20]);
    script.extend_from_slice(script_hash);
    script.push(OP_EQUAL);
    script
}

/// Locking script paying to a decoded address
pub fn locking_script(address: &DecodedAddress) -> Vec<u8> {
    match address.kind {
        AddressKind::PubkeyHash => p2pkh_script(&address.hash),
        AddressKind::ScriptHash => p2sh_script(&address.hash),
    }
}

/// Unlocking script for a pay-to-pubkey-hash input:
/// `<sigLen> <DER signature> <hashType> <pubkeyLen> <pubkey>`
pub fn signature_script(signature_der: &[u8], hash_type: u8, public_key: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(signature_der.len() + public_key.len() + 4);
    write_varint(&mut script, signature_der.len() as u64 + 1);
    script.extend_from_slice(signature_der);
    script.push(hash_type);
    write_varint(&mut script, public_key.len() as u64);
    script.extend_from_slice(public_key);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_p2pkh() {
        let script = p2pkh_script(&[0x42; 20]);
        assert_eq!(script.len(), 25);
        assert_eq!(ScriptKind::classify(&script), ScriptKind::PayToPubkeyHash([0x42; 20]));
        assert_eq!(ScriptKind::classify(&script).owner_hash(), Some([0x42; 20]));
    }

    #[test]
    fn test_classify_p2sh() {
        let script = p2sh_script(&[0x07; 20]);
        assert_eq!(ScriptKind::classify(&script), ScriptKind::PayToScriptHash([0x07; 20]));
    }

    #[test]
    fn test_classify_p2pk_hashes_key() {
        let mut script = vec![0x21];
        script.extend_from_slice(&[0x02; 33]);
        script.push(OP_CHECKSIG);

        let kind = ScriptKind::classify(&script);
        assert_eq!(kind, ScriptKind::PayToPubkey([0x02; 33]));
        assert_eq!(kind.owner_hash(), Some(hash160(&[0x02; 33])));
    }

    #[test]
    fn test_unclassified_and_short_scripts() {
        // OP_RETURN data carrier
        assert_eq!(ScriptKind::classify(&[0x6a, 0x01, 0x00]), ScriptKind::Unclassified);
        // Right prefix, missing hash bytes
        assert_eq!(ScriptKind::classify(&[0x76, 0xa9, 0x14, 0x00]), ScriptKind::Unclassified);
        assert_eq!(ScriptKind::classify(&[]), ScriptKind::Unclassified);
        assert_eq!(ScriptKind::Unclassified.owner_hash(), None);
    }

    #[test]
    fn test_signature_script_layout() {
        let sig = [0x30u8; 71];
        let pubkey = [0x02u8; 33];
        let script = signature_script(&sig, SIGHASH_ALL as u8, &pubkey);

        assert_eq!(script[0], 72);
        assert_eq!(script[72], 0x01);
        assert_eq!(script[73], 33);
        assert_eq!(&script[74..], &pubkey);
    }
}
