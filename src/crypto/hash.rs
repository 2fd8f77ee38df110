//! Cryptographic hashing utilities for the wallet
//!
//! Provides the SHA-256 based digests used for transaction ids, signing
//! digests, message checksums, and the RIPEMD-160 public key hash.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for transaction ids, signing digests and checksums
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Computes double SHA-256 hash and returns it as a hex string
pub fn double_sha256_hex(data: &[u8]) -> String {
    hex::encode(double_sha256(data))
}

/// Hash160 = RIPEMD160(SHA256(data))
///
/// This is the 20-byte public key hash embedded in pay-to-pubkey-hash
/// scripts and addresses.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let ripe = Ripemd160::digest(sha256(data));
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

/// First four bytes of the double SHA-256, used as a wire checksum
pub fn checksum(data: &[u8]) -> [u8; 4] {
    let hash = double_sha256(data);
    [hash[0], hash[1], hash[2], hash[3]]
}
