//! Cryptographic utilities for the wallet
//!
//! This module provides:
//! - SHA-256 / RIPEMD-160 hashing
//! - ECDSA key management (secp256k1)
//! - BIP-32 hierarchical deterministic derivation
//! - Base58Check addresses

pub mod address;
pub mod hash;
pub mod hd;
pub mod keys;

pub use address::{
    decode_address, hash_to_address, public_key_to_address, script_hash_address, AddressKind,
    DecodedAddress,
};
pub use hash::{checksum, double_sha256, double_sha256_hex, hash160, sha256};
pub use hd::{derive, parse_path, ChainBranch, HdKeyChain, Seed};
pub use keys::{public_key_from_slice, sign_digest, verify_digest, KeyError, KeyPair};
