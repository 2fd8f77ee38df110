//! Hierarchical deterministic key derivation (BIP-32)
//!
//! Keys live on two chains below a fixed account path:
//!   receiving: `<base path>/0/<index>`
//!   change:    `<base path>/1/<index>`
//!
//! Derivation is pure: the same seed, branch and index always yield the same
//! key pair, so private keys are never stored and are re-derived for signing.

use bip32::{ChildNumber, Prefix, XPrv};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use super::keys::{KeyError, KeyPair};

/// Which chain below the account path a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainBranch {
    /// Receiving addresses handed out to payers
    External,
    /// Change addresses used by the wallet itself
    Internal,
}

impl ChainBranch {
    /// Path component of this branch
    pub fn as_index(self) -> u32 {
        match self {
            ChainBranch::External => 0,
            ChainBranch::Internal => 1,
        }
    }
}

impl fmt::Display for ChainBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainBranch::External => write!(f, "external"),
            ChainBranch::Internal => write!(f, "internal"),
        }
    }
}

/// On-disk layout of the seed file
#[derive(Serialize, Deserialize)]
struct SeedFile {
    seed: String,
}

/// The wallet's master seed
#[derive(Clone, PartialEq, Eq)]
pub struct Seed(Vec<u8>);

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({} bytes)", self.0.len())
    }
}

impl Seed {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeyError> {
        // BIP-32 accepts seeds between 128 and 512 bits
        if !(16..=64).contains(&bytes.len()) {
            return Err(KeyError::InvalidSeed(format!(
                "seed must be 16 to 64 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(hex_seed: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_seed.trim())
            .map_err(|e| KeyError::InvalidSeed(format!("invalid hex: {}", e)))?;
        Self::from_bytes(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Read a seed file of the form `{ "seed": "<hex>" }`
    pub fn load(path: &Path) -> Result<Self, KeyError> {
        let json = fs::read_to_string(path)
            .map_err(|e| KeyError::InvalidSeed(format!("cannot read {:?}: {}", path, e)))?;
        let file: SeedFile = serde_json::from_str(&json)
            .map_err(|e| KeyError::InvalidSeed(format!("malformed seed file: {}", e)))?;
        Self::from_hex(&file.seed)
    }

    /// Write the seed file, replacing any existing one
    pub fn save(&self, path: &Path) -> Result<(), KeyError> {
        let file = SeedFile { seed: self.to_hex() };
        let json = serde_json::to_string(&file)
            .map_err(|e| KeyError::InvalidSeed(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| KeyError::InvalidSeed(format!("cannot write {:?}: {}", path, e)))
    }
}

/// Parse a path such as `m/44'/3'/0'` into child numbers.
///
/// A `'` suffix marks a hardened child.
pub fn parse_path(path: &str) -> Result<Vec<ChildNumber>, KeyError> {
    let mut parts = path.trim().trim_end_matches('/').split('/');
    if parts.next() != Some("m") {
        return Err(KeyError::InvalidPath(format!(
            "path must start with 'm': {}",
            path
        )));
    }

    parts
        .map(|part| {
            let (index_str, hardened) = match part.strip_suffix('\'') {
                Some(s) => (s, true),
                None => (part, false),
            };
            let index: u32 = index_str
                .parse()
                .map_err(|_| KeyError::InvalidPath(format!("invalid index: {}", part)))?;
            ChildNumber::new(index, hardened)
                .map_err(|e| KeyError::InvalidPath(format!("invalid index {}: {}", part, e)))
        })
        .collect()
}

fn derive_xprv(seed: &[u8], path: &[ChildNumber]) -> Result<XPrv, KeyError> {
    let mut key = XPrv::new(seed).map_err(|e| KeyError::InvalidSeed(e.to_string()))?;
    for child in path {
        key = key
            .derive_child(*child)
            .map_err(|e| KeyError::Derivation(format!("at {}: {}", child, e)))?;
    }
    Ok(key)
}

/// Derive the key pair at `<base path>/<branch>/<index>`
pub fn derive(
    seed: &Seed,
    base_path: &[ChildNumber],
    branch: ChainBranch,
    index: u32,
) -> Result<KeyPair, KeyError> {
    let mut path = base_path.to_vec();
    path.push(
        ChildNumber::new(branch.as_index(), false)
            .map_err(|e| KeyError::InvalidPath(e.to_string()))?,
    );
    path.push(ChildNumber::new(index, false).map_err(|e| KeyError::InvalidPath(e.to_string()))?);

    let xprv = derive_xprv(seed.as_bytes(), &path)?;
    let secret: [u8; 32] = xprv.to_bytes().into();
    KeyPair::from_secret_bytes(&secret)
}

/// Seed plus the account path and version bytes it is derived under
#[derive(Debug, Clone)]
pub struct HdKeyChain {
    seed: Seed,
    base_path: Vec<ChildNumber>,
    base_path_str: String,
    wallet_version: u32,
    wallet_prefix: String,
}

impl HdKeyChain {
    pub fn new(
        seed: Seed,
        base_path: &str,
        wallet_version: u32,
        wallet_prefix: &str,
    ) -> Result<Self, KeyError> {
        Ok(Self {
            seed,
            base_path: parse_path(base_path)?,
            base_path_str: base_path.trim().trim_end_matches('/').to_string(),
            wallet_version,
            wallet_prefix: wallet_prefix.to_string(),
        })
    }

    pub fn derive(&self, branch: ChainBranch, index: u32) -> Result<KeyPair, KeyError> {
        derive(&self.seed, &self.base_path, branch, index)
    }

    /// Full textual path of a key, e.g. `m/44'/3'/0'/1/4`
    pub fn path_for(&self, branch: ChainBranch, index: u32) -> String {
        format!("{}/{}/{}", self.base_path_str, branch.as_index(), index)
    }

    /// Master extended private key rendered with the wallet version bytes
    pub fn extended_master_key(&self) -> Result<String, KeyError> {
        if self.wallet_prefix.len() != 4 {
            return Err(KeyError::Derivation(format!(
                "extended key prefix must be 4 characters: {}",
                self.wallet_prefix
            )));
        }
        let master = derive_xprv(self.seed.as_bytes(), &[])?;
        let prefix = Prefix::from_parts_unchecked(&self.wallet_prefix, self.wallet_version);
        let encoded = master.to_string(prefix);
        Ok(encoded.as_str().to_owned())
    }
}
