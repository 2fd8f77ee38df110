//! Network and wallet configuration
//!
//! Network parameters select the address version bytes, the extended-key
//! version bytes, the derivation path and the message magic. Wallet
//! configuration adds the data directory and spending policy.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Base units per whole coin
pub const COIN: u64 = 100_000_000;

/// Fixed fee attached to every spend (1 coin)
pub const DEFAULT_FEE: u64 = COIN;

/// Keys pre-derived on each chain when a wallet is initialised
pub const DEFAULT_GAP_LIMIT: u32 = 20;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

/// Per-network constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub name: String,
    /// Message start bytes, read as a little-endian u32
    pub magic: u32,
    /// Version byte of pay-to-pubkey-hash addresses
    pub pubkey_hash_byte: u8,
    /// Version byte of pay-to-script-hash addresses
    pub script_hash_byte: u8,
    /// Version bytes of serialized extended private keys
    pub wallet_version: u32,
    /// Four character prefix matching `wallet_version`
    pub wallet_prefix: String,
    /// Account path the receive/change chains hang off
    pub base_path: String,
    pub protocol_version: i32,
}

impl NetworkParams {
    pub fn dogecoin() -> Self {
        Self {
            name: "dogecoin".to_string(),
            magic: 0xc0c0_c0c0,
            pubkey_hash_byte: 0x1e,
            script_hash_byte: 0x16,
            wallet_version: 0x02fa_c398,
            wallet_prefix: "dgpv".to_string(),
            base_path: "m/44'/3'/0'".to_string(),
            protocol_version: 70015,
        }
    }

    pub fn dogecoin_testnet() -> Self {
        Self {
            name: "testnet".to_string(),
            magic: 0xdcb7_c1fc,
            pubkey_hash_byte: 0x71,
            script_hash_byte: 0xc4,
            wallet_version: 0x0435_8394,
            wallet_prefix: "tprv".to_string(),
            base_path: "m/44'/1'/0'".to_string(),
            protocol_version: 70015,
        }
    }

    /// Look up a preset by name
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "dogecoin" | "mainnet" | "main" => Ok(Self::dogecoin()),
            "testnet" | "test" => Ok(Self::dogecoin_testnet()),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::dogecoin()
    }
}

/// Wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub data_dir: PathBuf,
    #[serde(default)]
    pub network: NetworkParams,
    #[serde(default = "default_fee")]
    pub fee: u64,
    #[serde(default = "default_gap_limit")]
    pub gap_limit: u32,
}

fn default_fee() -> u64 {
    DEFAULT_FEE
}

fn default_gap_limit() -> u32 {
    DEFAULT_GAP_LIMIT
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".wallet_data"),
            network: NetworkParams::default(),
            fee: DEFAULT_FEE,
            gap_limit: DEFAULT_GAP_LIMIT,
        }
    }
}

impl WalletConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn seed_path(&self) -> PathBuf {
        self.data_dir.join("seed.json")
    }

    /// Directory holding the wallet's tables
    pub fn wallet_dir(&self) -> PathBuf {
        self.data_dir.join("wallet")
    }
}
