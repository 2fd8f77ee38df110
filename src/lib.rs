//! Doge SPV Wallet: a lightweight Dogecoin-family wallet in Rust
//!
//! This crate provides:
//! - Byte-exact codecs for variable-length integers, transactions, blocks,
//!   `getblocks` and `reject` messages, plus message framing
//! - BIP-32 hierarchical deterministic keys and Base58Check addresses
//! - An address index recognising outputs that pay the wallet
//! - A UTXO ledger with pending spend and pending change tracking
//! - Input selection and SIGHASH_ALL transaction signing
//!
//! # Example
//!
//! ```rust,no_run
//! use doge_spv_wallet::config::WalletConfig;
//! use doge_spv_wallet::crypto::Seed;
//! use doge_spv_wallet::storage::MemoryStore;
//! use doge_spv_wallet::wallet::Wallet;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let seed = Seed::from_hex("000102030405060708090a0b0c0d0e0f")?;
//! let mut wallet = Wallet::new(
//!     WalletConfig::default(),
//!     seed,
//!     MemoryStore::new(),
//!     MemoryStore::new(),
//!     MemoryStore::new(),
//! )
//! .await?;
//!
//! println!("Address: {}", wallet.receive_address()?);
//! println!("Balance: {}", wallet.balance().await?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod network;
pub mod storage;
pub mod wallet;

// Re-export commonly used types
pub use config::{NetworkParams, WalletConfig};
pub use crypto::{HdKeyChain, KeyPair, Seed};
pub use network::{Block, Transaction};
pub use storage::{JsonFileStore, KvStore, MemoryStore};
pub use wallet::{SharedWallet, Wallet, WalletError};
