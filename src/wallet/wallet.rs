//! Wallet aggregate
//!
//! Owns the key chain, the address index and the ledger. All state changes go
//! through `&mut self`, so sharing a wallet between the chain-follower and the
//! user means wrapping it in a [`SharedWallet`]; the mutex guard is held
//! across storage awaits, which keeps spends and incoming transactions from
//! interleaving.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

use crate::config::{ConfigError, WalletConfig};
use crate::crypto::{hash160, hash_to_address, ChainBranch, HdKeyChain, KeyError, Seed};
use crate::network::{CodecError, Hash256, Transaction};
use crate::storage::{JsonFileStore, KvStore, StorageError};

use super::events::BalanceEvent;
use super::index::AddressIndex;
use super::ledger::{ApplyReport, Ledger};

/// File name of the unspent output table
pub const UNSPENT_TABLE: &str = "unspent.json";
/// File name of the transaction archive
pub const TRANSACTIONS_TABLE: &str = "transactions.json";
/// File name of the built-but-unobserved spends
pub const PENDING_TABLE: &str = "pending.json";

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u128, need: u128 },
    #[error("No wallet key can sign for {0}")]
    UnresolvableSigningKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(u64),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Wallet handle shared between tasks
pub type SharedWallet<S> = Arc<Mutex<Wallet<S>>>;

/// An HD wallet with a UTXO ledger
#[derive(Debug)]
pub struct Wallet<S> {
    pub(crate) config: WalletConfig,
    pub(crate) keychain: HdKeyChain,
    pub(crate) index: AddressIndex,
    pub(crate) ledger: Ledger<S>,
}

impl<S: KvStore> Wallet<S> {
    /// Create a wallet over the given tables and derive its initial keys
    pub async fn new(
        config: WalletConfig,
        seed: Seed,
        unspent: S,
        transactions: S,
        pending: S,
    ) -> Result<Self, WalletError> {
        let keychain = HdKeyChain::new(
            seed,
            &config.network.base_path,
            config.network.wallet_version,
            &config.network.wallet_prefix,
        )?;
        let mut wallet = Self {
            config,
            keychain,
            index: AddressIndex::new(),
            ledger: Ledger::new(unspent, transactions, pending),
        };
        wallet.init().await?;
        Ok(wallet)
    }

    /// Pre-derive `gap_limit` keys on both branches, restore the `used`
    /// flags of keys that hold confirmed outputs and reload pending spends.
    async fn init(&mut self) -> Result<(), WalletError> {
        for branch in [ChainBranch::External, ChainBranch::Internal] {
            while self.index.next_index(branch) < self.config.gap_limit {
                self.new_key(branch)?;
            }
        }

        let mut restored = 0;
        for record in self.ledger.unspent_outputs().await? {
            let output = match self.ledger.previous_output(&record.outpoint()).await {
                Ok(output) => output,
                Err(e) => {
                    log::warn!("Cannot restore key usage for {}: {}", record.outpoint(), e);
                    continue;
                }
            };
            if let Some(hash) = self.index.classify_output(&output.script) {
                self.index.mark_used(&hash);
                restored += 1;
            }
        }

        // Change keys of spends built in earlier sessions stay used
        let pending = self.ledger.load_pending().await?;
        for record in &pending {
            for output in &record.transaction()?.outputs {
                if let Some(hash) = self.index.classify_output(&output.script) {
                    self.index.mark_used(&hash);
                }
            }
        }

        log::info!(
            "Wallet ready on {}: {} keys, {} confirmed outputs, {} pending spends",
            self.config.network.name,
            self.index.len(),
            restored,
            pending.len()
        );
        Ok(())
    }

    pub fn into_shared(self) -> SharedWallet<S> {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn keychain(&self) -> &HdKeyChain {
        &self.keychain
    }

    pub fn index(&self) -> &AddressIndex {
        &self.index
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BalanceEvent> {
        self.ledger.events().subscribe()
    }

    /// Derive and register the next key on `branch`, returning its hash
    pub(crate) fn new_key(&mut self, branch: ChainBranch) -> Result<[u8; 20], WalletError> {
        let index = self.index.next_index(branch);
        let key = self.keychain.derive(branch, index)?;
        Ok(self
            .index
            .register_key(index, key.public_key_bytes(), branch))
    }

    /// Derive the next address on `branch`
    pub fn new_address(&mut self, branch: ChainBranch) -> Result<String, WalletError> {
        let hash = self.new_key(branch)?;
        Ok(self.address_for(&hash))
    }

    /// Lowest unused receiving address, deriving one if all are used
    pub fn receive_address(&mut self) -> Result<String, WalletError> {
        let hash = match self.unused_key(ChainBranch::External) {
            Some(hash) => hash,
            None => self.new_key(ChainBranch::External)?,
        };
        Ok(self.address_for(&hash))
    }

    pub fn address_for(&self, pubkey_hash: &[u8; 20]) -> String {
        hash_to_address(pubkey_hash, self.config.network.pubkey_hash_byte)
    }

    pub(crate) fn unused_key(&self, branch: ChainBranch) -> Option<[u8; 20]> {
        self.index
            .first_unused(branch)
            .map(|(_, key)| hash160(&key))
    }

    pub async fn apply_transaction(&mut self, tx: &Transaction) -> ApplyReport {
        self.ledger.apply_transaction(tx, &mut self.index).await
    }

    pub async fn balance(&self) -> Result<u128, WalletError> {
        Ok(self.ledger.compute_balance().await?)
    }

    /// Roll back a built spend that will not be broadcast
    pub async fn abandon_spend(&mut self, txid: &Hash256) -> Result<bool, WalletError> {
        Ok(self.ledger.abandon(txid).await?)
    }
}

impl Wallet<JsonFileStore> {
    /// Open the wallet stored under the configured data directory
    pub async fn open(config: WalletConfig) -> Result<Self, WalletError> {
        let seed = Seed::load(&config.seed_path())?;
        let wallet_dir = config.wallet_dir();
        let unspent = JsonFileStore::open(wallet_dir.join(UNSPENT_TABLE)).await?;
        let transactions = JsonFileStore::open(wallet_dir.join(TRANSACTIONS_TABLE)).await?;
        let pending = JsonFileStore::open(wallet_dir.join(PENDING_TABLE)).await?;
        Self::new(config, seed, unspent, transactions, pending).await
    }

    /// Write the seed file for a new wallet and open it
    pub async fn create(config: WalletConfig, seed: Seed) -> Result<Self, WalletError> {
        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .map_err(StorageError::from)?;
        seed.save(&config.seed_path())?;
        log::info!("Seed written to {:?}", config.seed_path());
        Self::open(config).await
    }
}
