//! Spend construction and signing
//!
//! Inputs are selected from confirmed unspent outputs in ledger key order
//! until they cover the amount plus the fixed fee. Each input carries the
//! previous output's locking script while it is signed, then receives its
//! final `<sig><hashType> <pubkey>` unlocking script.

use crate::crypto::{decode_address, ChainBranch, KeyError, KeyPair};
use crate::network::{
    locking_script, p2pkh_script, signature_script, Hash256, OutPoint, ScriptKind, Transaction,
    TxInput, TxOutput, SEQUENCE_LOCKTIME, SIGHASH_ALL, TX_VERSION,
};
use crate::storage::KvStore;

use super::wallet::{Wallet, WalletError};

/// Assembles a transaction and signs every input with SIGHASH_ALL
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    lock_time: u32,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// Add an input spending `outpoint`, whose locking script is
    /// `previous_script`
    pub fn add_input(mut self, outpoint: OutPoint, previous_script: Vec<u8>) -> Self {
        self.inputs.push(TxInput {
            previous_output: outpoint,
            signature_script: previous_script,
            sequence: SEQUENCE_LOCKTIME,
        });
        self
    }

    pub fn add_output(mut self, value: u64, script: Vec<u8>) -> Self {
        self.outputs.push(TxOutput { value, script });
        self
    }

    pub fn lock_time(mut self, lock_time: u32) -> Self {
        self.lock_time = lock_time;
        self
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Build without signing; inputs still hold their placeholder scripts
    pub fn build(self) -> Transaction {
        Transaction {
            version: TX_VERSION,
            inputs: self.inputs,
            outputs: self.outputs,
            lock_time: self.lock_time,
        }
    }

    /// Build and sign input `i` with `keys[i]`
    pub fn build_and_sign(self, keys: &[KeyPair]) -> Result<Transaction, KeyError> {
        assert_eq!(
            keys.len(),
            self.inputs.len(),
            "one signing key per input is required"
        );
        let mut tx = self.build();
        for (i, key) in keys.iter().enumerate() {
            let digest = tx.signature_hash(i, SIGHASH_ALL);
            let signature = key.sign_digest(&digest)?;
            tx.inputs[i].signature_script =
                signature_script(&signature, SIGHASH_ALL as u8, &key.public_key_bytes());
        }
        Ok(tx)
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A signed spend ready to broadcast
#[derive(Debug, Clone)]
pub struct BuiltSpend {
    pub transaction: Transaction,
    pub raw: Vec<u8>,
    pub txid: Hash256,
    pub inputs: Vec<OutPoint>,
    pub fee: u64,
    /// Change returned to the wallet, if any
    pub change: Option<u64>,
}

impl<S: KvStore> Wallet<S> {
    /// Build and sign a transaction paying `amount` to `destination`.
    ///
    /// The selected outputs stay reserved until the transaction is observed
    /// through `apply_transaction` or released with `abandon_spend`. On error
    /// nothing stays reserved.
    pub async fn build_spend(
        &mut self,
        amount: u64,
        destination: &str,
    ) -> Result<BuiltSpend, WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        let fee = self.config.fee;
        let need = amount as u128 + fee as u128;

        let balance = self.ledger.compute_balance().await?;
        if balance < need {
            return Err(WalletError::InsufficientFunds {
                have: balance,
                need,
            });
        }

        let network = &self.config.network;
        let destination = decode_address(
            destination,
            network.pubkey_hash_byte,
            network.script_hash_byte,
        )?;

        let change_hash = match self.unused_key(ChainBranch::Internal) {
            Some(hash) => hash,
            None => self.new_key(ChainBranch::Internal)?,
        };

        let mut reserved = Vec::new();
        let result = match self
            .select_and_sign(amount, fee, locking_script(&destination), change_hash, &mut reserved)
            .await
        {
            Ok((transaction, change)) => self
                .ledger
                .record_submitted(&transaction, reserved.clone(), change)
                .await
                .map(|()| (transaction, change))
                .map_err(WalletError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok((transaction, change)) => {
                let raw = transaction.encode();
                let txid = transaction.txid();
                if change.is_some() {
                    self.index.mark_used(&change_hash);
                }
                log::info!(
                    "Built spend {}: {} inputs, amount {}, fee {}, change {}",
                    txid,
                    reserved.len(),
                    amount,
                    fee,
                    change.unwrap_or(0)
                );
                Ok(BuiltSpend {
                    transaction,
                    raw,
                    txid,
                    inputs: reserved,
                    fee,
                    change,
                })
            }
            Err(e) => {
                for outpoint in &reserved {
                    self.ledger.release(outpoint);
                }
                log::warn!("Spend failed, released {} reservations: {}", reserved.len(), e);
                Err(e)
            }
        }
    }

    async fn select_and_sign(
        &mut self,
        amount: u64,
        fee: u64,
        payment_script: Vec<u8>,
        change_hash: [u8; 20],
        reserved: &mut Vec<OutPoint>,
    ) -> Result<(Transaction, Option<u64>), WalletError> {
        let need = amount as u128 + fee as u128;
        let mut builder = TransactionBuilder::new();
        let mut keys = Vec::new();
        let mut total: u128 = 0;

        for utxo in self.ledger.unspent_outputs().await? {
            if total >= need {
                break;
            }
            let outpoint = utxo.outpoint();
            if self.ledger.is_reserved(&outpoint) {
                continue;
            }

            let previous = self.ledger.previous_output(&outpoint).await?;
            self.ledger.reserve(outpoint);
            reserved.push(outpoint);

            keys.push(self.signing_key(&outpoint, &previous.script)?);
            builder = builder.add_input(outpoint, previous.script);
            total += utxo.value as u128;
        }

        if total < need {
            return Err(WalletError::InsufficientFunds { have: total, need });
        }

        // Less than the last selected value, so it fits in u64
        let change = (total - need) as u64;
        builder = builder.add_output(amount, payment_script);
        if change > 0 {
            builder = builder.add_output(change, p2pkh_script(&change_hash));
        }

        let tx = builder.build_and_sign(&keys)?;
        Ok((tx, (change > 0).then_some(change)))
    }

    /// Re-derive the key owning a previous output
    fn signing_key(&self, outpoint: &OutPoint, script: &[u8]) -> Result<KeyPair, WalletError> {
        let hash = match ScriptKind::classify(script) {
            kind @ (ScriptKind::PayToPubkey(_) | ScriptKind::PayToPubkeyHash(_)) => kind.owner_hash(),
            _ => None,
        };
        let record = hash
            .and_then(|hash| self.index.lookup(&hash))
            .ok_or_else(|| WalletError::UnresolvableSigningKey(outpoint.to_string()))?;

        let key = self.keychain.derive(record.branch, record.index)?;
        if key.public_key_bytes() != record.public_key {
            return Err(WalletError::UnresolvableSigningKey(outpoint.to_string()));
        }
        Ok(key)
    }
}
