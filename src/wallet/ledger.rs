//! UTXO ledger
//!
//! Persists the wallet's confirmed unspent outputs and the transactions that
//! created them, and tracks spends that have been built but not yet seen on
//! chain. Each built spend is written to the `pending` table so its
//! reservations survive a restart:
//! - a pending spend reserves a confirmed output, keyed by the id of the
//!   transaction that created it
//! - a pending change entry holds the change value of a built spend, keyed
//!   by the new transaction's id
//!
//! `balance = Σ unreserved unspent values + Σ pending change`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

use crate::network::{Hash256, OutPoint, Transaction, TxOutput};
use crate::storage::{KvStore, StorageError};

use super::events::{BalanceBroadcaster, BalanceEvent};
use super::index::AddressIndex;

/// A confirmed output paying the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutputRecord {
    pub txid: Hash256,
    pub index: u32,
    pub value: u64,
}

impl UnspentOutputRecord {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.index)
    }
}

/// A transaction archived because it pays the wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub txid: Hash256,
    /// Raw wire encoding, hex
    pub raw: String,
    pub received_at: DateTime<Utc>,
}

impl StoredTransaction {
    pub fn new(tx: &Transaction) -> Self {
        Self {
            txid: tx.txid(),
            raw: hex::encode(tx.encode()),
            received_at: Utc::now(),
        }
    }

    pub fn transaction(&self) -> Result<Transaction, StorageError> {
        decode_stored(&self.txid, &self.raw)
    }
}

fn decode_stored(txid: &Hash256, raw: &str) -> Result<Transaction, StorageError> {
    let invalid = |e: String| StorageError::InvalidData(format!("transaction {}: {}", txid, e));
    let raw = hex::decode(raw).map_err(|e| invalid(e.to_string()))?;
    let (tx, _) = Transaction::decode(&raw).map_err(|e| invalid(e.to_string()))?;
    Ok(tx)
}

/// A built spend that has not been observed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSpendRecord {
    pub txid: Hash256,
    pub inputs: Vec<OutPoint>,
    pub change: Option<u64>,
    /// Signed wire encoding, hex
    pub raw: String,
    pub created_at: DateTime<Utc>,
}

impl PendingSpendRecord {
    pub fn transaction(&self) -> Result<Transaction, StorageError> {
        decode_stored(&self.txid, &self.raw)
    }
}

/// A single input or output that could not be applied
#[derive(Debug)]
pub struct ApplyFailure {
    pub outpoint: OutPoint,
    pub error: StorageError,
}

/// Outcome of applying one transaction to the ledger
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub spent: Vec<OutPoint>,
    pub received: Vec<(OutPoint, u64)>,
    /// Change of a spend built by this wallet has confirmed
    pub change_confirmed: bool,
    pub failures: Vec<ApplyFailure>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Did the transaction touch the wallet at all
    pub fn is_relevant(&self) -> bool {
        !self.spent.is_empty() || !self.received.is_empty() || !self.failures.is_empty()
    }
}

/// Confirmed outputs plus in-flight spend state
#[derive(Debug)]
pub struct Ledger<S> {
    unspent: S,
    transactions: S,
    pending: S,
    /// Previous txid -> reserved output indices
    pending_spends: HashMap<Hash256, BTreeSet<u32>>,
    /// New txid -> unconfirmed change value
    pending_change: HashMap<Hash256, u64>,
    /// New txid -> outputs it reserved, for abandoning
    submitted: HashMap<Hash256, Vec<OutPoint>>,
    events: BalanceBroadcaster,
}

impl<S: KvStore> Ledger<S> {
    pub fn new(unspent: S, transactions: S, pending: S) -> Self {
        Self {
            unspent,
            transactions,
            pending,
            pending_spends: HashMap::new(),
            pending_change: HashMap::new(),
            submitted: HashMap::new(),
            events: BalanceBroadcaster::new(),
        }
    }

    pub fn events(&self) -> &BalanceBroadcaster {
        &self.events
    }

    /// Restore the spends recorded by earlier sessions.
    ///
    /// A record none of whose inputs is still unspent has been resolved on
    /// chain and is deleted instead.
    pub async fn load_pending(&mut self) -> Result<Vec<PendingSpendRecord>, StorageError> {
        let unspent: BTreeSet<OutPoint> = self
            .unspent_outputs()
            .await?
            .iter()
            .map(UnspentOutputRecord::outpoint)
            .collect();

        let mut restored = Vec::new();
        for (key, value) in self.pending.entries().await? {
            let record: PendingSpendRecord = serde_json::from_value(value)?;
            if !record.inputs.iter().any(|outpoint| unspent.contains(outpoint)) {
                log::info!("Pending spend {} resolved, dropping it", record.txid);
                self.pending.delete(&key).await?;
                continue;
            }

            for outpoint in &record.inputs {
                if unspent.contains(outpoint) {
                    self.reserve(*outpoint);
                }
            }
            if let Some(value) = record.change {
                self.pending_change.insert(record.txid, value);
            }
            self.submitted.insert(record.txid, record.inputs.clone());
            restored.push(record);
        }
        Ok(restored)
    }

    /// Apply a transaction observed on the network.
    ///
    /// Every input and output is attempted even if a sibling fails; storage
    /// failures are collected in the report.
    pub async fn apply_transaction(
        &mut self,
        tx: &Transaction,
        index: &mut AddressIndex,
    ) -> ApplyReport {
        let txid = tx.txid();
        let mut report = ApplyReport::default();

        for input in tx.inputs.iter().filter(|input| !input.is_coinbase()) {
            let outpoint = input.previous_output;
            match self.remove_unspent(&outpoint).await {
                Ok(true) => {
                    log::info!("Output {} spent by {}", outpoint, txid);
                    report.spent.push(outpoint);
                    self.events.broadcast(BalanceEvent::OutputSpent { outpoint });
                }
                Ok(false) => {}
                Err(error) => report.failures.push(ApplyFailure { outpoint, error }),
            }
            self.release(&outpoint);
        }

        let owned: Vec<(u32, &TxOutput, [u8; 20])> = tx
            .outputs
            .iter()
            .enumerate()
            .filter_map(|(i, output)| {
                index
                    .classify_output(&output.script)
                    .map(|hash| (i as u32, output, hash))
            })
            .collect();

        // An output without its archived transaction could never be signed for
        if !owned.is_empty() {
            if let Err(e) = self.archive(tx).await {
                log::warn!("Failed to archive transaction {}: {}", txid, e);
                for (i, _, _) in owned {
                    report.failures.push(ApplyFailure {
                        outpoint: OutPoint::new(txid, i),
                        error: StorageError::InvalidData(format!("archive failed: {}", e)),
                    });
                }
                return self.finish_apply(txid, report).await;
            }
        }

        for (i, output, hash) in owned {
            let outpoint = OutPoint::new(txid, i);
            let record = UnspentOutputRecord {
                txid,
                index: i,
                value: output.value,
            };
            match self.put_unspent(&record).await {
                Ok(()) => {
                    index.mark_used(&hash);
                    log::info!("Received {} base units at {}", output.value, outpoint);
                    report.received.push((outpoint, output.value));
                    self.events.broadcast(BalanceEvent::OutputReceived {
                        outpoint,
                        value: output.value,
                    });
                    if self.pending_change.remove(&txid).is_some() {
                        log::debug!("Change of {} confirmed", txid);
                        report.change_confirmed = true;
                    }
                }
                Err(error) => report.failures.push(ApplyFailure { outpoint, error }),
            }
        }

        self.finish_apply(txid, report).await
    }

    async fn finish_apply(&mut self, txid: Hash256, report: ApplyReport) -> ApplyReport {
        // Kept on failure so replaying the transaction can finish it
        if report.is_complete() && self.submitted.remove(&txid).is_some() {
            log::info!("Own spend {} observed", txid);
            // A stale record is dropped by the next load_pending
            if let Err(e) = self.pending.delete(&txid.to_hex()).await {
                log::warn!("Failed to clear pending spend {}: {}", txid, e);
            }
        }

        for failure in &report.failures {
            log::warn!("Could not apply {}: {}", failure.outpoint, failure.error);
        }

        report
    }

    /// Spendable balance in base units
    pub async fn compute_balance(&self) -> Result<u128, StorageError> {
        let confirmed: u128 = self
            .unspent_outputs()
            .await?
            .iter()
            .filter(|record| !self.is_reserved(&record.outpoint()))
            .map(|record| record.value as u128)
            .sum();
        Ok(confirmed + self.pending_change_total())
    }

    /// Confirmed unspent outputs in ascending key order
    pub async fn unspent_outputs(&self) -> Result<Vec<UnspentOutputRecord>, StorageError> {
        self.unspent
            .entries()
            .await?
            .into_iter()
            .map(|(_, value)| serde_json::from_value(value).map_err(StorageError::from))
            .collect()
    }

    /// The archived output an outpoint refers to
    pub async fn previous_output(&self, outpoint: &OutPoint) -> Result<TxOutput, StorageError> {
        let stored = self
            .transactions
            .get(&outpoint.txid.to_hex())
            .await?
            .ok_or_else(|| {
                StorageError::InvalidData(format!("transaction {} not archived", outpoint.txid))
            })?;
        let stored: StoredTransaction = serde_json::from_value(stored)?;
        let tx = stored.transaction()?;
        tx.outputs
            .get(outpoint.index as usize)
            .cloned()
            .ok_or_else(|| StorageError::InvalidData(format!("output {} does not exist", outpoint)))
    }

    pub async fn stored_transaction(
        &self,
        txid: &Hash256,
    ) -> Result<Option<StoredTransaction>, StorageError> {
        match self.transactions.get(&txid.to_hex()).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn is_reserved(&self, outpoint: &OutPoint) -> bool {
        self.pending_spends
            .get(&outpoint.txid)
            .is_some_and(|indices| indices.contains(&outpoint.index))
    }

    /// Record a pending spend of `outpoint`
    pub fn reserve(&mut self, outpoint: OutPoint) {
        self.pending_spends
            .entry(outpoint.txid)
            .or_default()
            .insert(outpoint.index);
    }

    /// Drop the pending spend of `outpoint`, if any
    pub fn release(&mut self, outpoint: &OutPoint) {
        if let Some(indices) = self.pending_spends.get_mut(&outpoint.txid) {
            indices.remove(&outpoint.index);
            if indices.is_empty() {
                self.pending_spends.remove(&outpoint.txid);
            }
        }
    }

    /// Register a built spend: its reservations and its change, if any.
    ///
    /// The inputs must already be reserved. Nothing changes in memory if the
    /// record cannot be persisted.
    pub async fn record_submitted(
        &mut self,
        tx: &Transaction,
        inputs: Vec<OutPoint>,
        change: Option<u64>,
    ) -> Result<(), StorageError> {
        let txid = tx.txid();
        let record = PendingSpendRecord {
            txid,
            inputs,
            change,
            raw: hex::encode(tx.encode()),
            created_at: Utc::now(),
        };
        self.pending
            .put(&txid.to_hex(), serde_json::to_value(&record)?)
            .await?;

        if let Some(value) = change {
            self.pending_change.insert(txid, value);
        }
        self.submitted.insert(txid, record.inputs);
        self.events.broadcast(BalanceEvent::SpendReserved { txid });
        Ok(())
    }

    /// Roll back a built spend that will not be broadcast
    pub async fn abandon(&mut self, txid: &Hash256) -> Result<bool, StorageError> {
        if !self.submitted.contains_key(txid) {
            return Ok(false);
        }
        self.pending.delete(&txid.to_hex()).await?;

        let inputs = self.submitted.remove(txid).unwrap_or_default();
        for outpoint in &inputs {
            self.release(outpoint);
        }
        self.pending_change.remove(txid);
        log::warn!("Abandoned spend {} ({} inputs released)", txid, inputs.len());
        self.events.broadcast(BalanceEvent::SpendAbandoned { txid: *txid });
        Ok(true)
    }

    /// Ids of built spends not yet observed, ascending
    pub fn submitted(&self) -> Vec<Hash256> {
        let mut txids: Vec<Hash256> = self.submitted.keys().copied().collect();
        txids.sort();
        txids
    }

    pub fn pending_change(&self, txid: &Hash256) -> Option<u64> {
        self.pending_change.get(txid).copied()
    }

    pub fn pending_change_total(&self) -> u128 {
        self.pending_change.values().map(|v| *v as u128).sum()
    }

    pub fn pending_spend_count(&self) -> usize {
        self.pending_spends.values().map(BTreeSet::len).sum()
    }

    async fn remove_unspent(&self, outpoint: &OutPoint) -> Result<bool, StorageError> {
        let key = outpoint.storage_key();
        if self.unspent.get(&key).await?.is_none() {
            return Ok(false);
        }
        self.unspent.delete(&key).await?;
        Ok(true)
    }

    async fn put_unspent(&self, record: &UnspentOutputRecord) -> Result<(), StorageError> {
        let value: Value = serde_json::to_value(record)?;
        self.unspent.put(&record.outpoint().storage_key(), value).await
    }

    async fn archive(&self, tx: &Transaction) -> Result<(), StorageError> {
        let stored = StoredTransaction::new(tx);
        let key = stored.txid.to_hex();
        self.transactions.put(&key, serde_json::to_value(&stored)?).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crypto::ChainBranch;
    use crate::network::{p2pkh_script, TxInput, SEQUENCE_FINAL};
    use crate::storage::MemoryStore;

    pub fn funding_tx(seed: &[u8], outputs: Vec<TxOutput>) -> Transaction {
        Transaction::new(
            vec![TxInput {
                previous_output: OutPoint::new(Hash256::hash(seed), 0),
                signature_script: vec![0x00],
                sequence: SEQUENCE_FINAL,
            }],
            outputs,
        )
    }

    fn memory_ledger() -> Ledger<MemoryStore> {
        Ledger::new(MemoryStore::new(), MemoryStore::new(), MemoryStore::new())
    }

    fn setup() -> (Ledger<MemoryStore>, AddressIndex, [u8; 20]) {
        let mut index = AddressIndex::new();
        let mut key = [7u8; 33];
        key[0] = 0x03;
        let hash = index.register_key(0, key, ChainBranch::External);
        (memory_ledger(), index, hash)
    }

    #[tokio::test]
    async fn test_owned_output_increases_balance() {
        let (mut ledger, mut index, hash) = setup();
        let tx = funding_tx(
            b"a",
            vec![
                TxOutput {
                    value: 500_000_000,
                    script: p2pkh_script(&hash),
                },
                TxOutput {
                    value: 7,
                    script: p2pkh_script(&[1u8; 20]),
                },
            ],
        );

        let report = ledger.apply_transaction(&tx, &mut index).await;
        assert!(report.is_complete());
        assert!(report.spent.is_empty());
        assert_eq!(report.received, vec![(OutPoint::new(tx.txid(), 0), 500_000_000)]);
        assert_eq!(ledger.compute_balance().await.unwrap(), 500_000_000);
        assert!(index.first_unused(ChainBranch::External).is_none());

        let previous = ledger.previous_output(&OutPoint::new(tx.txid(), 0)).await.unwrap();
        assert_eq!(previous.script, p2pkh_script(&hash));
    }

    #[tokio::test]
    async fn test_spending_input_removes_record() {
        let (mut ledger, mut index, hash) = setup();
        let funding = funding_tx(
            b"b",
            vec![TxOutput {
                value: 10,
                script: p2pkh_script(&hash),
            }],
        );
        ledger.apply_transaction(&funding, &mut index).await;

        let spend = Transaction::new(
            vec![TxInput {
                previous_output: OutPoint::new(funding.txid(), 0),
                signature_script: vec![],
                sequence: SEQUENCE_FINAL,
            }],
            vec![TxOutput {
                value: 9,
                script: p2pkh_script(&[2u8; 20]),
            }],
        );
        let mut rx = ledger.events().subscribe();
        let report = ledger.apply_transaction(&spend, &mut index).await;

        assert_eq!(report.spent, vec![OutPoint::new(funding.txid(), 0)]);
        assert_eq!(ledger.compute_balance().await.unwrap(), 0);
        assert_eq!(
            rx.recv().await.unwrap(),
            BalanceEvent::OutputSpent {
                outpoint: OutPoint::new(funding.txid(), 0)
            }
        );

        // Observing the same spend twice is not an error
        let again = ledger.apply_transaction(&spend, &mut index).await;
        assert!(again.is_complete());
        assert!(!again.is_relevant());
    }

    #[tokio::test]
    async fn test_coinbase_inputs_are_skipped() {
        let (mut ledger, mut index, hash) = setup();
        let coinbase = Transaction::new(
            vec![TxInput {
                previous_output: OutPoint::new(Hash256::ZERO, u32::MAX),
                signature_script: vec![0x04, 0xff],
                sequence: SEQUENCE_FINAL,
            }],
            vec![TxOutput {
                value: 10_000,
                script: p2pkh_script(&hash),
            }],
        );
        let report = ledger.apply_transaction(&coinbase, &mut index).await;
        assert!(report.spent.is_empty());
        assert_eq!(ledger.compute_balance().await.unwrap(), 10_000);
    }

    #[tokio::test]
    async fn test_reserved_outputs_excluded_from_balance() {
        let (mut ledger, mut index, hash) = setup();
        let funding = funding_tx(
            b"c",
            vec![
                TxOutput {
                    value: 300,
                    script: p2pkh_script(&hash),
                },
                TxOutput {
                    value: 200,
                    script: p2pkh_script(&hash),
                },
            ],
        );
        ledger.apply_transaction(&funding, &mut index).await;

        let first = OutPoint::new(funding.txid(), 0);
        ledger.reserve(first);
        assert!(ledger.is_reserved(&first));
        assert!(!ledger.is_reserved(&OutPoint::new(funding.txid(), 1)));
        assert_eq!(ledger.compute_balance().await.unwrap(), 200);

        let spend = funding_tx(b"spend", Vec::new());
        let spend_id = spend.txid();
        ledger
            .record_submitted(&spend, vec![first], Some(150))
            .await
            .unwrap();
        assert_eq!(ledger.compute_balance().await.unwrap(), 350);
        assert_eq!(ledger.submitted(), vec![spend_id]);

        assert!(ledger.abandon(&spend_id).await.unwrap());
        assert!(!ledger.abandon(&spend_id).await.unwrap());
        assert!(ledger.pending.is_empty().await);
        assert_eq!(ledger.pending_spend_count(), 0);
        assert_eq!(ledger.compute_balance().await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_balance_does_not_overflow_u64() {
        let (mut ledger, mut index, hash) = setup();
        for seed in [b"x", b"y", b"z"] {
            let tx = funding_tx(
                seed,
                vec![TxOutput {
                    value: u64::MAX,
                    script: p2pkh_script(&hash),
                }],
            );
            ledger.apply_transaction(&tx, &mut index).await;
        }
        assert_eq!(ledger.compute_balance().await.unwrap(), u64::MAX as u128 * 3);
    }

    /// Store whose writes fail for keys with a given prefix
    struct FlakyStore {
        inner: MemoryStore,
        fail_prefix: String,
    }

    impl KvStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: Value) -> Result<(), StorageError> {
            if key.starts_with(&self.fail_prefix) {
                return Err(StorageError::InvalidData("disk full".to_string()));
            }
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.inner.delete(key).await
        }

        async fn entries(&self) -> Result<Vec<(String, Value)>, StorageError> {
            self.inner.entries().await
        }
    }

    #[tokio::test]
    async fn test_failures_are_collected_not_short_circuited() {
        let mut index = AddressIndex::new();
        let mut key = [7u8; 33];
        key[0] = 0x02;
        let hash = index.register_key(0, key, ChainBranch::External);

        let tx = funding_tx(
            b"flaky",
            vec![
                TxOutput {
                    value: 1,
                    script: p2pkh_script(&hash),
                },
                TxOutput {
                    value: 2,
                    script: p2pkh_script(&hash),
                },
            ],
        );
        let failing_key = OutPoint::new(tx.txid(), 0).storage_key();

        let mut ledger = Ledger::new(
            FlakyStore {
                inner: MemoryStore::new(),
                fail_prefix: failing_key.clone(),
            },
            FlakyStore {
                inner: MemoryStore::new(),
                fail_prefix: "never".to_string(),
            },
            FlakyStore {
                inner: MemoryStore::new(),
                fail_prefix: "never".to_string(),
            },
        );

        let report = ledger.apply_transaction(&tx, &mut index).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].outpoint, OutPoint::new(tx.txid(), 0));
        assert_eq!(report.received, vec![(OutPoint::new(tx.txid(), 1), 2)]);
        assert_eq!(ledger.compute_balance().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_archive_failure_records_nothing() {
        let mut index = AddressIndex::new();
        let mut key = [9u8; 33];
        key[0] = 0x02;
        let hash = index.register_key(0, key, ChainBranch::External);

        let tx = funding_tx(
            b"no-archive",
            vec![
                TxOutput {
                    value: 5,
                    script: p2pkh_script(&hash),
                },
                TxOutput {
                    value: 6,
                    script: p2pkh_script(&hash),
                },
            ],
        );

        let mut ledger = Ledger::new(
            FlakyStore {
                inner: MemoryStore::new(),
                fail_prefix: "never".to_string(),
            },
            FlakyStore {
                inner: MemoryStore::new(),
                fail_prefix: tx.txid().to_hex(),
            },
            FlakyStore {
                inner: MemoryStore::new(),
                fail_prefix: "never".to_string(),
            },
        );

        let report = ledger.apply_transaction(&tx, &mut index).await;
        assert_eq!(report.failures.len(), 2);
        assert!(report.received.is_empty());
        assert!(ledger.unspent_outputs().await.unwrap().is_empty());
        assert_eq!(ledger.compute_balance().await.unwrap(), 0);
        assert!(!index.key_record(&key).unwrap().used);
    }

    #[tokio::test]
    async fn test_reserved_output_sibling_still_counts() {
        let (mut ledger, mut index, hash) = setup();
        let funding = funding_tx(
            b"siblings",
            vec![
                TxOutput {
                    value: 40,
                    script: p2pkh_script(&hash),
                },
                TxOutput {
                    value: 2,
                    script: p2pkh_script(&hash),
                },
            ],
        );
        ledger.apply_transaction(&funding, &mut index).await;

        ledger.reserve(OutPoint::new(funding.txid(), 1));
        assert_eq!(ledger.compute_balance().await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_pending_spends_reload() {
        let (mut ledger, mut index, hash) = setup();
        let funding = funding_tx(
            b"reload",
            vec![
                TxOutput {
                    value: 300,
                    script: p2pkh_script(&hash),
                },
                TxOutput {
                    value: 200,
                    script: p2pkh_script(&hash),
                },
            ],
        );
        ledger.apply_transaction(&funding, &mut index).await;

        let open = OutPoint::new(funding.txid(), 0);
        let resolved = OutPoint::new(funding.txid(), 1);
        let open_spend = funding_tx(b"open", Vec::new());
        for (spend, outpoint, change) in [
            (open_spend.clone(), open, Some(100)),
            (funding_tx(b"done", Vec::new()), resolved, None),
        ] {
            ledger.reserve(outpoint);
            ledger
                .record_submitted(&spend, vec![outpoint], change)
                .await
                .unwrap();
        }

        // Spent elsewhere while the wallet was closed
        ledger.remove_unspent(&resolved).await.unwrap();

        let Ledger {
            unspent,
            transactions,
            pending,
            ..
        } = ledger;
        let mut reopened = Ledger::new(unspent, transactions, pending);
        let restored = reopened.load_pending().await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].transaction().unwrap(), open_spend);

        assert!(reopened.is_reserved(&open));
        assert_eq!(reopened.pending_change(&open_spend.txid()), Some(100));
        assert_eq!(reopened.submitted(), vec![open_spend.txid()]);
        assert_eq!(reopened.pending.len().await, 1);
        assert_eq!(reopened.compute_balance().await.unwrap(), 100);
    }
}
