//! Address index
//!
//! Maps the wallet's derived public keys to their derivation position and
//! their 20-byte hashes back to the key. The index is rebuilt from the seed
//! on every start; it never holds funds or private keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::crypto::{hash160, ChainBranch};
use crate::network::ScriptKind;

/// Compressed public key bytes
pub type PublicKeyBytes = [u8; 33];

/// Where a public key sits in the derivation tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub index: u32,
    pub branch: ChainBranch,
    pub used: bool,
}

/// Reverse mapping from a public key hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubkeyHashRecord {
    pub public_key: PublicKeyBytes,
    pub index: u32,
    pub branch: ChainBranch,
}

#[derive(Debug, Default, Clone)]
pub struct AddressIndex {
    keys: HashMap<PublicKeyBytes, KeyRecord>,
    hashes: HashMap<[u8; 20], PubkeyHashRecord>,
    positions: BTreeMap<(ChainBranch, u32), PublicKeyBytes>,
}

impl AddressIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a derived key and return its hash.
    ///
    /// Registering the same key again keeps its `used` flag.
    pub fn register_key(
        &mut self,
        index: u32,
        public_key: PublicKeyBytes,
        branch: ChainBranch,
    ) -> [u8; 20] {
        let hash = hash160(&public_key);
        let used = match self.keys.get(&public_key) {
            Some(existing) => {
                self.positions.remove(&(existing.branch, existing.index));
                existing.used
            }
            None => false,
        };

        self.keys.insert(public_key, KeyRecord { index, branch, used });
        self.hashes.insert(
            hash,
            PubkeyHashRecord {
                public_key,
                index,
                branch,
            },
        );
        self.positions.insert((branch, index), public_key);
        hash
    }

    /// Number of keys registered on `branch`, i.e. the next index to derive
    pub fn next_index(&self, branch: ChainBranch) -> u32 {
        self.branch_keys(branch).count() as u32
    }

    /// Hash of the wallet key an output pays, or `None` if it is not ours
    pub fn classify_output(&self, script: &[u8]) -> Option<[u8; 20]> {
        let Some(hash) = ScriptKind::classify(script).owner_hash() else {
            log::debug!("Unclassified output script ({} bytes)", script.len());
            return None;
        };
        if self.hashes.contains_key(&hash) {
            Some(hash)
        } else {
            log::debug!("Output pays {} which is not ours", hex::encode(hash));
            None
        }
    }

    pub fn lookup(&self, hash: &[u8; 20]) -> Option<&PubkeyHashRecord> {
        self.hashes.get(hash)
    }

    pub fn key_record(&self, public_key: &PublicKeyBytes) -> Option<&KeyRecord> {
        self.keys.get(public_key)
    }

    /// Flag the key behind `hash` as having received funds
    pub fn mark_used(&mut self, hash: &[u8; 20]) -> bool {
        let Some(record) = self.hashes.get(hash) else {
            return false;
        };
        match self.keys.get_mut(&record.public_key) {
            Some(key) => {
                key.used = true;
                true
            }
            None => false,
        }
    }

    /// Lowest-index key on `branch` that has not been used
    pub fn first_unused(&self, branch: ChainBranch) -> Option<(u32, PublicKeyBytes)> {
        self.branch_keys(branch)
            .find(|(_, key)| self.keys.get(*key).is_some_and(|record| !record.used))
            .map(|(index, key)| (index, *key))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn branch_keys(&self, branch: ChainBranch) -> impl Iterator<Item = (u32, &PublicKeyBytes)> {
        self.positions
            .range((branch, 0)..=(branch, u32::MAX))
            .map(|((_, index), key)| (*index, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{p2pkh_script, p2sh_script};

    fn key(byte: u8) -> PublicKeyBytes {
        let mut key = [byte; 33];
        key[0] = 0x02;
        key
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut index = AddressIndex::new();
        let first = index.register_key(0, key(1), ChainBranch::External);
        let second = index.register_key(0, key(1), ChainBranch::External);

        assert_eq!(first, second);
        assert_eq!(index.len(), 1);
        assert_eq!(index.next_index(ChainBranch::External), 1);
        assert_eq!(index.next_index(ChainBranch::Internal), 0);
    }

    #[test]
    fn test_reregister_keeps_used_flag() {
        let mut index = AddressIndex::new();
        let hash = index.register_key(0, key(1), ChainBranch::External);
        assert!(index.mark_used(&hash));

        index.register_key(0, key(1), ChainBranch::External);
        assert!(index.key_record(&key(1)).unwrap().used);
    }

    #[test]
    fn test_classify_output() {
        let mut index = AddressIndex::new();
        let hash = index.register_key(3, key(9), ChainBranch::Internal);

        assert_eq!(index.classify_output(&p2pkh_script(&hash)), Some(hash));
        assert_eq!(index.classify_output(&p2pkh_script(&[0u8; 20])), None);
        assert_eq!(index.classify_output(&[0x6a, 0x01, 0x00]), None);
        assert_eq!(index.classify_output(&[]), None);

        let record = index.lookup(&hash).unwrap();
        assert_eq!(record.index, 3);
        assert_eq!(record.branch, ChainBranch::Internal);
        assert_eq!(record.public_key, key(9));
    }

    #[test]
    fn test_classify_pay_to_pubkey() {
        let mut index = AddressIndex::new();
        let hash = index.register_key(0, key(4), ChainBranch::External);

        let mut script = vec![0x21];
        script.extend_from_slice(&key(4));
        script.push(0xac);
        assert_eq!(index.classify_output(&script), Some(hash));
    }

    #[test]
    fn test_script_hash_lookup_uses_hash_table() {
        let mut index = AddressIndex::new();
        let hash = index.register_key(0, key(5), ChainBranch::External);
        assert_eq!(index.classify_output(&p2sh_script(&hash)), Some(hash));
        assert_eq!(index.classify_output(&p2sh_script(&[1u8; 20])), None);
    }

    #[test]
    fn test_first_unused() {
        let mut index = AddressIndex::new();
        let h0 = index.register_key(0, key(1), ChainBranch::Internal);
        index.register_key(1, key(2), ChainBranch::Internal);
        index.register_key(0, key(3), ChainBranch::External);

        assert_eq!(index.first_unused(ChainBranch::Internal), Some((0, key(1))));
        index.mark_used(&h0);
        assert_eq!(index.first_unused(ChainBranch::Internal), Some((1, key(2))));
        assert_eq!(index.first_unused(ChainBranch::External), Some((0, key(3))));
    }

    #[test]
    fn test_mark_unknown_hash() {
        let mut index = AddressIndex::new();
        assert!(!index.mark_used(&[0u8; 20]));
        assert!(index.is_empty());
    }
}
