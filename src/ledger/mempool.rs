use std::collections::{HashMap, HashSet};

use crate::crypto::Hash256;
use crate::transaction::{OutPoint, Transaction};

/// A verified transaction waiting for a block, with the fee it pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolEntry {
    pub tx: Transaction,
    pub fee: u64,
}

/// Pending transactions in arrival order, plus the outpoints they claim.
/// Every claimed outpoint is claimed exactly once.
#[derive(Debug, Default, Clone)]
pub struct Mempool {
    entries: Vec<MempoolEntry>,
    reserved: HashMap<OutPoint, Hash256>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Txid of the pending transaction spending `outpoint`, if any.
    pub fn reserved_by(&self, outpoint: &OutPoint) -> Option<Hash256> {
        self.reserved.get(outpoint).copied()
    }

    pub fn is_reserved(&self, outpoint: &OutPoint) -> bool {
        self.reserved.contains_key(outpoint)
    }

    pub fn contains(&self, txid: &Hash256) -> bool {
        self.entries.iter().any(|e| e.tx.txid == *txid)
    }

    /// Caller has already checked none of the inputs are reserved.
    pub(crate) fn insert(&mut self, tx: Transaction, fee: u64) {
        for input in &tx.inputs {
            self.reserved.insert(input.outpoint, tx.txid);
        }
        self.entries.push(MempoolEntry { tx, fee });
    }

    /// The oldest `max` entries.
    pub fn select(&self, max: usize) -> &[MempoolEntry] {
        &self.entries[..self.entries.len().min(max)]
    }

    /// Drop the given transactions and release their outpoints. Returns how
    /// many were removed.
    pub(crate) fn remove(&mut self, txids: &HashSet<Hash256>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !txids.contains(&e.tx.txid));
        self.reserved.retain(|_, owner| !txids.contains(owner));
        before - self.entries.len()
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter().map(|e| &e.tx)
    }

    pub fn total_fees(&self) -> u128 {
        self.entries.iter().map(|e| e.fee as u128).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
