use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::model::{Transaction, TxOutput};
use crate::crypto::Hash256;

/// Identifies a specific transaction output by its txid and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// An unspent output together with where it lives; the unit coin selection
/// works over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendableOutput {
    pub outpoint: OutPoint,
    pub output: TxOutput,
}

/// Read access to "what does this outpoint pay, if it is unspent".
pub trait UtxoLookup {
    fn lookup(&self, outpoint: &OutPoint) -> Option<&TxOutput>;
}

impl UtxoLookup for HashMap<OutPoint, TxOutput> {
    fn lookup(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.get(outpoint)
    }
}

impl UtxoLookup for BTreeMap<OutPoint, TxOutput> {
    fn lookup(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.get(outpoint)
    }
}

/// Spendable outputs keyed by (txid, vout). Ordered so that iteration, and
/// therefore coin selection over it, is reproducible.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UtxoSet {
    map: BTreeMap<OutPoint, TxOutput>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, outpoint: OutPoint, output: TxOutput) {
        self.map.insert(outpoint, output);
    }

    /// Spend (remove) a single outpoint. Returns the removed output if it existed.
    pub fn spend(&mut self, outpoint: &OutPoint) -> Option<TxOutput> {
        self.map.remove(outpoint)
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.map.get(outpoint)
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.map.contains_key(outpoint)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &TxOutput)> {
        self.map.iter()
    }

    /// Sum of every unspent amount.
    pub fn total(&self) -> u128 {
        self.map.values().map(|o| o.amount as u128).sum()
    }

    /// Outputs owned by `address`, in outpoint order.
    pub fn owned_by<'a>(&'a self, address: &'a str) -> impl Iterator<Item = SpendableOutput> + 'a {
        self.map
            .iter()
            .filter(move |(_, out)| out.address == address)
            .map(|(op, out)| SpendableOutput {
                outpoint: *op,
                output: out.clone(),
            })
    }

    pub fn balance_of(&self, address: &str) -> u128 {
        self.map
            .values()
            .filter(|o| o.address == address)
            .map(|o| o.amount as u128)
            .sum()
    }

    /// Add the outputs of a tx (used when applying a mined block). A
    /// zero-amount output, which only a fee-less coinbase after supply
    /// saturation can carry, is not indexed.
    pub fn add_tx_outputs(&mut self, tx: &Transaction) {
        for (i, out) in tx.outputs.iter().enumerate() {
            if out.amount > 0 {
                self.insert(OutPoint::new(tx.txid, i as u32), out.clone());
            }
        }
    }
}

impl UtxoLookup for UtxoSet {
    fn lookup(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.get(outpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(address: &str, amount: u64) -> TxOutput {
        TxOutput {
            address: address.into(),
            amount,
        }
    }

    #[test]
    fn spend_removes_exactly_once() {
        let mut set = UtxoSet::new();
        let op = OutPoint::new(Hash256::digest(b"a"), 0);
        set.insert(op, out("alice", 5));
        assert_eq!(set.spend(&op), Some(out("alice", 5)));
        assert_eq!(set.spend(&op), None);
        assert!(set.is_empty());
    }

    #[test]
    fn balance_and_ownership_filter_by_address() {
        let mut set = UtxoSet::new();
        let tx = Transaction::new(vec![], vec![out("alice", 3), out("bob", 4), out("alice", 5)]);
        set.add_tx_outputs(&tx);
        assert_eq!(set.balance_of("alice"), 8);
        assert_eq!(set.balance_of("carol"), 0);
        assert_eq!(set.total(), 12);
        let alice: Vec<_> = set.owned_by("alice").map(|s| s.outpoint.vout).collect();
        assert_eq!(alice, vec![0, 2]);
    }

    #[test]
    fn zero_value_outputs_are_not_indexed() {
        let mut set = UtxoSet::new();
        let coinbase = Transaction::coinbase("miner", 0, 9);
        set.add_tx_outputs(&coinbase);
        assert!(set.is_empty());
        assert_eq!(set.owned_by("miner").count(), 0);
    }

    #[test]
    fn outpoint_displays_as_txid_colon_index() {
        let op = OutPoint::new(Hash256::ZERO, 7);
        assert_eq!(op.to_string(), format!("{}:7", "0".repeat(64)));
    }
}
