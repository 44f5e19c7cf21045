use std::time::Instant;

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::merkle::merkle_root_of;
use super::pow::{CancelToken, meets_difficulty};
use crate::crypto::Hash256;
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// Attempts between mining progress log lines.
const PROGRESS_EVERY: u64 = 1_000_000;

/// The hashed part of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub previous_hash: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: i64, // Unix timestamp (UTC)
    pub difficulty: u32,
    pub nonce: u64, // Proof-of-Work nonce
}

impl BlockHeader {
    /// Header shell over `transactions` (coinbase first), nonce unset.
    pub fn assemble(
        previous_hash: Hash256,
        transactions: &[Transaction],
        timestamp: i64,
        difficulty: u32,
    ) -> Self {
        Self {
            previous_hash,
            merkle_root: merkle_root_of(transactions),
            timestamp,
            difficulty,
            nonce: 0,
        }
    }

    /// Fixed 84-byte layout: previous hash, merkle root, timestamp, difficulty,
    /// nonce. Integers little-endian.
    pub fn serialize(&self) -> [u8; 84] {
        let mut buf = [0u8; 84];
        buf[0..32].copy_from_slice(self.previous_hash.as_bytes());
        buf[32..64].copy_from_slice(self.merkle_root.as_bytes());
        buf[64..72].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[72..76].copy_from_slice(&self.difficulty.to_le_bytes());
        buf[76..84].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    /// Double-SHA-256 of the serialized header.
    pub fn hash(&self) -> Hash256 {
        Hash256::digest(&self.serialize())
    }

    pub fn meets_target(&self) -> bool {
        meets_difficulty(&self.hash(), self.difficulty)
    }

    /// Proof-of-work: try nonce = 0, 1, 2, … until the header hash has
    /// `difficulty` leading zero nibbles. `cancel` is polled before every
    /// attempt; a cancelled search returns `MiningCancelled` and produces
    /// nothing.
    pub fn mine(mut self, cancel: &CancelToken) -> Result<Self> {
        let started = Instant::now();
        let mut attempts: u64 = 0;

        for nonce in 0..=u64::MAX {
            if cancel.is_cancelled() {
                debug!("mining cancelled after {attempts} attempts");
                return Err(LedgerError::MiningCancelled);
            }
            self.nonce = nonce;
            attempts += 1;
            if self.meets_target() {
                let secs = started.elapsed().as_secs_f64();
                let rate = if secs > 0.0 { attempts as f64 / secs } else { 0.0 };
                info!(
                    "mined hash={} nonce={} attempts={} time={:.2}s rate={:.0} H/s",
                    self.hash(),
                    nonce,
                    attempts,
                    secs,
                    rate
                );
                return Ok(self);
            }
            if attempts % PROGRESS_EVERY == 0 {
                debug!("mining: {attempts} attempts, difficulty {}", self.difficulty);
            }
        }
        Err(LedgerError::NonceSpaceExhausted)
    }
}

/// A single block in the blockchain holding a list of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Height in the chain; genesis is 0.
    pub index: u64,
    pub header: BlockHeader,
    pub hash: Hash256, // Cached hash of the header
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(index: u64, header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            hash: header.hash(),
            header,
            transactions,
        }
    }

    /// Assemble and mine in one step, stamping the current time.
    pub fn mine_new(
        index: u64,
        previous_hash: Hash256,
        transactions: Vec<Transaction>,
        difficulty: u32,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let shell = BlockHeader::assemble(
            previous_hash,
            &transactions,
            Utc::now().timestamp(),
            difficulty,
        );
        let header = shell.mine(cancel)?;
        Ok(Self::new(index, header, transactions))
    }

    pub fn compute_hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first().filter(|tx| tx.is_coinbase())
    }

    /// Validate that the cached `hash` matches the header and satisfies its
    /// difficulty. (Does NOT validate chain linkage or transactions.)
    pub fn is_valid(&self) -> bool {
        let expected = self.compute_hash();
        self.hash == expected && meets_difficulty(&expected, self.header.difficulty)
    }

    pub fn merkle_matches(&self) -> bool {
        merkle_root_of(&self.transactions) == self.header.merkle_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{OutPoint, TxInput, TxOutput};

    fn txs() -> Vec<Transaction> {
        vec![
            Transaction::coinbase("miner", 50, 1),
            Transaction::new(
                vec![TxInput::new(OutPoint::new(Hash256::digest(b"demo-txid"), 0))],
                vec![TxOutput {
                    address: "addr".into(),
                    amount: 1,
                }],
            ),
        ]
    }

    #[test]
    fn mining_produces_leading_zeros() {
        let prev = Hash256::digest(b"prev");
        let b = Block::mine_new(1, prev, txs(), 2, &CancelToken::new()).unwrap();
        assert!(b.hash.to_hex().starts_with("00"));
        assert!(b.is_valid());
        assert!(b.merkle_matches());
    }

    #[test]
    fn nonce_search_starts_at_zero() {
        let shell = BlockHeader::assemble(Hash256::ZERO, &txs(), 1_700_000_000, 0);
        let mined = shell.mine(&CancelToken::new()).unwrap();
        assert_eq!(mined.nonce, 0);
    }

    #[test]
    fn cancelled_search_yields_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let shell = BlockHeader::assemble(Hash256::ZERO, &txs(), 1_700_000_000, 64);
        assert_eq!(shell.mine(&cancel), Err(LedgerError::MiningCancelled));
    }

    #[test]
    fn invalid_when_mutated() {
        let prev = Hash256::digest(b"prev");
        let mut b = Block::mine_new(2, prev, txs(), 2, &CancelToken::new()).unwrap();
        let old_hash = b.hash;

        // Tamper with a transaction: header still commits to the old root.
        b.transactions[1].outputs[0].amount = 1_000;
        assert!(!b.merkle_matches());
        assert_eq!(old_hash, b.compute_hash());

        // Tamper with the header: cached hash no longer matches.
        b.header.timestamp += 1;
        assert_ne!(old_hash, b.compute_hash());
        assert!(!b.is_valid());
    }

    #[test]
    fn header_layout_is_fixed() {
        let h = BlockHeader::assemble(Hash256::ZERO, &txs(), 1, 3);
        let bytes = h.serialize();
        assert_eq!(&bytes[0..32], &[0u8; 32]);
        assert_eq!(&bytes[32..64], h.merkle_root.as_bytes());
        assert_eq!(&bytes[64..72], &1i64.to_le_bytes());
        assert_eq!(&bytes[72..76], &3u32.to_le_bytes());
    }
}
