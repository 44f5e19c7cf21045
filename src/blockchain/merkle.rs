use crate::crypto::{Hash256, double_sha256};
use crate::transaction::Transaction;

/// Root of the binary hash tree over `txids`, built bottom-up. Each parent is
/// double-SHA-256 of `left ‖ right`; an odd last node is paired with itself.
/// A single leaf is its own root. Callers never pass an empty list (a block
/// always carries its coinbase); for one, the zero hash is returned.
pub fn merkle_root(txids: &[Hash256]) -> Hash256 {
    if txids.is_empty() {
        return Hash256::ZERO;
    }

    let mut level: Vec<Hash256> = txids.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut concat = [0u8; 64];
                concat[..32].copy_from_slice(left.as_bytes());
                concat[32..].copy_from_slice(right.as_bytes());
                Hash256(double_sha256(&concat))
            })
            .collect();
    }
    level[0]
}

/// Merkle root over freshly recomputed txids, so a tampered transaction
/// body changes the root even if its stored `txid` field was left alone.
pub fn merkle_root_of(transactions: &[Transaction]) -> Hash256 {
    let txids: Vec<Hash256> = transactions.iter().map(Transaction::compute_txid).collect();
    merkle_root(&txids)
}
