use serde::{Deserialize, Serialize};

use super::Block;
use crate::crypto::Hash256;

/// Append-only, ordered sequence of blocks. Index 0 is genesis.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Blockchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-ordered list of blocks (e.g. read from disk). No
    /// validation happens here.
    pub fn from_blocks(chain: Vec<Block>) -> Self {
        Self { chain }
    }

    /// Return the last block in the chain, if any.
    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Hash the next block must link to: the tip's hash, or the zero
    /// sentinel before genesis.
    pub fn tip_hash(&self) -> Hash256 {
        self.last_block().map_or(Hash256::ZERO, |b| b.hash)
    }

    /// Height the next block will have.
    pub fn next_index(&self) -> u64 {
        self.chain.len() as u64
    }

    pub(crate) fn push(&mut self, block: Block) {
        self.chain.push(block);
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.chain.iter()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::CancelToken;
    use crate::transaction::Transaction;

    #[test]
    fn empty_chain_links_to_zero_sentinel() {
        let bc = Blockchain::new();
        assert!(bc.is_empty());
        assert_eq!(bc.tip_hash(), Hash256::ZERO);
        assert_eq!(bc.next_index(), 0);
    }

    #[test]
    fn tip_follows_pushes() {
        let mut bc = Blockchain::new();
        let genesis = Block::mine_new(
            0,
            bc.tip_hash(),
            vec![Transaction::coinbase("m", 1, 0)],
            1,
            &CancelToken::new(),
        )
        .unwrap();
        let hash = genesis.hash;
        bc.push(genesis);
        assert_eq!(bc.tip_hash(), hash);
        assert_eq!(bc.next_index(), 1);
        assert_eq!(bc.last_block().map(|b| b.index), Some(0));
    }
}
