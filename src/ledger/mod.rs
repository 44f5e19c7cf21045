//! The ledger aggregate: chain, UTXO index, mempool and emission schedule,
//! owned together and mutated only through `&mut self`.

pub mod emission;
pub mod mempool;
pub mod shared;
pub mod validation;

pub use emission::{block_reward, subsidy};
pub use mempool::{Mempool, MempoolEntry};
pub use shared::SharedLedger;
pub use validation::{ValidationReport, validate_chain};

use std::collections::HashSet;

use chrono::Utc;
use log::{debug, info, warn};

use crate::blockchain::{Block, BlockHeader, Blockchain, CancelToken, merkle_root_of};
use crate::config::ChainParams;
use crate::crypto::Hash256;
use crate::error::{LedgerError, Result};
use crate::transaction::{
    OutPoint, SpendableOutput, Transaction, UtxoSet, check_structure, verify_transaction,
};
use crate::wallet::decode_address;

/// Everything needed to seal the next block, captured from one consistent
/// view of the ledger. Mining it needs no access to the ledger.
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    pub index: u64,
    /// Header shell, nonce unset.
    pub header: BlockHeader,
    /// Coinbase first.
    pub transactions: Vec<Transaction>,
    /// Newly minted subsidy paid by the coinbase.
    pub reward: u64,
    pub fees: u64,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    params: ChainParams,
    chain: Blockchain,
    utxos: UtxoSet,
    spent: HashSet<OutPoint>,
    mempool: Mempool,
    minted: u64,
}

impl Ledger {
    /// An empty ledger (no genesis yet).
    pub fn new(params: ChainParams) -> Self {
        Self {
            params,
            chain: Blockchain::new(),
            utxos: UtxoSet::new(),
            spent: HashSet::new(),
            mempool: Mempool::new(),
            minted: 0,
        }
    }

    /// Load a stored chain, rebuilding the UTXO index by replay. The chain is
    /// taken as-is; call [`Ledger::validate_chain`] to judge it.
    pub fn restore(params: ChainParams, blocks: Vec<Block>) -> Self {
        let state = validation::rebuild(&blocks);
        info!(
            "restored {} blocks ({} utxos, minted={})",
            blocks.len(),
            state.utxos.len(),
            state.minted
        );
        Self {
            params,
            chain: Blockchain::from_blocks(blocks),
            utxos: state.utxos,
            spent: state.spent,
            mempool: Mempool::new(),
            minted: state.minted,
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// False until genesis exists.
    pub fn is_active(&self) -> bool {
        !self.chain.is_empty()
    }

    /// Number of blocks in the chain.
    pub fn height(&self) -> u64 {
        self.chain.len() as u64
    }

    pub fn minted(&self) -> u64 {
        self.minted
    }

    pub fn subsidy(&self, height: u64) -> u64 {
        subsidy(&self.params, height)
    }

    pub fn chain(&self) -> &Blockchain {
        &self.chain
    }

    pub fn utxo_set(&self) -> &UtxoSet {
        &self.utxos
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    /* ---------- mutators ---------- */

    /// Mine block 0: a single coinbase paying the initial subsidy to
    /// `miner_address`. Only valid on an empty ledger.
    pub fn create_genesis(&mut self, miner_address: &str) -> Result<Block> {
        self.create_genesis_with(miner_address, &CancelToken::new())
    }

    pub fn create_genesis_with(
        &mut self,
        miner_address: &str,
        cancel: &CancelToken,
    ) -> Result<Block> {
        let template = self.prepare_genesis(miner_address)?;
        let header = template.header.mine(cancel)?;
        self.commit_block(template, header)
    }

    /// Verify `tx` against the UTXO set and the mempool's claims and queue it.
    /// Returns the accepted transaction.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<Transaction> {
        if !self.is_active() {
            return Err(LedgerError::NotInitialized);
        }

        let result = self.check_submission(&tx);
        let fee = match result {
            Ok(fee) => fee,
            Err(e) => {
                warn!("rejected txid={}: {e}", tx.txid);
                return Err(e);
            }
        };

        info!(
            "accepted txid={} fee={} (mempool size {})",
            tx.txid,
            fee,
            self.mempool.len() + 1
        );
        self.mempool.insert(tx.clone(), fee);
        Ok(tx)
    }

    fn check_submission(&self, tx: &Transaction) -> Result<u64> {
        check_structure(tx)?;
        for input in &tx.inputs {
            let op = &input.outpoint;
            let mined_away = !self.utxos.contains(op) && self.spent.contains(op);
            if self.mempool.is_reserved(op) || mined_away {
                return Err(LedgerError::DoubleSpend(*op));
            }
        }
        verify_transaction(tx, &self.utxos)
    }

    /// Drain pending transactions into a new block paying subsidy plus fees
    /// to `miner_address`, mine it and apply it.
    pub fn mine_pending(&mut self, miner_address: &str) -> Result<Block> {
        self.mine_pending_with(miner_address, &CancelToken::new())
    }

    pub fn mine_pending_with(
        &mut self,
        miner_address: &str,
        cancel: &CancelToken,
    ) -> Result<Block> {
        let template = self.prepare_block(miner_address)?;
        let header = template.header.mine(cancel)?;
        self.commit_block(template, header)
    }

    /* ---------- templates ---------- */

    pub fn prepare_genesis(&self, miner_address: &str) -> Result<BlockTemplate> {
        if self.is_active() {
            return Err(LedgerError::GenesisExists);
        }
        self.template(miner_address, &[])
    }

    /// Template for the next block: coinbase plus the oldest
    /// `max_block_transactions` mempool entries.
    pub fn prepare_block(&self, miner_address: &str) -> Result<BlockTemplate> {
        if !self.is_active() {
            return Err(LedgerError::NotInitialized);
        }
        let selected: Vec<_> = self
            .mempool
            .select(self.params.max_block_transactions)
            .iter()
            .map(|e| (e.tx.clone(), e.fee))
            .collect();
        self.template(miner_address, &selected)
    }

    fn template(
        &self,
        miner_address: &str,
        selected: &[(Transaction, u64)],
    ) -> Result<BlockTemplate> {
        decode_address(miner_address)?;

        let index = self.chain.next_index();
        let reward = block_reward(&self.params, index, self.minted);
        let fees: u64 = selected
            .iter()
            .try_fold(0u64, |acc, (_, fee)| acc.checked_add(*fee))
            .ok_or(LedgerError::MalformedTransaction("fees overflow u64"))?;
        let payout = reward
            .checked_add(fees)
            .ok_or(LedgerError::MalformedTransaction("coinbase overflows u64"))?;

        let mut transactions = Vec::with_capacity(1 + selected.len());
        transactions.push(Transaction::coinbase(miner_address.trim(), payout, index));
        transactions.extend(selected.iter().map(|(tx, _)| tx.clone()));

        let header = BlockHeader::assemble(
            self.chain.tip_hash(),
            &transactions,
            Utc::now().timestamp(),
            self.params.difficulty,
        );
        debug!(
            "template height={} txs={} reward={} fees={} diff={}",
            index,
            transactions.len(),
            reward,
            fees,
            self.params.difficulty
        );
        Ok(BlockTemplate {
            index,
            header,
            transactions,
            reward,
            fees,
        })
    }

    /// Apply a template sealed with `header`. Everything is checked before
    /// anything changes: either the block is appended and the UTXO set and
    /// mempool updated together, or nothing happens.
    pub fn commit_block(&mut self, template: BlockTemplate, header: BlockHeader) -> Result<Block> {
        let index = template.index;
        if !template.transactions.first().is_some_and(Transaction::is_coinbase) {
            return Err(LedgerError::InvalidCoinbase { block: index });
        }
        if index != self.chain.next_index() || header.previous_hash != self.chain.tip_hash() {
            return Err(LedgerError::StaleTemplate);
        }
        if header.merkle_root != merkle_root_of(&template.transactions) {
            return Err(LedgerError::MerkleMismatch { block: index });
        }
        if header.difficulty != self.params.difficulty || !header.meets_target() {
            return Err(LedgerError::InvalidProofOfWork { block: index });
        }

        let drained: HashSet<Hash256> =
            template.transactions[1..].iter().map(|tx| tx.txid).collect();
        if drained.iter().any(|txid| !self.mempool.contains(txid)) {
            return Err(LedgerError::StaleTemplate);
        }
        for tx in &template.transactions[1..] {
            if let Some(input) = tx.inputs.iter().find(|i| !self.utxos.contains(&i.outpoint)) {
                return Err(LedgerError::UnknownOutput(input.outpoint));
            }
        }
        if self.minted as u128 + template.reward as u128 > self.params.max_supply as u128 {
            return Err(LedgerError::SupplyExceeded { block: index });
        }

        // No failure paths past this point.
        let block = Block::new(index, header, template.transactions);
        for tx in &block.transactions[1..] {
            validation::apply_spend(tx, &mut self.utxos, &mut self.spent);
        }
        self.utxos.add_tx_outputs(&block.transactions[0]);
        let removed = self.mempool.remove(&drained);
        self.minted += template.reward;
        self.chain.push(block.clone());

        info!(
            "sealed block #{} hash={} nonce={} txs={} (mempool -{}, utxos {})",
            block.index,
            block.hash,
            block.header.nonce,
            block.transactions.len(),
            removed,
            self.utxos.len()
        );
        Ok(block)
    }

    /* ---------- queries ---------- */

    /// Sum of every unspent output paying `address`.
    pub fn get_balance(&self, address: &str) -> u128 {
        self.utxos.balance_of(address.trim())
    }

    /// Unspent outputs paying `address`, in outpoint order.
    pub fn get_utxos(&self, address: &str) -> Vec<SpendableOutput> {
        self.utxos.owned_by(address.trim()).collect()
    }

    /// [`Ledger::get_utxos`] minus outputs already claimed by the mempool.
    pub fn spendable_utxos(&self, address: &str) -> Vec<SpendableOutput> {
        self.utxos
            .owned_by(address.trim())
            .filter(|s| !self.mempool.is_reserved(&s.outpoint))
            .collect()
    }

    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.chain.blocks().to_vec()
    }

    pub fn mempool_snapshot(&self) -> Vec<Transaction> {
        self.mempool.transactions().cloned().collect()
    }

    /// Replay the whole chain from genesis. See [`validate_chain`].
    pub fn validate_chain(&self) -> Result<ValidationReport> {
        validate_chain(self.chain.blocks(), &self.params)
    }
}
