use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use super::emission::block_reward;
use crate::blockchain::{Block, meets_difficulty};
use crate::config::ChainParams;
use crate::crypto::Hash256;
use crate::error::{LedgerError, Result};
use crate::transaction::{OutPoint, Transaction, UtxoSet, verify_transaction};
use crate::wallet::decode_address;

/// Summary of a chain that replayed cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Number of blocks checked.
    pub blocks: u64,
    /// Cumulative subsidy minted.
    pub minted: u64,
    pub utxo_count: usize,
    pub utxo_total: u128,
}

/// UTXO state produced by applying blocks in order.
#[derive(Debug, Default)]
pub(crate) struct ReplayState {
    pub utxos: UtxoSet,
    pub spent: HashSet<OutPoint>,
    pub minted: u64,
}

/// Re-check every block from genesis against a UTXO set rebuilt from
/// scratch, never trusting live ledger state. Stops at the first violation.
///
/// Per block, in order: index and previous-hash linkage
/// (`ChainDiscontinuity`), txids and Merkle root (`MerkleMismatch`), cached
/// hash and proof of work (`InvalidProofOfWork`), coinbase placement
/// (`InvalidCoinbase`), the coinbase payee and each transaction
/// (`BlockTransaction`), then the coinbase amount (`SupplyExceeded`,
/// `CoinbaseMismatch`).
pub fn validate_chain(blocks: &[Block], params: &ChainParams) -> Result<ValidationReport> {
    let mut state = ReplayState::default();
    let mut prev_hash = Hash256::ZERO;

    for (pos, block) in blocks.iter().enumerate() {
        let index = pos as u64;
        prev_hash = check_block(block, index, prev_hash, params, &mut state).inspect_err(|e| {
            warn!("chain invalid: {e}");
        })?;
    }

    let report = ValidationReport {
        blocks: blocks.len() as u64,
        minted: state.minted,
        utxo_count: state.utxos.len(),
        utxo_total: state.utxos.total(),
    };
    info!(
        "chain valid: {} blocks, minted={}, utxos={}",
        report.blocks, report.minted, report.utxo_count
    );
    Ok(report)
}

/// Validate one block on top of `state`, applying it on success. Returns the
/// block's recomputed hash.
fn check_block(
    block: &Block,
    index: u64,
    prev_hash: Hash256,
    params: &ChainParams,
    state: &mut ReplayState,
) -> Result<Hash256> {
    if block.index != index || block.header.previous_hash != prev_hash {
        return Err(LedgerError::ChainDiscontinuity { block: index });
    }

    let txids_intact = block.transactions.iter().all(|tx| tx.txid == tx.compute_txid());
    if !txids_intact || !block.merkle_matches() {
        return Err(LedgerError::MerkleMismatch { block: index });
    }

    let hash = block.compute_hash();
    if block.hash != hash
        || block.header.difficulty != params.difficulty
        || !meets_difficulty(&hash, params.difficulty)
    {
        return Err(LedgerError::InvalidProofOfWork { block: index });
    }

    let (coinbase, rest) = split_coinbase(block, index)?;
    for output in &coinbase.outputs {
        decode_address(&output.address).map_err(|e| LedgerError::BlockTransaction {
            block: index,
            tx: 0,
            source: Box::new(e.into()),
        })?;
    }

    let mut fees: u128 = 0;
    for (i, tx) in rest.iter().enumerate() {
        let located = |source: LedgerError| LedgerError::BlockTransaction {
            block: index,
            tx: i + 1,
            source: Box::new(source),
        };
        if let Some(input) = tx.inputs.iter().find(|inp| state.spent.contains(&inp.outpoint)) {
            return Err(located(LedgerError::DoubleSpend(input.outpoint)));
        }
        let fee = verify_transaction(tx, &state.utxos).map_err(located)?;
        apply_spend(tx, &mut state.utxos, &mut state.spent);
        fees += fee as u128;
    }

    let reward = block_reward(params, index, state.minted);
    let paid = coinbase.total_output_amount();
    let expected = reward as u128 + fees;
    let Some(new_coins) = paid.checked_sub(fees) else {
        return Err(LedgerError::CoinbaseMismatch {
            block: index,
            expected,
            actual: paid,
        });
    };
    if state.minted as u128 + new_coins > params.max_supply as u128 {
        return Err(LedgerError::SupplyExceeded { block: index });
    }
    if paid != expected {
        return Err(LedgerError::CoinbaseMismatch {
            block: index,
            expected,
            actual: paid,
        });
    }

    state.minted += reward;
    state.utxos.add_tx_outputs(coinbase);
    debug!("block {index} ok: {} txs, fees={fees}", block.transactions.len());
    Ok(hash)
}

/// First transaction must be the block's coinbase (no inputs, committing to
/// this height); no other transaction may be one.
fn split_coinbase(block: &Block, index: u64) -> Result<(&Transaction, &[Transaction])> {
    match block.transactions.split_first() {
        Some((coinbase, rest))
            if coinbase.is_coinbase()
                && coinbase.coinbase_height == Some(index)
                && rest.iter().all(|tx| !tx.is_coinbase()) =>
        {
            Ok((coinbase, rest))
        }
        _ => Err(LedgerError::InvalidCoinbase { block: index }),
    }
}

/// Remove `tx`'s inputs from `utxos` (remembering them as spent) and add its
/// outputs.
pub(crate) fn apply_spend(tx: &Transaction, utxos: &mut UtxoSet, spent: &mut HashSet<OutPoint>) {
    for input in &tx.inputs {
        utxos.spend(&input.outpoint);
        spent.insert(input.outpoint);
    }
    utxos.add_tx_outputs(tx);
}

/// Rebuild UTXO state from blocks without checking anything. Used to load a
/// stored chain; [`validate_chain`] is what decides whether it is sound.
pub(crate) fn rebuild(blocks: &[Block]) -> ReplayState {
    let mut state = ReplayState::default();
    for block in blocks {
        let mut fees: u128 = 0;
        for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase()) {
            let inputs: u128 = tx
                .inputs
                .iter()
                .filter_map(|i| state.utxos.get(&i.outpoint))
                .map(|o| o.amount as u128)
                .sum();
            fees += inputs.saturating_sub(tx.total_output_amount());
            apply_spend(tx, &mut state.utxos, &mut state.spent);
        }
        if let Some(coinbase) = block.coinbase() {
            let new_coins = coinbase.total_output_amount().saturating_sub(fees);
            state.minted = state
                .minted
                .saturating_add(u64::try_from(new_coins).unwrap_or(u64::MAX));
            state.utxos.add_tx_outputs(coinbase);
        }
    }
    state
}
