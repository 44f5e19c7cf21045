//! JSON files for the chain and for wallets.
//!
//! A chain file holds the parameters, every block and the pending
//! transactions. Loading replays the blocks to rebuild the UTXO index and
//! re-submits the pending transactions, dropping any that no longer verify.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::Block;
use crate::config::ChainParams;
use crate::crypto::EncodingError;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::transaction::Transaction;
use crate::wallet::{Wallet, WalletRecord};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("invalid wallet record: {0}")]
    Wallet(#[from] EncodingError),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// On-disk shape of a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainFile {
    pub params: ChainParams,
    pub chain: Vec<Block>,
    #[serde(default)]
    pub pending: Vec<Transaction>,
}

impl ChainFile {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        Self {
            params: *ledger.params(),
            chain: ledger.chain_snapshot(),
            pending: ledger.mempool_snapshot(),
        }
    }

    /// Write this snapshot to `path`. Needs no access to the ledger it came
    /// from.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_json(path, self)?;
        info!(
            "saved {} blocks ({} pending) to {}",
            self.chain.len(),
            self.pending.len(),
            path.display()
        );
        Ok(())
    }

    /// Rebuild a ledger. The chain itself is not judged here; see
    /// [`Ledger::validate_chain`].
    pub fn into_ledger(self) -> Ledger {
        let mut ledger = Ledger::restore(self.params, self.chain);
        for tx in self.pending {
            let txid = tx.txid;
            if let Err(e) = ledger.submit_transaction(tx) {
                warn!("dropping pending tx {txid}: {e}");
            }
        }
        ledger
    }
}

/// Write `contents` beside `path` first, then move it into place, so a crash
/// never leaves a half-written file.
fn write_json<T: Serialize>(path: &Path, contents: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(contents)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn save_chain(path: impl AsRef<Path>, ledger: &Ledger) -> Result<()> {
    ChainFile::from_ledger(ledger).save(path)
}

pub fn load_chain(path: impl AsRef<Path>) -> Result<Ledger> {
    let path = path.as_ref();
    let file: ChainFile = serde_json::from_slice(&fs::read(path)?)?;
    info!("loading {} blocks from {}", file.chain.len(), path.display());
    Ok(file.into_ledger())
}

pub fn save_wallet(path: impl AsRef<Path>, wallet: &Wallet) -> Result<()> {
    write_json(path.as_ref(), &wallet.to_record())
}

/// Load a wallet, re-deriving its public key and address from the private
/// key and rejecting a record whose stored address disagrees.
pub fn load_wallet(path: impl AsRef<Path>) -> Result<Wallet> {
    let record: WalletRecord = serde_json::from_slice(&fs::read(path)?)?;
    Ok(Wallet::from_record(&record)?)
}

/// Save named wallets as one JSON object keyed by name.
pub fn save_wallets(path: impl AsRef<Path>, wallets: &BTreeMap<String, Wallet>) -> Result<()> {
    let records: BTreeMap<&str, WalletRecord> = wallets
        .iter()
        .map(|(name, w)| (name.as_str(), w.to_record()))
        .collect();
    write_json(path.as_ref(), &records)
}

pub fn load_wallets(path: impl AsRef<Path>) -> Result<BTreeMap<String, Wallet>> {
    let records: BTreeMap<String, WalletRecord> = serde_json::from_slice(&fs::read(path)?)?;
    records
        .into_iter()
        .map(|(name, record)| Ok((name, Wallet::from_record(&record)?)))
        .collect()
}
