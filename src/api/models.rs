use std::path::PathBuf;

use actix_web::{HttpResponse, web};
use log::warn;
use serde::{Deserialize, Serialize};

use utxo_ledger::blockchain::Block;
use utxo_ledger::error::LedgerError;
use utxo_ledger::ledger::SharedLedger;
use utxo_ledger::persistence::ChainFile;
use utxo_ledger::transaction::{SpendableOutput, Transaction};

/// Shared application state: one ledger handle plus where to keep it on disk.
#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    pub chain_file: Option<PathBuf>,
}

impl AppState {
    pub fn new(ledger: SharedLedger, chain_file: Option<PathBuf>) -> Self {
        Self { ledger, chain_file }
    }

    /// Write the chain file after a successful mutation. The snapshot is
    /// taken under the read lock; the file is written on the blocking pool
    /// after the lock is released. Failures are logged; the in-memory ledger
    /// stays authoritative.
    pub async fn persist(&self) {
        let Some(path) = self.chain_file.clone() else {
            return;
        };
        let ledger = self.ledger.clone();
        let outcome = web::block(move || {
            let snapshot = ChainFile::from_ledger(&ledger.read());
            snapshot.save(&path).map_err(|e| (path, e))
        })
        .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err((path, e))) => warn!("could not save chain to {}: {e}", path.display()),
            Err(e) => warn!("chain save task failed: {e}"),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Every refused ledger operation is a client error.
pub fn bad_request(err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: err.to_string(),
    })
}

pub fn ledger_error(err: LedgerError) -> HttpResponse {
    warn!("request refused: {err}");
    bad_request(err)
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub miner_address: String,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub mined_index: u64,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub transactions: usize,
    pub reward: String,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub transaction: Transaction,
}

#[derive(Deserialize)]
pub struct SendRequest {
    /// Hex or WIF.
    pub private_key: String,
    pub recipient: String,
    pub amount: u64,
    #[serde(default)]
    pub fee: u64,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub txid: String,
}

#[derive(Serialize)]
pub struct MempoolResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

/* ---------- Address API Models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: u128,
    pub balance_coins: String,
    pub utxos: usize,
}

#[derive(Serialize)]
pub struct UtxosResponse {
    pub address: String,
    pub utxos: Vec<SpendableOutput>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: u64,
    pub difficulty: u32,
    pub minted: u64,
    pub minted_coins: String,
    pub next_subsidy: u64,
    pub halving_interval: u64,
    pub max_supply: u64,
    pub mempool_size: usize,
    pub utxo_size: usize,
}
