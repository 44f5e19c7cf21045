use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::models::{
    AppState, ChainResponse, MineRequest, MineResponse, ValidateResponse, ledger_error,
};
use utxo_ledger::blockchain::{Block, format_coins};
use utxo_ledger::error::Result;
use utxo_ledger::ledger::SharedLedger;

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.read();
    HttpResponse::Ok().json(ChainResponse {
        length: ledger.chain().len(),
        difficulty: ledger.params().difficulty,
        chain: ledger.chain_snapshot(),
    })
}

/// Replay the whole chain from genesis.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let length = state.ledger.height();
    let resp = match state.ledger.validate_chain() {
        Ok(report) => ValidateResponse {
            valid: true,
            length,
            minted: Some(report.minted),
            error: None,
        },
        Err(e) => ValidateResponse {
            valid: false,
            length,
            minted: None,
            error: Some(e.to_string()),
        },
    };
    HttpResponse::Ok().json(resp)
}

/// Mine block 0 paying the initial subsidy to `miner_address`.
#[post("/genesis/")]
pub async fn create_genesis(
    state: web::Data<AppState>,
    req: web::Json<MineRequest>,
) -> impl Responder {
    let miner = req.into_inner().miner_address.trim().to_string();
    mine(state, move |ledger| ledger.create_genesis(&miner)).await
}

/// Mine a new block from the current mempool:
/// - Drain pending txs in arrival order (up to the per-block limit)
/// - Coinbase pays subsidy + fees to `miner_address`
/// - Search for the nonce on the blocking pool, without holding the ledger
/// - Commit: spend inputs, add outputs, clear included txs from the mempool
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>, req: web::Json<MineRequest>) -> impl Responder {
    let miner = req.into_inner().miner_address.trim().to_string();
    mine(state, move |ledger| ledger.mine_pending(&miner)).await
}

async fn mine<F>(state: web::Data<AppState>, job: F) -> HttpResponse
where
    F: FnOnce(&SharedLedger) -> Result<Block> + Send + 'static,
{
    let ledger = state.ledger.clone();
    let outcome = web::block(move || job(&ledger)).await;

    let block = match outcome {
        Ok(Ok(block)) => block,
        Ok(Err(e)) => return ledger_error(e),
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    state.persist().await;

    let reward = block
        .coinbase()
        .map(|cb| cb.total_output_amount())
        .unwrap_or_default();
    let resp = MineResponse {
        mined_index: block.index,
        hash: block.hash.to_string(),
        nonce: block.header.nonce,
        difficulty: block.header.difficulty,
        transactions: block.transactions.len(),
        reward: format_coins(reward),
    };
    debug!("MINER - block #{} carries {} txs", resp.mined_index, resp.transactions);
    info!(
        "MINER - sealed block #{} (hash={}, nonce={})",
        resp.mined_index, resp.hash, resp.nonce
    );
    HttpResponse::Ok().json(resp)
}
