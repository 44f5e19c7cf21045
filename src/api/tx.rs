use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};
use std::time::Instant;

use super::models::{
    AppState, MempoolResponse, NewTxRequest, NewTxResponse, SendRequest, bad_request, ledger_error,
};
use utxo_ledger::wallet::Wallet;

/// Submit a signed transaction into the mempool.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let t0 = Instant::now();
    let tx = body.into_inner().transaction;
    debug!(
        "POST /tx/ - received: inputs={}, outputs={}",
        tx.inputs.len(),
        tx.outputs.len()
    );

    match state.ledger.submit_transaction(tx) {
        Ok(tx) => {
            state.persist().await;
            info!("POST /tx/ - txid={} OK ({} ms)", tx.txid, t0.elapsed().as_millis());
            HttpResponse::Ok().json(NewTxResponse {
                txid: tx.txid.to_string(),
            })
        }
        Err(e) => ledger_error(e),
    }
}

/// Build, sign and submit a payment from the key's own unreserved outputs.
#[post("/send/")]
pub async fn post_send(state: web::Data<AppState>, body: web::Json<SendRequest>) -> impl Responder {
    let req = body.into_inner();
    let version = state.ledger.params().address_version;
    let key = req.private_key.trim();
    let wallet = match Wallet::from_private_key_hex(key, version)
        .or_else(|_| Wallet::from_wif(key, version))
    {
        Ok(w) => w,
        Err(e) => return bad_request(format!("invalid private key: {e}")),
    };

    let spendable = state.ledger.spendable_utxos(&wallet.address);
    let submitted = wallet
        .create_transaction(&spendable, &req.recipient, req.amount, req.fee)
        .and_then(|tx| state.ledger.submit_transaction(tx));

    match submitted {
        Ok(tx) => {
            state.persist().await;
            info!(
                "POST /send/ - {} -> {} amount={} fee={} txid={}",
                wallet.address, req.recipient, req.amount, req.fee, tx.txid
            );
            HttpResponse::Ok().json(NewTxResponse {
                txid: tx.txid.to_string(),
            })
        }
        Err(e) => ledger_error(e),
    }
}

/// List the mempool in arrival order.
#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<AppState>) -> impl Responder {
    let transactions = state.ledger.mempool_snapshot();
    HttpResponse::Ok().json(MempoolResponse {
        size: transactions.len(),
        transactions,
    })
}
