use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};
use utxo_ledger::blockchain::format_coins;

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    // One read guard so every field comes from the same view.
    let ledger = state.ledger.read();
    let params = ledger.params();
    let height = ledger.height();

    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty: params.difficulty,
        minted: ledger.minted(),
        minted_coins: format_coins(ledger.minted() as u128),
        next_subsidy: ledger.subsidy(height),
        halving_interval: params.halving_interval,
        max_supply: params.max_supply,
        mempool_size: ledger.mempool().len(),
        utxo_size: ledger.utxo_set().len(),
    })
}
