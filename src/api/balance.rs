use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse, UtxosResponse};
use utxo_ledger::blockchain::format_coins;

#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;

    let (balance, utxos) = {
        let ledger = state.ledger.read();
        (
            ledger.get_balance(&address),
            ledger.utxo_set().owned_by(&address).count(),
        )
    };

    HttpResponse::Ok().json(BalanceResponse {
        address,
        balance,
        balance_coins: format_coins(balance),
        utxos,
    })
}

#[get("/utxos/{address}/")]
pub async fn get_utxos(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    let utxos = state.ledger.get_utxos(&address);
    HttpResponse::Ok().json(UtxosResponse { address, utxos })
}
