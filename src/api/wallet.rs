use actix_web::{HttpResponse, Responder, post, web};

use super::models::AppState;
use utxo_ledger::wallet::Wallet;

/// Fresh keypair for this chain's address version. Returns private key hex,
/// public key hex, address and WIF.
#[post("/wallet/new/")]
pub async fn create_wallet(state: web::Data<AppState>) -> impl Responder {
    let wallet = Wallet::generate(state.ledger.params().address_version);
    HttpResponse::Ok().json(wallet.to_record())
}
