use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use super::models::AppState;

/// Liveness plus the current tip, cheap enough for polling.
#[get("/health/")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.read();
    HttpResponse::Ok().json(json!({
        "status": "up",
        "height": ledger.height(),
        "tip": ledger.chain().tip_hash().to_hex(),
    }))
}
