mod balance;
mod chain;
mod health;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::create_genesis)
            .service(chain::mine_block)
            .service(tx::post_transaction)
            .service(tx::post_send)
            .service(tx::get_mempool)
            .service(balance::get_balance)
            .service(balance::get_utxos)
            .service(stats::get_stats)
            .service(wallet::create_wallet),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};

    use super::*;
    use utxo_ledger::config::ChainParams;
    use utxo_ledger::ledger::{Ledger, SharedLedger};
    use utxo_ledger::persistence;
    use utxo_ledger::transaction::{Transaction, TxInput, TxOutput};
    use utxo_ledger::wallet::{MAINNET_VERSION, Wallet};

    fn state() -> web::Data<AppState> {
        let ledger = SharedLedger::new(Ledger::new(ChainParams::default().with_difficulty(1)));
        web::Data::new(AppState::new(ledger, None))
    }

    #[actix_web::test]
    async fn submitted_payment_to_malformed_address_is_refused() {
        let state = state();
        let miner = Wallet::generate(MAINNET_VERSION);
        state.ledger.create_genesis(&miner.address).unwrap();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let coin = state.ledger.get_utxos(&miner.address).remove(0);
        let mut tx = Transaction::new(
            vec![TxInput::new(coin.outpoint)],
            vec![TxOutput {
                address: "not-an-address-0OIl".to_string(),
                amount: 1_000,
            }],
        );
        tx.sign_all(&miner.private_key).unwrap();

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/")
            .set_json(json!({ "transaction": tx }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().is_some_and(|e| e.contains("encoding")));
        assert!(state.ledger.mempool_snapshot().is_empty());
    }

    #[actix_web::test]
    async fn mutations_rewrite_the_chain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        let ledger = SharedLedger::new(Ledger::new(ChainParams::default().with_difficulty(1)));
        let state = web::Data::new(AppState::new(ledger, Some(path.clone())));
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;
        let miner = Wallet::generate(MAINNET_VERSION);

        let req = test::TestRequest::post()
            .uri("/api/v1/genesis/")
            .set_json(json!({ "miner_address": miner.address }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = persistence::load_chain(&path).unwrap();
        assert_eq!(stored.height(), 1);
        assert_eq!(stored.chain_snapshot(), state.ledger.chain_snapshot());
        assert!(!path.with_extension("tmp").exists());
    }

    #[actix_web::test]
    async fn health_is_up() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;
        let req = test::TestRequest::get().uri("/api/v1/health/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "up");
        assert_eq!(body["height"], 0);
    }

    #[actix_web::test]
    async fn genesis_send_mine_roundtrip() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let new_wallet = || test::TestRequest::post().uri("/api/v1/wallet/new/").to_request();
        let miner: Value = test::call_and_read_body_json(&app, new_wallet()).await;
        let bob: Value = test::call_and_read_body_json(&app, new_wallet()).await;
        let miner_address = miner["address"].as_str().unwrap();
        let bob_address = bob["address"].as_str().unwrap();

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(json!({ "miner_address": miner_address }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/genesis/")
            .set_json(json!({ "miner_address": miner_address }))
            .to_request();
        let genesis: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(genesis["mined_index"], 0);

        let req = test::TestRequest::post()
            .uri("/api/v1/send/")
            .set_json(json!({
                "private_key": miner["wif"],
                "recipient": bob_address,
                "amount": 1_000,
                "fee": 10,
            }))
            .to_request();
        let sent: Value = test::call_and_read_body_json(&app, req).await;
        assert!(sent["txid"].is_string());

        let req = test::TestRequest::get().uri("/api/v1/mempool/").to_request();
        let mempool: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mempool["size"], 1);

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(json!({ "miner_address": miner_address }))
            .to_request();
        let mined: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mined["mined_index"], 1);
        assert_eq!(mined["transactions"], 2);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/balance/{bob_address}/"))
            .to_request();
        let balance: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(balance["balance"], 1_000);
        assert_eq!(balance["utxos"], 1);

        let req = test::TestRequest::get().uri("/api/v1/validate/").to_request();
        let valid: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(valid["valid"], true);
        assert_eq!(valid["length"], 2);

        let req = test::TestRequest::get().uri("/api/v1/stats/").to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["height"], 2);
        assert_eq!(stats["mempool_size"], 0);
        assert_eq!(state.ledger.height(), 2);
    }

    #[actix_web::test]
    async fn refusals_carry_a_json_error() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/genesis/")
            .set_json(json!({ "miner_address": "not-an-address" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());

        let req = test::TestRequest::post()
            .uri("/api/v1/send/")
            .set_json(json!({
                "private_key": "zz",
                "recipient": "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH",
                "amount": 1,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
