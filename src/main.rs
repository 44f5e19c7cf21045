mod api;

use actix_web::{App, HttpServer, rt, web};
use log::{info, warn};

use api::AppState;
use utxo_ledger::config::ServerConfig;
use utxo_ledger::ledger::{Ledger, SharedLedger};
use utxo_ledger::persistence;

/// Resume from the chain file when one exists, otherwise start empty.
fn open_ledger(config: &ServerConfig) -> Ledger {
    let Some(path) = config.chain_file.as_deref().filter(|p| p.exists()) else {
        return Ledger::new(config.params);
    };
    match persistence::load_chain(path) {
        Ok(ledger) => {
            if let Err(e) = ledger.validate_chain() {
                warn!("chain file {} does not validate: {e}", path.display());
            }
            ledger
        }
        Err(e) => {
            warn!("could not load {}: {e}; starting empty", path.display());
            Ledger::new(config.params)
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = ServerConfig::from_env();
    env_logger::init();

    let ledger = SharedLedger::new(open_ledger(&config));
    info!(
        "ledger ready: height={}, difficulty={}",
        ledger.height(),
        ledger.params().difficulty
    );
    println!(
        "⛓️ Starting ledger API at http://{}:{}",
        config.host, config.port
    );

    let state = web::Data::new(AppState::new(ledger.clone(), config.chain_file.clone()));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .disable_signals()
    .run();

    // A search in progress would otherwise hold up graceful shutdown.
    let handle = server.handle();
    rt::spawn(async move {
        if rt::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            ledger.cancel_mining();
            handle.stop(true).await;
        }
    });

    server.await
}
