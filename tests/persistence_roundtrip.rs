//! Chain files reload into a ledger that validates exactly like the original.

use utxo_ledger::blockchain::COIN;
use utxo_ledger::config::ChainParams;
use utxo_ledger::ledger::Ledger;
use utxo_ledger::persistence::{self, ChainFile};
use utxo_ledger::wallet::{MAINNET_VERSION, Wallet};

#[test]
fn reloaded_chain_validates_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blockchain.json");
    let m = Wallet::generate(MAINNET_VERSION);
    let b = Wallet::generate(MAINNET_VERSION);

    let mut ledger = Ledger::new(ChainParams::default().with_difficulty(2));
    ledger.create_genesis(&m.address).unwrap();
    for _ in 0..2 {
        let tx = m
            .create_transaction(&ledger.spendable_utxos(&m.address), &b.address, COIN, 500)
            .unwrap();
        ledger.submit_transaction(tx).unwrap();
        ledger.mine_pending(&m.address).unwrap();
    }
    let pending = m
        .create_transaction(&ledger.spendable_utxos(&m.address), &b.address, 3, 0)
        .unwrap();
    ledger.submit_transaction(pending).unwrap();

    persistence::save_chain(&path, &ledger).unwrap();
    let mut reloaded = persistence::load_chain(&path).unwrap();

    assert_eq!(reloaded.params(), ledger.params());
    assert_eq!(reloaded.validate_chain(), ledger.validate_chain());
    assert_eq!(reloaded.get_balance(&b.address), ledger.get_balance(&b.address));
    assert_eq!(reloaded.mempool_snapshot(), ledger.mempool_snapshot());

    // The reloaded ledger keeps working from where the original stopped.
    let next = reloaded.mine_pending(&b.address).unwrap();
    assert_eq!(next.index, 3);
    assert_eq!(next.header.previous_hash, ledger.chain().tip_hash());
    assert_eq!(reloaded.get_balance(&b.address), (2 * COIN + 3 + 50 * COIN) as u128);
    reloaded.validate_chain().unwrap();
}

#[test]
fn chain_file_is_plain_json() {
    let m = Wallet::generate(MAINNET_VERSION);
    let mut ledger = Ledger::new(ChainParams::default().with_difficulty(1));
    ledger.create_genesis(&m.address).unwrap();

    let json = serde_json::to_value(ChainFile::from_ledger(&ledger)).unwrap();
    assert_eq!(json["params"]["difficulty"], 1);
    assert_eq!(json["chain"].as_array().map(Vec::len), Some(1));
    assert_eq!(
        json["chain"][0]["hash"].as_str(),
        Some(ledger.chain().tip_hash().to_hex().as_str())
    );
    assert_eq!(
        json["chain"][0]["transactions"][0]["outputs"][0]["address"].as_str(),
        Some(m.address.as_str())
    );
}

#[test]
fn wallet_file_reimports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");
    let w = Wallet::generate(MAINNET_VERSION);
    persistence::save_wallet(&path, &w).unwrap();
    let back = persistence::load_wallet(&path).unwrap();
    assert_eq!(back.address, w.address);
    assert_eq!(back.public_key.to_hex(), w.public_key.to_hex());
}
