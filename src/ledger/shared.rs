use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info};

use super::{BlockTemplate, Ledger, ValidationReport};
use crate::blockchain::{Block, CancelToken};
use crate::config::ChainParams;
use crate::error::Result;
use crate::transaction::{SpendableOutput, Transaction};

/// Thread-safe handle to a [`Ledger`].
///
/// Readers and transaction submission go through an `RwLock`. Mining takes a
/// template under the read lock, searches for a nonce with no lock held, then
/// commits under the write lock, so a long search never stalls queries. Only
/// one search runs at a time; [`SharedLedger::cancel_mining`] stops it.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
    search: Arc<Mutex<()>>,
    current: Arc<Mutex<Option<CancelToken>>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
            search: Arc::new(Mutex::new(())),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Read access for callers needing several queries against one view.
    pub fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        // Ledger mutations are all-or-nothing, so a poisoned lock still
        // guards a consistent value.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> MutexGuard<'_, Option<CancelToken>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn submit_transaction(&self, tx: Transaction) -> Result<Transaction> {
        self.write().submit_transaction(tx)
    }

    pub fn create_genesis(&self, miner_address: &str) -> Result<Block> {
        self.mine_with(|ledger| ledger.prepare_genesis(miner_address))
    }

    pub fn mine_pending(&self, miner_address: &str) -> Result<Block> {
        self.mine_with(|ledger| ledger.prepare_block(miner_address))
    }

    /// Stop the search in progress, if any. It returns `MiningCancelled` and
    /// the ledger is left as it was.
    pub fn cancel_mining(&self) -> bool {
        match self.current().as_ref() {
            Some(token) => {
                info!("MINER - cancel requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn mine_with<F>(&self, prepare: F) -> Result<Block>
    where
        F: FnOnce(&Ledger) -> Result<BlockTemplate>,
    {
        let _search = self.search.lock().unwrap_or_else(PoisonError::into_inner);
        let token = CancelToken::new();
        *self.current() = Some(token.clone());

        let result = (|| {
            let template = prepare(&self.read())?;
            debug!(
                "MINER - searching block #{} ({} txs)",
                template.index,
                template.transactions.len()
            );
            let header = template.header.mine(&token)?;
            self.write().commit_block(template, header)
        })();

        *self.current() = None;
        result
    }

    pub fn get_balance(&self, address: &str) -> u128 {
        self.read().get_balance(address)
    }

    pub fn get_utxos(&self, address: &str) -> Vec<SpendableOutput> {
        self.read().get_utxos(address)
    }

    pub fn spendable_utxos(&self, address: &str) -> Vec<SpendableOutput> {
        self.read().spendable_utxos(address)
    }

    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.read().chain_snapshot()
    }

    pub fn mempool_snapshot(&self) -> Vec<Transaction> {
        self.read().mempool_snapshot()
    }

    pub fn validate_chain(&self) -> Result<ValidationReport> {
        self.read().validate_chain()
    }

    pub fn height(&self) -> u64 {
        self.read().height()
    }

    pub fn minted(&self) -> u64 {
        self.read().minted()
    }

    pub fn params(&self) -> ChainParams {
        *self.read().params()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::error::LedgerError;
    use crate::wallet::{MAINNET_VERSION, Wallet};

    fn shared(difficulty: u32) -> SharedLedger {
        SharedLedger::new(Ledger::new(ChainParams::new(difficulty, 210_000, 5_000, 1_000_000)))
    }

    #[test]
    fn handles_share_one_ledger() {
        let ledger = shared(1);
        let other = ledger.clone();
        let miner = Wallet::generate(MAINNET_VERSION);
        ledger.create_genesis(&miner.address).unwrap();
        assert_eq!(other.height(), 1);
        assert_eq!(other.get_balance(&miner.address), 5_000);
        assert!(!other.cancel_mining());
    }

    #[test]
    fn concurrent_submitters_never_share_an_input() {
        let ledger = shared(1);
        let miner = Wallet::generate(MAINNET_VERSION);
        let bob = Wallet::generate(MAINNET_VERSION);
        ledger.create_genesis(&miner.address).unwrap();
        let coins = ledger.get_utxos(&miner.address);

        let handles: Vec<_> = (0..4u64)
            .map(|i| {
                let ledger = ledger.clone();
                let tx = miner
                    .create_transaction(&coins, &bob.address, 100 + i, 1)
                    .unwrap();
                thread::spawn(move || ledger.submit_transaction(tx).is_ok())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join())
            .filter(|r| matches!(r, Ok(true)))
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(ledger.mempool_snapshot().len(), 1);
    }

    #[test]
    fn queries_answer_while_a_search_runs() {
        let ledger = shared(1);
        let miner = Wallet::generate(MAINNET_VERSION);
        ledger.create_genesis(&miner.address).unwrap();

        // Unreachable difficulty keeps the search running until cancelled.
        let hard = SharedLedger::new(Ledger::restore(
            ChainParams::new(64, 210_000, 5_000, 1_000_000),
            ledger.chain_snapshot(),
        ));
        let worker = {
            let hard = hard.clone();
            let address = miner.address.clone();
            thread::spawn(move || hard.mine_pending(&address))
        };

        while hard.current().is_none() {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(hard.get_balance(&miner.address), 5_000);
        assert_eq!(hard.height(), 1);

        assert!(hard.cancel_mining());
        let outcome = worker.join().unwrap();
        assert_eq!(outcome, Err(LedgerError::MiningCancelled));
        assert_eq!(hard.height(), 1);
        assert_eq!(hard.minted(), 5_000);
        assert!(hard.current().is_none());
    }
}
