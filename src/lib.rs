//! A single-node UTXO ledger: secp256k1 keys and base-58 addresses, signed
//! transactions, Merkle-committed blocks sealed by proof of work, and a
//! ledger that keeps chain, UTXO index and mempool consistent.

pub mod blockchain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod transaction;
pub mod wallet;

pub use blockchain::{Block, BlockHeader, COIN, CancelToken, format_coins};
pub use config::{ChainParams, ServerConfig};
pub use crypto::Hash256;
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, SharedLedger, ValidationReport};
pub use transaction::{OutPoint, SpendableOutput, Transaction, TxInput, TxOutput};
pub use wallet::{PrivateKey, PublicKey, Wallet};
