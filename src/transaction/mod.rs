pub mod builder;
pub mod model;
pub mod utxo;
pub mod verify;

pub use builder::{CoinSelector, FirstFit, build_transaction, build_transaction_with};
pub use model::{Transaction, TxInput, TxOutput, sign_input};
pub use utxo::{OutPoint, SpendableOutput, UtxoLookup, UtxoSet};
pub use verify::{check_structure, verify_transaction};
