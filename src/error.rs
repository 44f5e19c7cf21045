use thiserror::Error;

use crate::crypto::EncodingError;
use crate::transaction::OutPoint;

/// Every way a ledger operation can be refused. All are recoverable: the
/// ledger state is untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: u128, required: u128 },

    #[error("invalid signature on input {input}")]
    InvalidSignature { input: usize },

    #[error("outputs total {outputs} exceeds inputs total {inputs}")]
    ValueMismatch { inputs: u128, outputs: u128 },

    #[error("referenced output {0} not found")]
    UnknownOutput(OutPoint),

    #[error("output {0} is already spent or reserved")]
    DoubleSpend(OutPoint),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(&'static str),

    #[error("input index {0} out of range")]
    InputOutOfRange(usize),

    #[error("block {block}: hash does not satisfy proof of work")]
    InvalidProofOfWork { block: u64 },

    #[error("block {block}: does not link to its predecessor")]
    ChainDiscontinuity { block: u64 },

    #[error("block {block}: merkle root mismatch")]
    MerkleMismatch { block: u64 },

    #[error("block {block}: minted supply exceeds the cap")]
    SupplyExceeded { block: u64 },

    #[error("block {block}: coinbase pays {actual}, expected {expected}")]
    CoinbaseMismatch {
        block: u64,
        expected: u128,
        actual: u128,
    },

    #[error("block {block}: coinbase missing or misplaced")]
    InvalidCoinbase { block: u64 },

    #[error("block {block}, transaction {tx}: {source}")]
    BlockTransaction {
        block: u64,
        tx: usize,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("genesis block already exists")]
    GenesisExists,

    #[error("ledger has no genesis block")]
    NotInitialized,

    #[error("mining cancelled")]
    MiningCancelled,

    #[error("nonce space exhausted")]
    NonceSpaceExhausted,

    #[error("block template is stale")]
    StaleTemplate,
}

impl LedgerError {
    /// Block index carried by chain-validation failures.
    pub fn block_index(&self) -> Option<u64> {
        match self {
            LedgerError::InvalidProofOfWork { block }
            | LedgerError::ChainDiscontinuity { block }
            | LedgerError::MerkleMismatch { block }
            | LedgerError::SupplyExceeded { block }
            | LedgerError::CoinbaseMismatch { block, .. }
            | LedgerError::InvalidCoinbase { block }
            | LedgerError::BlockTransaction { block, .. } => Some(*block),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
