pub mod block;
pub mod merkle;
pub mod model;
pub mod pow;

pub use block::{Block, BlockHeader};
pub use merkle::{merkle_root, merkle_root_of};
pub use model::Blockchain;
pub use pow::{CancelToken, leading_zero_nibbles, meets_difficulty, target};

/// Guidos per coin.
pub const COIN: u64 = 100_000_000;

/// Default Proof-of-Work difficulty (number of leading zero hex digits).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// A 256-bit hash has 64 hex digits.
pub const MAX_DIFFICULTY: u32 = 64;

/// Subsidy of block 0, in guidos.
pub const INITIAL_SUBSIDY: u64 = 50 * COIN;

/// Blocks between subsidy halvings.
pub const HALVING_INTERVAL: u64 = 210_000;

/// Cap on cumulative minted supply, in guidos.
pub const MAX_SUPPLY: u64 = 21_000_000 * COIN;

/// Upper bound on non-coinbase transactions drained into one block.
pub const MAX_TXS_PER_BLOCK: usize = 1_000;

/// Render guidos as whole coins with eight decimals.
pub fn format_coins(guidos: u128) -> String {
    let coin = COIN as u128;
    format!("{}.{:08}", guidos / coin, guidos % coin)
}

#[cfg(test)]
mod tests {
    use super::format_coins;

    #[test]
    fn formats_eight_decimals() {
        assert_eq!(format_coins(0), "0.00000000");
        assert_eq!(format_coins(5_000_000_000), "50.00000000");
        assert_eq!(format_coins(100_001), "0.00100001");
    }
}
