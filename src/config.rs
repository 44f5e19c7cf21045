use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::blockchain::{
    DEFAULT_DIFFICULTY, HALVING_INTERVAL, INITIAL_SUBSIDY, MAX_DIFFICULTY, MAX_SUPPLY,
    MAX_TXS_PER_BLOCK,
};
use crate::wallet::MAINNET_VERSION;

/// Consensus parameters of one ledger. Fixed for the life of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Required count of leading zero hex nibbles in a block hash.
    pub difficulty: u32,
    /// Blocks between subsidy halvings. Zero never halves.
    pub halving_interval: u64,
    /// Subsidy of the genesis block, in guidos.
    pub initial_subsidy: u64,
    /// Cap on cumulative minted supply, in guidos.
    pub max_supply: u64,
    pub max_block_transactions: usize,
    pub address_version: u8,
}

impl ChainParams {
    pub fn new(
        difficulty: u32,
        halving_interval: u64,
        initial_subsidy: u64,
        max_supply: u64,
    ) -> Self {
        Self {
            difficulty: difficulty.min(MAX_DIFFICULTY),
            halving_interval,
            initial_subsidy,
            max_supply,
            ..Self::default()
        }
    }

    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty.min(MAX_DIFFICULTY);
        self
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            halving_interval: HALVING_INTERVAL,
            initial_subsidy: INITIAL_SUBSIDY,
            max_supply: MAX_SUPPLY,
            max_block_transactions: MAX_TXS_PER_BLOCK,
            address_version: MAINNET_VERSION,
        }
    }
}

/// Demo server settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub params: ChainParams,
    /// Where the chain is loaded from and saved to. `None` keeps it in memory.
    pub chain_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = parse_var("PORT").unwrap_or(8080);

        let mut params = ChainParams::default();
        if let Some(d) = parse_var("DIFFICULTY") {
            params = params.with_difficulty(d);
        }
        if let Some(h) = parse_var("HALVING_INTERVAL") {
            params.halving_interval = h;
        }

        let chain_file = env::var("CHAIN_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            params,
            chain_file,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::COIN;

    #[test]
    fn defaults_follow_the_reference_schedule() {
        let p = ChainParams::default();
        assert_eq!(p.difficulty, 4);
        assert_eq!(p.initial_subsidy, 50 * COIN);
        assert_eq!(p.halving_interval, 210_000);
        assert_eq!(p.max_supply, 21_000_000 * COIN);
    }

    #[test]
    fn difficulty_is_clamped() {
        assert_eq!(ChainParams::new(100, 10, 1, 1).difficulty, MAX_DIFFICULTY);
        assert_eq!(ChainParams::default().with_difficulty(70).difficulty, 64);
    }
}
