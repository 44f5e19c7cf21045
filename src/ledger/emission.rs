use crate::config::ChainParams;

/// Per-block subsidy before the supply cap: `initial >> (height / interval)`,
/// floored at zero once the shift would reach the width of the amount.
pub fn subsidy(params: &ChainParams, height: u64) -> u64 {
    let halvings = height.checked_div(params.halving_interval).unwrap_or(0);
    if halvings >= u64::BITS as u64 {
        return 0;
    }
    params.initial_subsidy >> halvings
}

/// Subsidy actually minted at `height` given `minted` so far: never more than
/// what is left under `max_supply`.
pub fn block_reward(params: &ChainParams, height: u64, minted: u64) -> u64 {
    subsidy(params, height).min(params.max_supply.saturating_sub(minted))
}
