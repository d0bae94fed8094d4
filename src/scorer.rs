use crate::types::PairRecord;

const VOLUME_NORM_USD: f64 = 50_000.0;
const LIQUIDITY_NORM_USD: f64 = 25_000.0;
/// Age used when the creation time is unknown; drives the age term to ~0.
const UNKNOWN_AGE_MINUTES: f64 = 999_999.0;

const W_VOLUME: f64 = 0.35;
const W_LIQUIDITY: f64 = 0.25;
const W_AGE: f64 = 0.25;
const W_IMBALANCE: f64 = 0.10;
const W_BOOST: f64 = 0.05;

/// Minutes since the pair was created, never below one. A missing or
/// non-positive creation time counts as unknown.
pub fn age_minutes(pair_created_at_ms: i64, now_ms: i64) -> f64 {
    if pair_created_at_ms <= 0 {
        return UNKNOWN_AGE_MINUTES;
    }
    (now_ms.saturating_sub(pair_created_at_ms) as f64 / 60_000.0).max(1.0)
}

/// One-hour buy and sell counts.
pub fn buys_sells(pair: &PairRecord) -> (u64, u64) {
    (pair.buys_h1, pair.sells_h1)
}

/// Ranking score of a pair at `now_ms`, rounded to 4 decimals.
pub fn score(pair: &PairRecord, now_ms: i64) -> f64 {
    let age = age_minutes(pair.pair_created_at, now_ms);
    let (buys, sells) = buys_sells(pair);
    let (buys, sells) = (buys as f64, sells as f64);
    let imbalance = (buys - sells) / (buys + sells).max(1.0);
    let boosted = if pair.active_boosts > 0 { 1.0 } else { 0.0 };

    let raw = W_VOLUME * (pair.volume_h1_usd / VOLUME_NORM_USD)
        + W_LIQUIDITY * (pair.liquidity_usd / LIQUIDITY_NORM_USD)
        + W_AGE * (1.0 / age)
        + W_IMBALANCE * imbalance.max(0.0)
        + W_BOOST * boosted;

    (raw * 10_000.0).round() / 10_000.0
}
