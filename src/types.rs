use serde::{Deserialize, Deserializer, Serialize};

/// Seed entry from the boosted-token feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostedToken {
    pub chain: String,
    pub token_address: String,
}

/// A trading pair as reported by the market-data service.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRecord {
    pub chain_id: String,
    pub pair_address: String,
    pub base_symbol: String,
    pub base_address: String,
    pub price_usd: Option<f64>,
    pub price_native: Option<f64>,
    pub liquidity_usd: f64,
    pub volume_h1_usd: f64,
    pub buys_h1: u64,
    pub sells_h1: u64,
    pub fdv: Option<f64>,
    /// Milliseconds since epoch, `0` when unknown.
    pub pair_created_at: i64,
    pub active_boosts: u64,
    pub url: Option<String>,
    pub score: f64,
}

/// A pair that passed the liquidity, volume and safety gates, with `score`
/// set and `chain_id` tagged with the chain it was requested on.
pub type Candidate = PairRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyVerdict {
    pub ok: bool,
    pub reason: Option<String>,
}

impl SafetyVerdict {
    pub fn safe() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn unsafe_because(reason: impl Into<String>) -> Self {
        Self { ok: false, reason: Some(reason.into()) }
    }

    /// Check could not be completed; the token passes anyway.
    pub fn fail_open(reason: impl Into<String>) -> Self {
        Self { ok: true, reason: Some(reason.into()) }
    }
}

// Wire shapes of the DexScreener API. Every field is optional upstream.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawBoost {
    pub chain_id: Option<String>,
    pub token_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawPair {
    pub chain_id: Option<String>,
    pub pair_address: Option<String>,
    pub url: Option<String>,
    pub base_token: Option<RawToken>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub price_usd: Option<f64>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub price_native: Option<f64>,
    pub txns: Option<RawTxns>,
    pub volume: Option<RawVolume>,
    pub liquidity: Option<RawLiquidity>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub fdv: Option<f64>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub pair_created_at: Option<f64>,
    pub boosts: Option<RawBoosts>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawToken {
    pub address: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawTxns {
    pub h1: Option<RawTxnCount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawTxnCount {
    pub buys: Option<u64>,
    pub sells: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawVolume {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub h1: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawLiquidity {
    #[serde(deserialize_with = "de_lenient_f64")]
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawBoosts {
    pub active: Option<u64>,
}

impl From<RawPair> for PairRecord {
    fn from(raw: RawPair) -> Self {
        let base = raw.base_token.unwrap_or_default();
        let h1 = raw.txns.and_then(|t| t.h1).unwrap_or_default();
        Self {
            chain_id: raw.chain_id.unwrap_or_default(),
            pair_address: raw.pair_address.unwrap_or_default(),
            base_symbol: base.symbol.unwrap_or_default(),
            base_address: base.address.unwrap_or_default(),
            price_usd: raw.price_usd,
            price_native: raw.price_native,
            liquidity_usd: raw.liquidity.and_then(|l| l.usd).unwrap_or(0.0),
            volume_h1_usd: raw.volume.and_then(|v| v.h1).unwrap_or(0.0),
            buys_h1: h1.buys.unwrap_or(0),
            sells_h1: h1.sells.unwrap_or(0),
            fdv: raw.fdv,
            pair_created_at: raw.pair_created_at.map(|v| v as i64).unwrap_or(0),
            active_boosts: raw.boosts.and_then(|b| b.active).unwrap_or(0),
            url: raw.url,
            score: 0.0,
        }
    }
}

/// DexScreener sends prices as strings and most amounts as numbers; accept
/// either, and treat null or garbage as absent.
fn de_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
