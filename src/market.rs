use crate::error::FetchError;
use crate::types::{BoostedToken, PairRecord, RawBoost, RawPair};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Upstream source of boosted tokens and their pairs.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Latest boosts followed by top boosts. No dedup at this layer.
    async fn fetch_boosted_tokens(&self) -> Result<Vec<BoostedToken>, FetchError>;

    async fn fetch_pools_for_token(
        &self,
        chain: &str,
        token_address: &str,
    ) -> Result<Vec<PairRecord>, FetchError>;
}

/// DexScreener client. Boosts come from `/token-boosts/{latest,top}/v1`,
/// pairs from `/token-pairs/v1/{chain}/{token}`.
#[derive(Clone)]
pub struct MarketFetcher {
    client: Client,
    base_url: String,
}

impl MarketFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("*/*"),
                );
                headers
            })
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    async fn fetch_boosts(&self, feed: &str) -> Result<Vec<RawBoost>, FetchError> {
        let url = format!("{}/token-boosts/{}/v1", self.base_url, feed);
        let entries: Option<Vec<Value>> = self.get_json(&url).await?;
        // Non-object entries are skipped rather than failing the whole feed.
        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| serde_json::from_value::<RawBoost>(v).ok())
            .collect())
    }
}

#[async_trait]
impl MarketSource for MarketFetcher {
    async fn fetch_boosted_tokens(&self) -> Result<Vec<BoostedToken>, FetchError> {
        let mut raw = self.fetch_boosts("latest").await?;
        raw.extend(self.fetch_boosts("top").await?);

        let tokens: Vec<BoostedToken> = raw
            .into_iter()
            .filter_map(|b| match (b.chain_id, b.token_address) {
                (Some(chain), Some(token_address)) if !chain.is_empty() && !token_address.is_empty() => {
                    Some(BoostedToken { chain, token_address })
                }
                _ => None,
            })
            .collect();
        debug!("[Market] {} boosted tokens fetched", tokens.len());
        Ok(tokens)
    }

    async fn fetch_pools_for_token(
        &self,
        chain: &str,
        token_address: &str,
    ) -> Result<Vec<PairRecord>, FetchError> {
        let url = format!("{}/token-pairs/v1/{}/{}", self.base_url, chain, token_address);
        let pairs: Option<Vec<RawPair>> = self.get_json(&url).await?;
        Ok(pairs.unwrap_or_default().into_iter().map(PairRecord::from).collect())
    }
}
