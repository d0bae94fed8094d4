use crate::market::MarketSource;
use crate::safety::SafetyCheck;
use crate::scorer::score;
use crate::types::{BoostedToken, Candidate};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub chains: Vec<String>,
    pub top_k: usize,
    pub min_liq_usd: f64,
    pub min_vol_h1_usd: f64,
}

/// Fetch -> allow-list -> dedup -> liquidity/volume gate -> safety -> score -> rank.
pub struct ScanPipeline {
    market: Arc<dyn MarketSource>,
    safety: Arc<dyn SafetyCheck>,
    settings: ScanSettings,
}

impl ScanPipeline {
    pub fn new(market: Arc<dyn MarketSource>, safety: Arc<dyn SafetyCheck>, settings: ScanSettings) -> Self {
        Self { market, safety, settings }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub async fn run_scan(&self) -> Vec<Candidate> {
        self.run_scan_at(chrono::Utc::now().timestamp_millis()).await
    }

    /// At most `top_k` candidates, highest score first. Upstream failures only
    /// shrink the result.
    pub async fn run_scan_at(&self, now_ms: i64) -> Vec<Candidate> {
        let boosted = match self.market.fetch_boosted_tokens().await {
            Ok(b) => b,
            Err(e) => {
                debug!("[Scanner] Boosted token fetch failed: {}", e);
                return Vec::new();
            }
        };

        let targets = self.select_targets(boosted);
        debug!("[Scanner] {} unique boosted tokens on allowed chains", targets.len());

        let mut candidates = Vec::new();
        for target in &targets {
            let pools = match self
                .market
                .fetch_pools_for_token(&target.chain, &target.token_address)
                .await
            {
                Ok(p) => p,
                Err(e) => {
                    debug!("[Scanner] Pools fetch failed {}:{}: {}", target.chain, target.token_address, e);
                    continue;
                }
            };

            for mut pool in pools {
                if pool.liquidity_usd < self.settings.min_liq_usd
                    || pool.volume_h1_usd < self.settings.min_vol_h1_usd
                {
                    continue;
                }

                let verdict = self.safety.check(&target.chain, &pool.base_address).await;
                if !verdict.ok {
                    info!(
                        "[Scanner] Filtered by safety {}: {}",
                        pool.base_symbol,
                        verdict.reason.as_deref().unwrap_or("-")
                    );
                    continue;
                }

                pool.score = score(&pool, now_ms);
                pool.chain_id = target.chain.clone();
                candidates.push(pool);
            }
        }

        rank(candidates, self.settings.top_k)
    }

    /// Allowed chains only, first occurrence of each (chain, token) wins.
    fn select_targets(&self, boosted: Vec<BoostedToken>) -> Vec<BoostedToken> {
        let mut seen = HashSet::new();
        boosted
            .into_iter()
            .filter(|b| self.settings.chains.iter().any(|c| c == &b.chain))
            .filter(|b| seen.insert((b.chain.clone(), b.token_address.clone())))
            .collect()
    }
}

fn rank(mut candidates: Vec<Candidate>, top_k: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(top_k);
    candidates
}
