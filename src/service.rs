use crate::error::StoreError;
use crate::scanner::ScanPipeline;
use crate::types::Candidate;
use crate::watchlist::Watchlist;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarStatus {
    pub chains: Vec<String>,
    pub poll_interval_sec: u64,
    pub watch_interval_sec: u64,
    pub score_threshold: f64,
    pub top_k: usize,
    pub watchlist_size: usize,
}

/// Operations offered to the command front-end. Runs its own scans, so it
/// never waits on the background workers.
#[derive(Clone)]
pub struct Radar {
    pipeline: Arc<ScanPipeline>,
    watchlist: Arc<Watchlist>,
    poll_interval_sec: u64,
    watch_interval_sec: u64,
    score_threshold: f64,
}

impl Radar {
    pub fn new(
        pipeline: Arc<ScanPipeline>,
        watchlist: Arc<Watchlist>,
        poll_interval_sec: u64,
        watch_interval_sec: u64,
        score_threshold: f64,
    ) -> Self {
        Self {
            pipeline,
            watchlist,
            poll_interval_sec,
            watch_interval_sec,
            score_threshold,
        }
    }

    pub async fn get_ranked_candidates(&self) -> Vec<Candidate> {
        self.pipeline.run_scan().await
    }

    pub async fn register_watch_token(&self, address: &str) -> Result<bool, StoreError> {
        self.watchlist.register(address).await
    }

    pub async fn status(&self) -> RadarStatus {
        let settings = self.pipeline.settings();
        RadarStatus {
            chains: settings.chains.clone(),
            poll_interval_sec: self.poll_interval_sec,
            watch_interval_sec: self.watch_interval_sec,
            score_threshold: self.score_threshold,
            top_k: settings.top_k,
            watchlist_size: self.watchlist.load().await.map(|t| t.len()).unwrap_or(0),
        }
    }
}
