use crate::deduplication::DedupeState;
use crate::market::MarketSource;
use crate::notifier::{format_batch, format_watch_alert, AlertSink};
use crate::safety::SafetyCheck;
use crate::scanner::ScanPipeline;
use crate::scorer::score;
use crate::signal::SignalLogger;
use crate::types::Candidate;
use crate::watchlist::Watchlist;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Sleeps for `interval`; returns `true` when shutdown was requested. Workers
/// only call this between cycles, so a started cycle always completes.
async fn wait_or_shutdown(interval: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    tokio::select! {
        _ = sleep(interval) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

pub struct BroadScanWorker {
    pipeline: Arc<ScanPipeline>,
    dedupe: DedupeState,
    sink: Option<Arc<dyn AlertSink>>,
    signal_log: Option<Arc<SignalLogger>>,
    score_threshold: f64,
    interval: Duration,
}

impl BroadScanWorker {
    pub fn new(
        pipeline: Arc<ScanPipeline>,
        dedupe: DedupeState,
        sink: Option<Arc<dyn AlertSink>>,
        signal_log: Option<Arc<SignalLogger>>,
        score_threshold: f64,
        interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            dedupe,
            sink,
            signal_log,
            score_threshold,
            interval,
        }
    }

    /// One scan/alert/persist pass at `now` (unix seconds). Returns the pairs
    /// that were alerted.
    pub async fn run_cycle(&mut self, now: f64) -> Vec<Candidate> {
        let ranked = self.pipeline.run_scan_at((now * 1000.0) as i64).await;

        let mut alerts = Vec::new();
        for candidate in ranked {
            if candidate.score < self.score_threshold
                || !self.dedupe.should_alert(&candidate.pair_address, now)
            {
                continue;
            }
            self.dedupe.mark_sent(&candidate.pair_address, now);
            if let Some(log) = &self.signal_log {
                if let Err(e) = log.log_pair(&candidate).await {
                    warn!("[BroadScan] Signal log write failed: {}", e);
                }
            }
            alerts.push(candidate);
        }

        if !alerts.is_empty() {
            info!("[BroadScan] {} new alert(s)", alerts.len());
            if let Some(sink) = &self.sink {
                let text = format_batch(&alerts, (now * 1000.0) as i64);
                if let Err(e) = sink.send(&text).await {
                    warn!("[BroadScan] Alert delivery failed: {}", e);
                }
            }
        }

        if let Err(e) = self.dedupe.save().await {
            warn!("[State] Save to {:?} failed: {}", self.dedupe.path(), e);
        }
        alerts
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[BroadScan] Started (interval: {}s)", self.interval.as_secs());
        loop {
            let alerts = self.run_cycle(now_secs()).await;
            debug!("[BroadScan] Cycle done, {} alert(s)", alerts.len());
            if wait_or_shutdown(self.interval, &mut shutdown).await {
                break;
            }
        }
        info!("[BroadScan] Stopped");
    }
}

/// Re-scans every watchlisted token on every configured chain. Alerts are
/// sent one by one and are not deduplicated across cycles.
pub struct WatchWorker {
    market: Arc<dyn MarketSource>,
    safety: Arc<dyn SafetyCheck>,
    watchlist: Arc<Watchlist>,
    sink: Option<Arc<dyn AlertSink>>,
    signal_log: Option<Arc<SignalLogger>>,
    chains: Vec<String>,
    score_threshold: f64,
    interval: Duration,
}

impl WatchWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market: Arc<dyn MarketSource>,
        safety: Arc<dyn SafetyCheck>,
        watchlist: Arc<Watchlist>,
        sink: Option<Arc<dyn AlertSink>>,
        signal_log: Option<Arc<SignalLogger>>,
        chains: Vec<String>,
        score_threshold: f64,
        interval: Duration,
    ) -> Self {
        Self {
            market,
            safety,
            watchlist,
            sink,
            signal_log,
            chains,
            score_threshold,
            interval,
        }
    }

    pub async fn run_cycle(&self, now_ms: i64) -> Vec<Candidate> {
        let tokens = match self.watchlist.load().await {
            Ok(t) => t,
            Err(e) => {
                error!("[Watch] Failed to load watchlist {:?}: {}", self.watchlist.path(), e);
                return Vec::new();
            }
        };

        let mut alerts = Vec::new();
        for token in &tokens {
            for chain in &self.chains {
                let pools = match self.market.fetch_pools_for_token(chain, token).await {
                    Ok(p) => p,
                    Err(e) => {
                        debug!("[Watch] Pools fetch failed {}:{}: {}", chain, token, e);
                        continue;
                    }
                };

                for mut pool in pools {
                    let verdict = self.safety.check(chain, &pool.base_address).await;
                    if !verdict.ok {
                        continue;
                    }
                    pool.score = score(&pool, now_ms);
                    if pool.score < self.score_threshold {
                        continue;
                    }

                    if let Some(sink) = &self.sink {
                        if let Err(e) = sink.send(&format_watch_alert(&pool, now_ms)).await {
                            warn!("[Watch] Alert delivery failed for {}: {}", pool.pair_address, e);
                        }
                    }
                    if let Some(log) = &self.signal_log {
                        if let Err(e) = log.log_pair(&pool).await {
                            warn!("[Watch] Signal log write failed: {}", e);
                        }
                    }
                    alerts.push(pool);
                }
            }
        }
        alerts
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("[Watch] Started (interval: {}s)", self.interval.as_secs());
        loop {
            let alerts = self.run_cycle(chrono::Utc::now().timestamp_millis()).await;
            debug!("[Watch] Cycle done, {} alert(s)", alerts.len());
            if wait_or_shutdown(self.interval, &mut shutdown).await {
                break;
            }
        }
        info!("[Watch] Stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::scanner::tests::{pool, StubMarket, StubSafety};
    use crate::scanner::ScanSettings;
    use crate::types::PairRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const T: f64 = 1_700_000_000.0;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(NotifyError::Api { status: 400, body: "bad".into() });
            }
            Ok(())
        }
    }

    fn hot_pool(pair: &str) -> PairRecord {
        // volume alone pushes the score past 0.7
        pool(pair, "base", 50_000.0, 200_000.0)
    }

    fn broad_worker(
        market: StubMarket,
        state: DedupeState,
        sink: Arc<RecordingSink>,
    ) -> BroadScanWorker {
        let pipeline = ScanPipeline::new(
            Arc::new(market),
            Arc::new(StubSafety::default()),
            ScanSettings {
                chains: vec!["bsc".into()],
                top_k: 10,
                min_liq_usd: 5000.0,
                min_vol_h1_usd: 20000.0,
            },
        );
        BroadScanWorker::new(Arc::new(pipeline), state, Some(sink), None, 0.7, Duration::from_secs(600))
    }

    #[tokio::test]
    async fn broad_scan_respects_cooldown() {
        let dir = tempdir().unwrap();
        let state_path = dir.path().join("state.json");
        let market = StubMarket::default()
            .boost("bsc", "t")
            .pools("bsc", "t", vec![hot_pool("0xhot"), pool("0xcold", "c", 6000.0, 21000.0)]);
        let sink = Arc::new(RecordingSink::default());
        let mut worker = broad_worker(market, DedupeState::new(&state_path), sink.clone());

        let first = worker.run_cycle(T).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].pair_address, "0xhot");
        assert_eq!(sink.sent.lock().unwrap().len(), 1);

        assert!(worker.run_cycle(T + 1800.0).await.is_empty());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);

        assert_eq!(worker.run_cycle(T + 3700.0).await.len(), 1);
        assert_eq!(sink.sent.lock().unwrap().len(), 2);

        let persisted = DedupeState::load(&state_path);
        assert_eq!(persisted.last_sent("0xhot"), Some(T + 3700.0));
        assert_eq!(persisted.last_sent("0xcold"), None);
    }

    #[tokio::test]
    async fn alerts_are_batched_and_logged() {
        let dir = tempdir().unwrap();
        let market = StubMarket::default()
            .boost("bsc", "t")
            .pools("bsc", "t", vec![hot_pool("0xa"), hot_pool("0xb")]);
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(SignalLogger::new(dir.path().join("signals.csv")));
        let mut worker = broad_worker(market, DedupeState::new(dir.path().join("s.json")), sink.clone());
        worker.signal_log = Some(log.clone());

        assert_eq!(worker.run_cycle(T).await.len(), 2);
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].matches("[DexScreener]").count(), 2);
        let csv = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[tokio::test]
    async fn state_saved_even_without_alerts_or_on_delivery_failure() {
        let dir = tempdir().unwrap();
        let state_path = dir.path().join("state.json");
        let market = StubMarket::default().boost("bsc", "t").pools("bsc", "t", vec![hot_pool("0xa")]);
        let sink = Arc::new(RecordingSink { fail: true, ..Default::default() });
        let mut worker = broad_worker(market, DedupeState::new(&state_path), sink);

        assert_eq!(worker.run_cycle(T).await.len(), 1);
        assert!(DedupeState::load(&state_path).last_sent("0xa").is_some());

        let quiet = StubMarket::default();
        let state2 = dir.path().join("quiet.json");
        let mut worker = broad_worker(quiet, DedupeState::new(&state2), Arc::new(RecordingSink::default()));
        assert!(worker.run_cycle(T).await.is_empty());
        assert!(state2.exists());
    }

    #[tokio::test]
    async fn watch_worker_realerts_every_cycle() {
        let dir = tempdir().unwrap();
        let watchlist = Arc::new(Watchlist::new(dir.path().join("watchlist.jsonl")));
        watchlist.register("t").await.unwrap();

        // No liquidity/volume gate here: the thin pool still alerts on score.
        let mut thin = pool("0xthin", "base", 100.0, 100.0);
        thin.pair_created_at = 1_700_000_000_000;
        let market = StubMarket::default()
            .pools("bsc", "t", vec![hot_pool("0xw"), thin])
            .pools("solana", "t", vec![pool("0xlow", "x", 100.0, 100.0)]);
        let sink = Arc::new(RecordingSink::default());
        let worker = WatchWorker::new(
            Arc::new(market),
            Arc::new(StubSafety::default()),
            watchlist,
            Some(sink.clone()),
            None,
            vec!["bsc".into(), "solana".into(), "ethereum".into()],
            0.25,
            Duration::from_secs(1800),
        );

        let now_ms = 1_700_000_000_000;
        assert_eq!(worker.run_cycle(now_ms).await.len(), 2);
        assert_eq!(worker.run_cycle(now_ms).await.len(), 2);
        assert_eq!(sink.sent.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn watch_worker_skips_unsafe() {
        let dir = tempdir().unwrap();
        let watchlist = Arc::new(Watchlist::new(dir.path().join("watchlist.jsonl")));
        watchlist.register("t").await.unwrap();
        let market = StubMarket::default().pools("bsc", "t", vec![hot_pool("0xw")]);
        let worker = WatchWorker::new(
            Arc::new(market),
            Arc::new(StubSafety { unsafe_tokens: vec!["base".into()] }),
            watchlist,
            None,
            None,
            vec!["bsc".into()],
            0.7,
            Duration::from_secs(1800),
        );
        assert!(worker.run_cycle(0).await.is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let dir = tempdir().unwrap();
        let (tx, rx) = watch::channel(false);
        let worker = broad_worker(
            StubMarket::default(),
            DedupeState::new(dir.path().join("s.json")),
            Arc::new(RecordingSink::default()),
        );
        let handle = tokio::spawn(worker.run(rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }
}
