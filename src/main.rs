use onchain_radar::{
    api,
    config::Config,
    deduplication::DedupeState,
    market::{MarketFetcher, MarketSource},
    notifier::{AlertSink, TelegramNotifier},
    safety::{SafetyCheck, SafetyChecker},
    scanner::{ScanPipeline, ScanSettings},
    signal::SignalLogger,
    watchlist::Watchlist,
    workers::{BroadScanWorker, WatchWorker},
    Radar,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("onchain_radar=info")),
        )
        .init();

    info!("==================================================");
    info!("  ONCHAIN RADAR");
    info!("==================================================");

    let config = Config::from_env()?;
    info!("Chains: {}", config.chains.join(", "));
    info!(
        "Interval: {}s, Watch: {}s, Score >= {}",
        config.poll_interval_sec, config.watch_interval_sec, config.score_threshold
    );

    let market: Arc<dyn MarketSource> = Arc::new(MarketFetcher::new(&config.dex_base_url, config.http_timeout)?);
    let safety: Arc<dyn SafetyCheck> = Arc::new(SafetyChecker::new(
        &config.honeypot_url,
        &config.birdeye_base_url,
        config.birdeye_api_key.clone(),
    )?);

    let pipeline = Arc::new(ScanPipeline::new(
        market.clone(),
        safety.clone(),
        ScanSettings {
            chains: config.chains.clone(),
            top_k: config.top_k,
            min_liq_usd: config.min_liq_usd,
            min_vol_h1_usd: config.min_vol_h1_usd,
        },
    ));

    let sink: Option<Arc<dyn AlertSink>> = if config.alerts_enabled() {
        Some(Arc::new(TelegramNotifier::new(
            &config.telegram_api_url,
            config.bot_token.clone(),
            config.admin_chat_id,
        )?))
    } else {
        warn!("ADMIN_CHAT_ID not set, alerts will only be logged");
        None
    };
    let signal_log = config
        .log_signals
        .then(|| Arc::new(SignalLogger::new(&config.signals_file)));
    let watchlist = Arc::new(Watchlist::new(&config.watchlist_file));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let broad = BroadScanWorker::new(
        pipeline.clone(),
        DedupeState::load(&config.state_file),
        sink.clone(),
        signal_log.clone(),
        config.score_threshold,
        Duration::from_secs(config.poll_interval_sec),
    );
    let watcher = WatchWorker::new(
        market,
        safety,
        watchlist.clone(),
        sink,
        signal_log,
        config.chains.clone(),
        config.score_threshold,
        Duration::from_secs(config.watch_interval_sec),
    );
    let workers = [
        tokio::spawn(broad.run(shutdown_rx.clone())),
        tokio::spawn(watcher.run(shutdown_rx.clone())),
    ];
    info!("Workers started");

    let radar = Radar::new(
        pipeline,
        watchlist,
        config.poll_interval_sec,
        config.watch_interval_sec,
        config.score_threshold,
    );
    let app = api::router(radar);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("API running on port {}", config.port);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!("Ctrl-C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.changed().await;
        })
        .await?;

    for worker in workers {
        if let Err(e) = worker.await {
            warn!("Worker ended abnormally: {}", e);
        }
    }
    info!("Stopped");
    Ok(())
}
