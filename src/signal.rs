use crate::error::StoreError;
use crate::types::PairRecord;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const HEADER: [&str; 8] = [
    "ts_utc",
    "chain",
    "pair",
    "symbol",
    "price_usd",
    "liq_usd",
    "vol_h1_usd",
    "score",
];

/// Append-only CSV audit log of emitted alerts. Shared by both workers.
pub struct SignalLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SignalLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn log_pair(&self, pair: &PairRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let needs_header = file.metadata().await?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record(row(pair))?;
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;

        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

fn row(pair: &PairRecord) -> [String; 8] {
    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    [
        Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        pair.chain_id.clone(),
        pair.pair_address.clone(),
        pair.base_symbol.clone(),
        opt(pair.price_usd),
        pair.liquidity_usd.to_string(),
        pair.volume_h1_usd.to_string(),
        pair.score.to_string(),
    ]
}
