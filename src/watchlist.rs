use crate::error::StoreError;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// User-registered token addresses, one per line, append-only.
pub struct Watchlist {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Watchlist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Distinct addresses in first-seen order. A missing file is an empty list.
    pub async fn load(&self) -> Result<Vec<String>, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut seen = HashSet::new();
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|t| !t.is_empty() && seen.insert(*t))
            .map(str::to_string)
            .collect())
    }

    /// Returns `false` when the address is blank or already registered.
    pub async fn register(&self, address: &str) -> Result<bool, StoreError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(false);
        }

        let _guard = self.write_lock.lock().await;
        if self.load().await?.iter().any(|t| t == address) {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", address).as_bytes()).await?;
        file.flush().await?;
        info!("[Watchlist] Registered {}", address);
        Ok(true)
    }
}
