use crate::config::DEDUPE_COOLDOWN_SECS;
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    sent: HashMap<String, f64>,
}

/// Last alert time per pair address, persisted as `{"sent": {...}}`.
///
/// Owned by the broad scanner; nothing else mutates or saves it.
#[derive(Debug)]
pub struct DedupeState {
    path: PathBuf,
    sent: HashMap<String, f64>,
}

impl DedupeState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sent: HashMap::new(),
        }
    }

    /// Missing or unreadable files yield an empty state. Startup only.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut state = Self::new(path);
        if !state.path.exists() {
            info!("[State] No state file at {:?}, starting fresh", state.path);
            return state;
        }
        match read_state(&state.path) {
            Ok(sent) => {
                info!("[State] Loaded {} alerted pairs from {:?}", sent.len(), state.path);
                state.sent = sent;
            }
            Err(e) => warn!("[State] Failed to load {:?}: {}", state.path, e),
        }
        state
    }

    /// True when `pair_address` was never alerted or its cooldown has passed.
    pub fn should_alert(&self, pair_address: &str, now: f64) -> bool {
        match self.sent.get(pair_address) {
            Some(&last) => now - last > DEDUPE_COOLDOWN_SECS,
            None => true,
        }
    }

    pub fn mark_sent(&mut self, pair_address: &str, now: f64) {
        self.sent.insert(pair_address.to_string(), now);
    }

    pub fn last_sent(&self, pair_address: &str) -> Option<f64> {
        self.sent.get(pair_address).copied()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a sibling temp file and renames it into place, so a failed
    /// save leaves the previous file intact.
    pub async fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(&StateFile {
            sent: self.sent.clone(),
        })?;

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

fn read_state(path: &Path) -> Result<HashMap<String, f64>, StoreError> {
    let contents = fs::read_to_string(path)?;
    let file: StateFile = serde_json::from_str(&contents)?;
    Ok(file.sent)
}
