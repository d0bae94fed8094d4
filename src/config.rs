use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Re-alert suppression window for the broad scanner.
pub const DEDUPE_COOLDOWN_SECS: f64 = 3600.0;
/// Upper bound on every honeypot / metadata call.
pub const SAFETY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// `0` means no alert destination.
    pub admin_chat_id: i64,
    pub chains: Vec<String>,
    pub poll_interval_sec: u64,
    pub watch_interval_sec: u64,
    pub top_k: usize,
    pub min_liq_usd: f64,
    pub min_vol_h1_usd: f64,
    pub score_threshold: f64,
    pub state_file: PathBuf,
    pub watchlist_file: PathBuf,
    pub log_signals: bool,
    pub signals_file: PathBuf,
    pub birdeye_api_key: Option<String>,
    pub dex_base_url: String,
    pub honeypot_url: String,
    pub birdeye_base_url: String,
    pub telegram_api_url: String,
    pub http_timeout: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let chains: Vec<String> = get("CHAINS")
            .unwrap_or_else(|| "solana,bsc".into())
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        Ok(Self {
            bot_token,
            admin_chat_id: parse_or(&get, "ADMIN_CHAT_ID", 0)?,
            chains,
            poll_interval_sec: parse_or(&get, "POLL_INTERVAL_SEC", 600)?,
            watch_interval_sec: parse_or(&get, "WATCH_INTERVAL_SEC", 1800)?,
            top_k: parse_or(&get, "TOP_K", 10)?,
            min_liq_usd: parse_or(&get, "MIN_LIQ_USD", 5000.0)?,
            min_vol_h1_usd: parse_or(&get, "MIN_VOL_H1_USD", 20000.0)?,
            score_threshold: parse_or(&get, "SCORE_THRESHOLD", 0.7)?,
            state_file: get("STATE_FILE").unwrap_or_else(|| "state.json".into()).into(),
            watchlist_file: get("WATCHLIST_FILE")
                .unwrap_or_else(|| "watchlist.jsonl".into())
                .into(),
            log_signals: get("LOG_SIGNALS").map(|v| v.trim() == "1").unwrap_or(true),
            signals_file: get("SIGNALS_FILE").unwrap_or_else(|| "signals.csv".into()).into(),
            birdeye_api_key: get("BIRDEYE_API_KEY"),
            dex_base_url: get("DEX_BASE_URL").unwrap_or_else(|| "https://api.dexscreener.com".into()),
            honeypot_url: get("HONEYPOT_URL")
                .unwrap_or_else(|| "https://api.honeypot.is/v2/IsHoneypot".into()),
            birdeye_base_url: get("BIRDEYE_BASE_URL")
                .unwrap_or_else(|| "https://public-api.birdeye.so".into()),
            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".into()),
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SEC", 25)?),
            port: parse_or(&get, "PORT", 8080)?,
        })
    }

    pub fn alerts_enabled(&self) -> bool {
        self.admin_chat_id != 0
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "abc")])).unwrap();
        assert_eq!(config.chains, vec!["solana", "bsc"]);
        assert_eq!(config.poll_interval_sec, 600);
        assert_eq!(config.watch_interval_sec, 1800);
        assert_eq!(config.top_k, 10);
        assert_eq!(config.min_liq_usd, 5000.0);
        assert_eq!(config.min_vol_h1_usd, 20000.0);
        assert_eq!(config.score_threshold, 0.7);
        assert!(config.log_signals);
        assert!(!config.alerts_enabled());
        assert!(config.birdeye_api_key.is_none());
    }

    #[test]
    fn missing_token_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BOT_TOKEN")));
    }

    #[test]
    fn bad_number_is_rejected() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "abc"), ("TOP_K", "ten")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOP_K", .. }));
    }

    #[test]
    fn chains_are_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "abc"),
            ("CHAINS", " bsc , ,ethereum"),
            ("LOG_SIGNALS", "0"),
            ("ADMIN_CHAT_ID", "-100123"),
        ]))
        .unwrap();
        assert_eq!(config.chains, vec!["bsc", "ethereum"]);
        assert!(!config.log_signals);
        assert_eq!(config.admin_chat_id, -100123);
        assert!(config.alerts_enabled());
    }
}
