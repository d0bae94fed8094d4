use crate::error::NotifyError;
use crate::scorer::{age_minutes, buys_sells};
use crate::types::PairRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

pub const BATCH_HEADER: &str = "🚨 *New candidates*";
pub const WATCH_HEADER: &str = "👁️ *Watch alert*";

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Sends alerts to a single chat through the Bot API.
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, bot_token: String, chat_id: i64) -> Result<Self, NotifyError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
        })
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": false,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("[Telegram] sendMessage rejected: {} {}", status, body);
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }
        debug!("[Telegram] delivered {} chars to {}", text.len(), self.chat_id);
        Ok(())
    }
}

/// `$1.23M`, `$12.3K`, `$123`.
pub fn fmt_usd(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${:.0}", value)
    }
}

pub fn format_pair_row(pair: &PairRecord, now_ms: i64) -> String {
    let symbol = if pair.base_symbol.is_empty() { "?" } else { pair.base_symbol.as_str() };
    let price = pair
        .price_usd
        .or(pair.price_native)
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".into());
    let age = age_minutes(pair.pair_created_at, now_ms) as u64;
    let (buys, sells) = buys_sells(pair);

    format!(
        "*{}* • 💵Price: `{}` • 📈Vol1h: {} • 💧Liq: {}\n\
         🕒Age: {}m • 🛒{}/🛍️{} • FDV: {} • ⚙️Score: *{:.2}*\n\
         [DexScreener]({})",
        symbol,
        price,
        fmt_usd(pair.volume_h1_usd),
        fmt_usd(pair.liquidity_usd),
        age,
        buys,
        sells,
        fmt_usd(pair.fdv.unwrap_or(0.0)),
        pair.score,
        pair.url.as_deref().unwrap_or(""),
    )
}

pub fn format_batch(alerts: &[PairRecord], now_ms: i64) -> String {
    let rows: Vec<String> = alerts.iter().map(|p| format_pair_row(p, now_ms)).collect();
    format!("{}\n\n{}", BATCH_HEADER, rows.join("\n\n"))
}

pub fn format_watch_alert(pair: &PairRecord, now_ms: i64) -> String {
    format!("{}\n\n{}", WATCH_HEADER, format_pair_row(pair, now_ms))
}
