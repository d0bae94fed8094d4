use crate::chain::ChainKind;
use crate::config::SAFETY_TIMEOUT;
use crate::error::SafetyError;
use crate::types::SafetyVerdict;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Sell tax above this percentage marks a BSC token unsafe.
const MAX_SELL_TAX_PCT: f64 = 10.0;

#[async_trait]
pub trait SafetyCheck: Send + Sync {
    /// Never fails; unfinished checks pass with a diagnostic reason.
    async fn check(&self, chain: &str, token_address: &str) -> SafetyVerdict;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoneypotReport {
    pub is_honeypot: Option<bool>,
    pub sell_tax: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenOverview {
    data: Option<Value>,
}

/// BSC tokens go to honeypot.is, Solana tokens to Birdeye's token overview.
#[derive(Clone)]
pub struct SafetyChecker {
    client: Client,
    honeypot_url: String,
    birdeye_base_url: String,
    birdeye_api_key: Option<String>,
}

impl SafetyChecker {
    pub fn new(
        honeypot_url: &str,
        birdeye_base_url: &str,
        birdeye_api_key: Option<String>,
    ) -> Result<Self, SafetyError> {
        Ok(Self {
            client: Client::builder().timeout(SAFETY_TIMEOUT).build()?,
            honeypot_url: honeypot_url.to_string(),
            birdeye_base_url: birdeye_base_url.trim_end_matches('/').to_string(),
            birdeye_api_key,
        })
    }

    pub async fn check_bsc(&self, token_address: &str) -> Result<SafetyVerdict, SafetyError> {
        let response = self
            .client
            .get(&self.honeypot_url)
            .query(&[("address", token_address)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SafetyError::Status(status.as_u16()));
        }
        let report: HoneypotReport = response.json().await?;
        Ok(evaluate_honeypot(&report))
    }

    /// Non-2xx is reported as `Ok(fail_open("birdeye_<status>"))`, not as an error.
    pub async fn check_solana(&self, token_address: &str) -> Result<SafetyVerdict, SafetyError> {
        let url = format!("{}/defi/token_overview", self.birdeye_base_url);
        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("address", token_address)]);
        if let Some(key) = &self.birdeye_api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Ok(SafetyVerdict::fail_open(format!("birdeye_{}", status.as_u16())));
        }

        let overview: TokenOverview = response.json().await?;
        let mintable = overview
            .data
            .as_ref()
            .and_then(|d| d.get("mintAuthority"))
            .map(is_truthy)
            .unwrap_or(false);
        if mintable {
            return Ok(SafetyVerdict::unsafe_because("mint_authority_enabled"));
        }
        Ok(SafetyVerdict::safe())
    }
}

#[async_trait]
impl SafetyCheck for SafetyChecker {
    async fn check(&self, chain: &str, token_address: &str) -> SafetyVerdict {
        match ChainKind::from_id(chain) {
            ChainKind::Bsc => self.check_bsc(token_address).await.unwrap_or_else(|e| {
                debug!("[Safety] honeypot check failed for {}: {}", token_address, e);
                SafetyVerdict::fail_open("honeypot_api_unavailable")
            }),
            ChainKind::Solana => self.check_solana(token_address).await.unwrap_or_else(|e| {
                debug!("[Safety] birdeye check failed for {}: {}", token_address, e);
                SafetyVerdict::fail_open("birdeye_api_unavailable")
            }),
            ChainKind::Unknown => SafetyVerdict::fail_open("unknown_chain"),
        }
    }
}

pub fn evaluate_honeypot(report: &HoneypotReport) -> SafetyVerdict {
    let is_honeypot = report.is_honeypot.unwrap_or(false);
    let sell_tax = report.sell_tax.as_ref().and_then(as_number).unwrap_or(0.0);
    if is_honeypot || sell_tax > MAX_SELL_TAX_PCT {
        return SafetyVerdict::unsafe_because(format!("honeypot/tax:{}", sell_tax));
    }
    SafetyVerdict::safe()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Birdeye reports the authority as a bool or as the authority's address.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}
