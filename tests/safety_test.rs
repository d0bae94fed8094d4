use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use onchain_radar::{
    safety::{SafetyCheck, SafetyChecker},
    types::SafetyVerdict,
};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Birdeye token overview keyed by address, plus a healthy and a broken
/// honeypot.is endpoint.
async fn spawn_safety_services() -> String {
    let app = Router::new()
        .route(
            "/defi/token_overview",
            get(|headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                let address = q.get("address").cloned().unwrap_or_default();
                let body = match address.as_str() {
                    "Missing111" => return (StatusCode::NOT_FOUND, Json(json!({"success": false}))),
                    "Keyed111" if headers.get("x-api-key").is_none() => {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"success": false})))
                    }
                    "Mintable111" => json!({"data": {"mintAuthority": "Auth1111"}}),
                    "Flagged111" => json!({"data": {"mintAuthority": true}}),
                    _ => json!({"data": {"mintAuthority": null}}),
                };
                (StatusCode::OK, Json(body))
            }),
        )
        .route(
            "/ok/IsHoneypot",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let tax: Value = match q.get("address").map(String::as_str) {
                    Some("0xtaxed") => json!("45"),
                    _ => json!(2),
                };
                Json(json!({"isHoneypot": false, "sellTax": tax}))
            }),
        )
        .route(
            "/broken/IsHoneypot",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn checker(base: &str, honeypot_path: &str, key: Option<&str>) -> SafetyChecker {
    SafetyChecker::new(
        &format!("{}{}", base, honeypot_path),
        base,
        key.map(str::to_string),
    )
    .unwrap()
}

#[tokio::test]
async fn solana_status_error_fails_open_with_status_reason() {
    let base = spawn_safety_services().await;
    let safety = checker(&base, "/ok/IsHoneypot", None);

    assert_eq!(
        safety.check("solana", "Missing111").await,
        SafetyVerdict::fail_open("birdeye_404")
    );
    assert_eq!(
        safety.check("sol", "Keyed111").await,
        SafetyVerdict::fail_open("birdeye_401")
    );
}

#[tokio::test]
async fn solana_api_key_is_sent() {
    let base = spawn_safety_services().await;
    let safety = checker(&base, "/ok/IsHoneypot", Some("secret"));

    assert_eq!(safety.check("solana", "Keyed111").await, SafetyVerdict::safe());
}

#[tokio::test]
async fn solana_mint_authority_marks_unsafe() {
    let base = spawn_safety_services().await;
    let safety = checker(&base, "/ok/IsHoneypot", None);

    for token in ["Mintable111", "Flagged111"] {
        assert_eq!(
            safety.check("solana", token).await,
            SafetyVerdict::unsafe_because("mint_authority_enabled"),
            "{token}"
        );
    }
    assert_eq!(safety.check("SOLANA", "Renounced111").await, SafetyVerdict::safe());
}

#[tokio::test]
async fn bsc_server_error_fails_open() {
    let base = spawn_safety_services().await;
    let safety = checker(&base, "/broken/IsHoneypot", None);

    assert_eq!(
        safety.check("bsc", "0xabc").await,
        SafetyVerdict::fail_open("honeypot_api_unavailable")
    );
    assert!(safety.check_bsc("0xabc").await.is_err());
}

#[tokio::test]
async fn bsc_report_is_evaluated() {
    let base = spawn_safety_services().await;
    let safety = checker(&base, "/ok/IsHoneypot", None);

    assert_eq!(safety.check("binance", "0xabc").await, SafetyVerdict::safe());
    assert_eq!(
        safety.check("bsc", "0xtaxed").await,
        SafetyVerdict::unsafe_because("honeypot/tax:45")
    );
}
