//! Tests for the TRON node provider against a mocked node

use std::time::Duration;

use ethers_core::abi::{encode, Token};
use ethers_core::types::U256;
use mockito::{mock, Matcher};
use serde_json::json;

use slate_agent::{
    blockchain::{provider::ChainProvider, trongrid::TronGridProvider},
    error::ProviderError,
};

const ACCOUNT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

fn provider(account: Option<&str>) -> TronGridProvider {
    TronGridProvider::new(
        &mockito::server_url(),
        Some("test-key".to_string()),
        account.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn reads_account_with_api_key() {
    let m = mock("POST", "/wallet/getaccount")
        .match_header("TRON-PRO-API-KEY", "test-key")
        .match_body(Matcher::PartialJson(json!({"address": ACCOUNT, "visible": true})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "balance": 4_200_000,
                "frozenV2": [{"amount": 1_000_000}, {"type": "ENERGY", "amount": 2_000_000}],
                "owner_permission": {"threshold": 1, "keys": [{"address": ACCOUNT, "weight": 1}]},
                "active_permission": [{"threshold": 1}]
            })
            .to_string(),
        )
        .expect(2)
        .create();

    let p = provider(Some(ACCOUNT));
    assert_eq!(p.get_balance(ACCOUNT).await.unwrap(), 4_200_000);
    let info = p.get_account(ACCOUNT).await.unwrap();
    assert_eq!(info.frozen_for_bandwidth_sun, 1_000_000);
    assert_eq!(info.frozen_for_energy_sun, 2_000_000);
    assert_eq!(info.owner_keys, 1);
    m.assert();
}

#[tokio::test]
async fn reads_resources_with_missing_counters() {
    let _m = mock("POST", "/wallet/getaccountresource")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"freeNetLimit": 600, "freeNetUsed": 12}).to_string())
        .create();

    let resources = provider(Some(ACCOUNT))
        .get_account_resources(ACCOUNT)
        .await
        .unwrap();
    assert_eq!(resources.free_net_limit, 600);
    assert_eq!(resources.free_net_used, 12);
    assert_eq!(resources.energy_limit, 0);
}

#[tokio::test]
async fn constant_call_returns_abi_bytes() {
    let encoded = encode(&[Token::Uint(U256::from(123_456u64))]);
    let _m = mock("POST", "/wallet/triggerconstantcontract")
        .match_body(Matcher::PartialJson(json!({
            "owner_address": ACCOUNT,
            "function_selector": "supplyRatePerBlock()",
            "parameter": "",
            "visible": true
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "result": {"result": true},
                "constant_result": [hex::encode(&encoded)]
            })
            .to_string(),
        )
        .create();

    let raw = provider(Some(ACCOUNT))
        .call_read_only("TXYZjTokenAddress", "supplyRatePerBlock()", &[])
        .await
        .unwrap();
    assert_eq!(raw, encoded);
}

#[tokio::test]
async fn node_errors_are_typed() {
    let _m = mock("POST", "/wallet/getaccount")
        .with_status(429)
        .with_body("rate limited")
        .create();
    let err = provider(Some(ACCOUNT)).get_balance(ACCOUNT).await.unwrap_err();
    assert!(matches!(err, ProviderError::Http { status: 429, .. }));
}

#[tokio::test]
async fn access_requires_a_configured_account() {
    let p = provider(None);
    assert!(!p.ready());
    assert!(matches!(p.request_access().await, Err(ProviderError::AccessDenied)));

    let p = provider(Some(ACCOUNT));
    assert!(p.ready());
    assert!(p.request_access().await.is_ok());
    assert_eq!(p.node_host(), "127.0.0.1");
}
