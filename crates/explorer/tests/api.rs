//! Router-level tests over in-memory storage and a static chain client.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use cosmex_chain_client::{ChainMethod, StaticChainClient};
use cosmex_explorer::{build_router, ListingLimits, QueryFacade, StatusCache};
use cosmex_pagination::PageLimits;
use cosmex_storage::{BlockRepository, MemoryStorage, ValidatorRepository};
use cosmex_types::{
    AccountInfo, AccountKind, BlockSummary, ChainConfig, Coin, DecCoin, Delegation,
    MissedBlockRecord, ValidatorIdentity, ValidatorStatus,
};
use cosmex_validator_resolution::encode_bech32;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const GENESIS_TIME: i64 = 1_700_000_000;
const HEAD: u64 = 200;

struct TestApp {
    app: Router,
    storage: MemoryStorage,
    chain: StaticChainClient,
    status: Arc<StatusCache>,
}

fn module_address() -> String {
    encode_bech32("cosmos", &[0xAA; 20]).unwrap()
}

fn test_app() -> TestApp {
    let storage = MemoryStorage::new();
    let chain = StaticChainClient::new();
    let status = Arc::new(StatusCache::new("cosmoshub-4"));
    let module = module_address();
    let config = ChainConfig::default().with_module_account(module.as_str(), "distribution");

    let facade = QueryFacade::new(
        Arc::new(storage.clone()),
        Arc::new(chain.clone()),
        Arc::new(config),
        status.clone(),
        ListingLimits {
            blocks: PageLimits::new(3, 5),
            missed_blocks: PageLimits::new(2, 4),
        },
    );
    TestApp {
        app: build_router(facade),
        storage,
        chain,
        status,
    }
}

fn identity(seed: u8, moniker: &str, status: ValidatorStatus) -> ValidatorIdentity {
    ValidatorIdentity {
        operator_address: encode_bech32("cosmosvaloper", &[seed; 20]).unwrap(),
        consensus_pubkey: encode_bech32("cosmosvalconspub", &[seed; 37]).unwrap(),
        account_address: encode_bech32("cosmos", &[seed; 20]).unwrap(),
        proposer_hex_address: format!("{seed:02X}").repeat(20),
        moniker: moniker.to_string(),
        status,
    }
}

fn block_time(height: u64) -> DateTime<Utc> {
    DateTime::from_timestamp(GENESIS_TIME + height as i64 * 6, 0).unwrap()
}

/// Two validators, blocks 1..=200, and misses for the bonded one at
/// 98 and 199 (outside the window) plus 150 and 198 (inside).
fn seeded_app() -> TestApp {
    let t = test_app();
    t.storage
        .upsert_validator(identity(1, "Alpha Node", ValidatorStatus::Bonded))
        .unwrap();
    t.storage
        .upsert_validator(identity(2, "Bravo", ValidatorStatus::Unbonded))
        .unwrap();
    for height in 1..=HEAD {
        t.storage
            .store_block(BlockSummary {
                height,
                hash: format!("{height:064X}"),
                time: block_time(height),
                proposer_hex_address: "01".repeat(20),
                tx_count: (height % 7) as u32,
            })
            .unwrap();
    }
    for height in [98, 150, 198, 199] {
        t.storage
            .record_missed_block(MissedBlockRecord::new("01".repeat(20), height))
            .unwrap();
    }
    t
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

fn heights(page: &Value) -> Vec<u64> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["height"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_reports_version() {
    let t = test_app();
    let (status, body) = get(&t.app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn validator_resolves_from_every_address_form() {
    let t = seeded_app();
    let alpha = identity(1, "Alpha Node", ValidatorStatus::Bonded);
    let consensus_address = encode_bech32("cosmosvalcons", &[1; 20]).unwrap();

    let forms = [
        (alpha.operator_address.clone(), "operator"),
        (alpha.account_address.clone(), "account"),
        (alpha.consensus_pubkey.clone(), "consensus_pubkey"),
        (consensus_address.clone(), "consensus_address"),
        (alpha.proposer_hex_address.to_lowercase(), "proposer_hex"),
        ("Alpha%20Node".to_string(), "moniker"),
    ];
    for (form, method) in forms {
        let (status, body) = get(&t.app, &format!("/api/validator/{form}")).await;
        assert_eq!(status, StatusCode::OK, "{form}");
        assert_eq!(body["operatorAddress"], alpha.operator_address.as_str());
        assert_eq!(body["consensusAddress"], consensus_address.as_str());
        assert_eq!(body["moniker"], "Alpha Node");
        assert_eq!(body["resolvedBy"], method);
    }
}

#[tokio::test]
async fn unknown_or_malformed_validators_are_not_found() {
    let t = seeded_app();
    let mut corrupted = identity(1, "", ValidatorStatus::Bonded).operator_address;
    let last = corrupted.pop().unwrap();
    corrupted.push(if last == 'q' { 'p' } else { 'q' });
    let unknown_hex = "FF".repeat(20);

    for id in ["Nobody", corrupted.as_str(), unknown_hex.as_str()] {
        let (status, body) = get(&t.app, &format!("/api/validator/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{id}");
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }
}

#[tokio::test]
async fn uptime_counts_misses_inside_the_window() {
    let t = seeded_app();
    let (status, body) = get(&t.app, "/api/validator/Alpha%20Node/uptime").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["missedCount"], 2);
    assert_eq!(body["overBlocks"], 100);
    assert_eq!(body["uptimePercent"], 98.0);

    let (status, body) = get(&t.app, "/api/validator/Bravo/uptime").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["missedCount"], 100);
    assert_eq!(body["uptimePercent"], 0.0);
}

#[tokio::test]
async fn missed_blocks_are_paginated_newest_first() {
    let t = seeded_app();
    let (status, page) = get(&t.app, "/api/validator/Alpha%20Node/missed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(heights(&page), vec![199, 198]);
    assert_eq!(page["hasMore"], true);

    let (_, page) = get(&t.app, "/api/validator/Alpha%20Node/missed?before=150&limit=4").await;
    assert_eq!(heights(&page), vec![98]);
    assert_eq!(page["hasMore"], false);

    let (status, body) = get(&t.app, "/api/validator/Alpha%20Node/missed?limit=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exceeds maximum"));
}

#[tokio::test]
async fn blocks_listing_honors_cursors() {
    let t = seeded_app();
    let (status, page) = get(&t.app, "/api/blocks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(heights(&page), vec![200, 199, 198]);
    assert_eq!(page["hasMore"], true);

    let (_, page) = get(&t.app, "/api/blocks?after=197&limit=2").await;
    assert_eq!(heights(&page), vec![199, 198]);
    assert_eq!(page["hasMore"], true);

    let (_, page) = get(&t.app, "/api/blocks?offset=198&limit=5").await;
    assert_eq!(heights(&page), vec![2, 1]);
    assert_eq!(page["hasMore"], false);

    for bad in ["/api/blocks?limit=abc", "/api/blocks?limit=0", "/api/blocks?offset=20000"] {
        let (status, body) = get(&t.app, bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn status_reflects_the_last_refresh() {
    let t = seeded_app();
    let (_, body) = get(&t.app, "/api/status").await;
    assert_eq!(body["chainId"], "cosmoshub-4");
    assert_eq!(body["latestHeight"], 0);
    assert_eq!(body["latestBlockTime"], Value::Null);

    t.status.refresh_from(&t.storage).unwrap();
    let (status, body) = get(&t.app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latestHeight"], HEAD);
    assert_eq!(body["latestBlockTime"], serde_json::to_value(block_time(HEAD)).unwrap());
}

#[tokio::test]
async fn balance_is_evaluated_at_the_indexed_head() {
    let t = seeded_app();
    let alpha = identity(1, "Alpha Node", ValidatorStatus::Bonded);
    t.chain.add_account(AccountInfo {
        address: alpha.account_address.clone(),
        kind: AccountKind::Base,
    });
    t.chain
        .set_balance(&alpha.account_address, vec![Coin::new("uatom", 1_000)]);
    t.chain.set_commission(
        &alpha.operator_address,
        vec![DecCoin::new("uatom", "12.9".parse().unwrap())],
    );

    // Before the first refresh the head is read from the index directly.
    let uri = format!("/api/account/{}/balance", alpha.account_address);
    let (status, body) = get(&t.app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["height"], HEAD);
    assert_eq!(body["asOf"], serde_json::to_value(block_time(HEAD)).unwrap());
    assert_eq!(body["available"], json!({ "denom": "uatom", "amount": "1000" }));
    assert_eq!(body["commission"]["amount"], "13");
    assert_eq!(body["total"]["amount"], "1013");
    assert_eq!(body["moduleAccount"], Value::Null);

    t.status.refresh_from(&t.storage).unwrap();
    let (_, cached) = get(&t.app, &uri).await;
    assert_eq!(cached["asOf"], body["asOf"]);
}

#[tokio::test]
async fn module_accounts_are_labelled() {
    let t = seeded_app();
    let module = module_address();
    t.chain.add_account(AccountInfo {
        address: module.clone(),
        kind: AccountKind::Module {
            name: "distribution".to_string(),
        },
    });

    let (status, body) = get(&t.app, &format!("/api/account/{module}/balance")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["moduleAccount"], "distribution");
    assert_eq!(body["total"]["amount"], "0");
}

#[tokio::test]
async fn balance_errors_map_to_status_codes() {
    let t = seeded_app();
    let alpha = identity(1, "Alpha Node", ValidatorStatus::Bonded);

    let (status, _) = get(&t.app, &format!("/api/account/{}/balance", alpha.operator_address)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&t.app, &format!("/api/account/{}/balance", alpha.account_address)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    t.chain.fail(ChainMethod::Account);
    let (status, body) = get(&t.app, &format!("/api/account/{}/balance", alpha.account_address)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "upstream unavailable");
}

#[tokio::test]
async fn balance_needs_an_indexed_block() {
    let t = test_app();
    let holder = encode_bech32("cosmos", &[3; 20]).unwrap();
    t.chain.add_account(AccountInfo {
        address: holder.clone(),
        kind: AccountKind::Base,
    });

    let (status, _) = get(&t.app, &format!("/api/account/{holder}/balance")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn delegations_are_enriched() {
    let t = seeded_app();
    let alpha = identity(1, "Alpha Node", ValidatorStatus::Bonded);
    let holder = encode_bech32("cosmos", &[9; 20]).unwrap();
    t.chain.add_delegation(Delegation {
        delegator_address: holder.clone(),
        validator_address: alpha.operator_address.clone(),
        shares: "500".parse().unwrap(),
        balance: Some(Coin::new("uatom", 500)),
    });

    let (status, body) = get(&t.app, &format!("/api/account/{holder}/delegations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["moniker"], "Alpha Node");
    assert_eq!(body[0]["amount"]["amount"], "500");
    assert_eq!(body[0]["rewards"], json!([{ "denom": "uatom", "amount": "0" }]));
}
