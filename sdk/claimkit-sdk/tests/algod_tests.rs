use claimkit_sdk::advanced::transaction::Transaction;
use claimkit_sdk::types::{StateValue, SuggestedParams};
use claimkit_sdk::{
    AbiValue, AlgodGateway, AppSpec, CallOptions, ClaimSdkError, ClaimSigner, ClaimWorkflow,
    ContractClient, FeePolicy, LedgerGateway, TxId,
};
use serde_json::json;
use wiremock::matchers::{body_bytes, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{test_account, APP_ID};

const TESTNET_GENESIS_HASH: &str = "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=";

async fn mount_json(server: &MockServer, verb: &str, route: &str, body: serde_json::Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, last_round: u64) {
    mount_json(server, "GET", "/v2/status", json!({ "last-round": last_round })).await;
    mount_json(
        server,
        "GET",
        &format!("/v2/status/wait-for-block-after/{}", last_round),
        json!({ "last-round": last_round + 1 }),
    )
    .await;
}

async fn mount_params(server: &MockServer, fee_per_byte: u64) {
    mount_json(
        server,
        "GET",
        "/v2/transactions/params",
        json!({
            "consensus-version": "future",
            "fee": fee_per_byte,
            "genesis-hash": TESTNET_GENESIS_HASH,
            "genesis-id": "testnet-v1.0",
            "last-round": 100,
            "min-fee": 1000
        }),
    )
    .await;
}

fn sample_params() -> SuggestedParams {
    SuggestedParams {
        fee_per_byte: 0,
        min_fee: 1_000,
        first_valid: 100,
        last_valid: 1_100,
        genesis_id: "testnet-v1.0".to_string(),
        genesis_hash: [7u8; 32],
    }
}

#[tokio::test]
async fn test_suggested_params_are_decoded() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_params(&server, 0).await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let params = gateway.suggested_params().await?;

    assert_eq!(params.fee_per_byte, 0);
    assert_eq!(params.min_fee, 1000);
    assert_eq!(params.first_valid, 100);
    assert_eq!(params.last_valid, 1100);
    assert_eq!(params.genesis_id, "testnet-v1.0");
    assert_eq!(params.genesis_hash[0], 0x48);
    Ok(())
}

#[tokio::test]
async fn test_algod_token_is_sent() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/status"))
        .and(header("X-Algo-API-Token", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last-round": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = AlgodGateway::new(&server.uri(), Some("s3cret".to_string()))?;
    assert_eq!(gateway.last_round().await?, 42);
    Ok(())
}

#[tokio::test]
async fn test_global_state_is_decoded() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        &format!("/v2/applications/{}", APP_ID),
        json!({
            "id": APP_ID,
            "params": {
                "creator": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ",
                "global-state": [
                    { "key": "YXNzZXQ=", "value": { "type": 2, "uint": 12345, "bytes": "" } },
                    { "key": "b3duZXI=", "value": { "type": 1, "uint": 0, "bytes": "AQID" } }
                ]
            }
        }),
    )
    .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let contract = ContractClient::new(gateway, APP_ID, AppSpec::default_claim_spec()?);
    let snapshot = contract.read_global_state().await?;

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get("asset"), Some(&StateValue::Uint(12345)));
    assert_eq!(snapshot.get("owner"), Some(&StateValue::Bytes(vec![1, 2, 3])));
    Ok(())
}

#[tokio::test]
async fn test_malformed_state_key_is_a_decode_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        &format!("/v2/applications/{}", APP_ID),
        json!({
            "id": APP_ID,
            "params": {
                "global-state": [
                    { "key": "not base64!", "value": { "type": 2, "uint": 1, "bytes": "" } }
                ]
            }
        }),
    )
    .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let err = gateway.application_global_state(APP_ID).await.unwrap_err();

    assert!(matches!(err, ClaimSdkError::StateDecode { ref key, .. } if key == "not base64!"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_application_maps_to_network_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/applications/1"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "message": "application does not exist" })),
        )
        .mount(&server)
        .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    assert!(matches!(
        gateway.application_global_state(1).await,
        Err(ClaimSdkError::NotFound(ref m)) if m == "application does not exist"
    ));

    let contract = ContractClient::new(gateway, 1, AppSpec::default_claim_spec()?);
    let err = contract.read_global_state().await.unwrap_err();
    assert!(matches!(err, ClaimSdkError::Network(ref m) if m.contains("application 1")));
    Ok(())
}

#[tokio::test]
async fn test_server_errors_are_network_errors() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/status"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let err = gateway.last_round().await.unwrap_err();

    assert!(matches!(err, ClaimSdkError::Network(ref m) if m == "HTTP 503: upstream unavailable"));
    assert!(err.is_transient());
    Ok(())
}

#[tokio::test]
async fn test_node_holdings() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let address = test_account().address();
    Mock::given(method("GET"))
        .and(path(format!("/v2/accounts/{}", address)))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": address.to_string(),
            "amount": 1_000_000,
            "assets": [
                { "asset-id": 12345, "amount": 0, "is-frozen": false },
                { "asset-id": 777, "amount": 5, "is-frozen": false }
            ]
        })))
        .mount(&server)
        .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let holdings = gateway.account_holdings(&address).await?;

    assert_eq!(holdings.into_iter().collect::<Vec<_>>(), vec![777, 12345]);
    assert!(claimkit_sdk::is_opted_in(&gateway, &address, 12345).await?);
    assert!(!claimkit_sdk::is_opted_in(&gateway, &address, 1).await?);
    Ok(())
}

#[tokio::test]
async fn test_unknown_account_is_reported() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let address = test_account().address();
    Mock::given(method("GET"))
        .and(path(format!("/v2/accounts/{}", address)))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "no accounts found" })),
        )
        .mount(&server)
        .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let err = gateway.account_holdings(&address).await.unwrap_err();

    assert!(matches!(err, ClaimSdkError::AccountNotFound(a) if a == address));
    Ok(())
}

#[tokio::test]
async fn test_indexer_holdings_follow_pagination() -> anyhow::Result<()> {
    let algod = MockServer::start().await;
    let indexer = MockServer::start().await;
    let address = test_account().address();
    let route = format!("/v2/accounts/{}/assets", address);

    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .and(query_param_is_missing("next"))
        .and(header("X-Indexer-API-Token", "idx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "assets": [
                { "asset-id": 1, "amount": 0 },
                { "asset-id": 2, "amount": 0, "deleted": true }
            ],
            "current-round": 100,
            "next-token": "page-2"
        })))
        .mount(&indexer)
        .await;
    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .and(query_param("next", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "assets": [{ "asset-id": 3, "amount": 10 }],
            "current-round": 100
        })))
        .mount(&indexer)
        .await;

    mount_status(&algod, 100).await;

    let gateway = AlgodGateway::new(&algod.uri(), None)?
        .with_indexer(&indexer.uri(), Some("idx".to_string()));
    let holdings = gateway.account_holdings(&address).await?;

    assert_eq!(holdings.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    let node_reads = algod.received_requests().await.unwrap_or_default();
    assert!(node_reads.iter().all(|r| !r.url.path().starts_with("/v2/accounts")));
    Ok(())
}

#[tokio::test]
async fn test_lagging_indexer_defers_to_node() -> anyhow::Result<()> {
    let algod = MockServer::start().await;
    let indexer = MockServer::start().await;
    let address = test_account().address();

    // opt-in confirmed at round 100 is not indexed yet
    mount_json(
        &indexer,
        "GET",
        &format!("/v2/accounts/{}/assets", address),
        json!({ "assets": [], "current-round": 98 }),
    )
    .await;
    mount_status(&algod, 100).await;
    mount_json(
        &algod,
        "GET",
        &format!("/v2/accounts/{}", address),
        json!({
            "address": address.to_string(),
            "amount": 1_000_000,
            "assets": [{ "asset-id": 12345, "amount": 0, "is-frozen": false }]
        }),
    )
    .await;

    let gateway = AlgodGateway::new(&algod.uri(), None)?.with_indexer(&indexer.uri(), None);

    assert!(claimkit_sdk::is_opted_in(&gateway, &address, 12345).await?);
    Ok(())
}

#[tokio::test]
async fn test_submit_posts_raw_msgpack() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let account = test_account();
    let tx = Transaction::asset_opt_in(account.address(), 12345, &sample_params());
    let signed = account.sign_transaction(&tx).await?;
    let expected_id = signed.id()?;

    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .and(header("content-type", "application/x-binary"))
        .and(body_bytes(signed.encode()?))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "txId": expected_id.as_str() })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    assert_eq!(gateway.submit(&signed).await?, expected_id);
    Ok(())
}

#[tokio::test]
async fn test_submit_refusal_is_a_rejection() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "TransactionPool.Remember: transaction fee too small"
        })))
        .mount(&server)
        .await;

    let account = test_account();
    let tx = Transaction::asset_opt_in(account.address(), 12345, &sample_params());
    let signed = account.sign_transaction(&tx).await?;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let err = gateway.submit(&signed).await.unwrap_err();

    assert!(matches!(err, ClaimSdkError::Rejected(ref m) if m.contains("fee too small")));
    assert!(!err.is_transient());
    Ok(())
}

#[tokio::test]
async fn test_wait_for_confirmation_polls_rounds() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_status(&server, 100).await;

    let pending_path = "/v2/transactions/pending/TXID";
    Mock::given(method("GET"))
        .and(path(pending_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "pool-error": "", "txn": {} })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(pending_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "confirmed-round": 101,
            "pool-error": "",
            "txn": {}
        })))
        .mount(&server)
        .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let receipt = gateway.wait_for_confirmation(&TxId::new("TXID"), 5).await?;

    assert_eq!(receipt.confirmed_round, 101);
    assert_eq!(receipt.tx_id, TxId::new("TXID"));
    Ok(())
}

#[tokio::test]
async fn test_pool_error_is_a_rejection() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_status(&server, 100).await;
    mount_json(
        &server,
        "GET",
        "/v2/transactions/pending/TXID",
        json!({ "pool-error": "overspend", "txn": {} }),
    )
    .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let err = gateway.wait_for_confirmation(&TxId::new("TXID"), 5).await.unwrap_err();

    assert!(matches!(err, ClaimSdkError::Rejected(ref m) if m == "overspend"));
    Ok(())
}

#[tokio::test]
async fn test_call_method_returns_logged_value() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_status(&server, 100).await;
    mount_params(&server, 0).await;
    mount_json(&server, "POST", "/v2/transactions", json!({ "txId": "CALLTX" })).await;
    // return prefix 151f7c75 followed by uint64 42
    mount_json(
        &server,
        "GET",
        "/v2/transactions/pending/CALLTX",
        json!({
            "confirmed-round": 101,
            "pool-error": "",
            "logs": ["ZGVidWc=", "FR98dQAAAAAAAAAq"],
            "txn": {}
        }),
    )
    .await;

    let spec = AppSpec::from_json(
        r#"{
            "contract": {
                "name": "Counter",
                "methods": [{
                    "name": "add",
                    "args": [{"type": "uint64"}],
                    "returns": {"type": "uint64"}
                }]
            }
        }"#,
    )?;
    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let contract = ContractClient::new(gateway, APP_ID, spec);
    let account = test_account();

    let result = contract
        .call_method(
            "add",
            &[AbiValue::Uint64(2)],
            &account,
            FeePolicy::suggested(),
            CallOptions::default(),
        )
        .await?;

    assert_eq!(result.tx_id, TxId::new("CALLTX"));
    assert_eq!(result.confirmed_round, 101);
    assert_eq!(result.return_value, Some(42u64.to_be_bytes().to_vec()));
    Ok(())
}

#[tokio::test]
async fn test_claim_over_http() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let account = test_account();
    let address = account.address();

    mount_status(&server, 100).await;
    mount_params(&server, 0).await;
    mount_json(
        &server,
        "GET",
        &format!("/v2/applications/{}", APP_ID),
        json!({
            "id": APP_ID,
            "params": {
                "global-state": [
                    { "key": "YXNzZXQ=", "value": { "type": 2, "uint": 12345, "bytes": "" } }
                ]
            }
        }),
    )
    .await;
    mount_json(
        &server,
        "GET",
        &format!("/v2/accounts/{}", address),
        json!({ "address": address.to_string(), "amount": 1_000_000, "assets": [] }),
    )
    .await;
    mount_json(&server, "POST", "/v2/transactions", json!({ "txId": "SUBMITTED" })).await;
    mount_json(
        &server,
        "GET",
        "/v2/transactions/pending/SUBMITTED",
        json!({ "confirmed-round": 101, "pool-error": "", "txn": {} }),
    )
    .await;

    let gateway = AlgodGateway::new(&server.uri(), None)?;
    let contract = ContractClient::new(gateway, APP_ID, AppSpec::default_claim_spec()?);
    let receipt = ClaimWorkflow::new(contract, account).run().await?;

    assert_eq!(receipt.asset_id, 12345);
    assert_eq!(receipt.registration_tx, Some(TxId::new("SUBMITTED")));
    assert_eq!(receipt.claim_tx, TxId::new("SUBMITTED"));

    let posts = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 2);
    Ok(())
}
