//! tests/horizon_client_tests.rs
//!
//! Tests for `src/stellar/horizon.rs` against a mocked Horizon server:
//! - load_account (200, 404, 5xx)
//! - submit_transaction (200, 200 with an unreadable body, 400 with result codes, 504)
//! - list_transactions (query parameters, 404 on unfunded accounts)

use httpmock::{Method, MockServer};
use lumen_wallet::core::domain::AccountId;
use lumen_wallet::core::errors::WalletError;
use lumen_wallet::stellar::{HorizonClient, LedgerApi, SignedEnvelope};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

const ACCOUNT: &str = "GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57";

fn client(server: &MockServer) -> HorizonClient {
    HorizonClient::new(&server.base_url(), Duration::from_secs(5)).unwrap()
}

fn account() -> AccountId {
    AccountId::parse(ACCOUNT).unwrap()
}

fn envelope() -> SignedEnvelope {
    SignedEnvelope {
        xdr: "AAAAAgAAAAA=".to_string(),
        hash: "deadbeef".to_string(),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_load_account_parses_sequence_and_native_balance() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::GET).path(format!("/accounts/{}", ACCOUNT));
            then.status(200).json_body(json!({
                "account_id": ACCOUNT,
                "sequence": "103420918407103888",
                "balances": [
                    { "balance": "12.5000000", "asset_type": "credit_alphanum4", "asset_code": "USD" },
                    { "balance": "9999.9999900", "asset_type": "native" }
                ]
            }));
        })
        .await;

    let info = client(&server).load_account(&account()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(info.account_id, ACCOUNT);
    assert_eq!(info.sequence, 103420918407103888);
    assert_eq!(info.native_balance, "9999.9999900");
}

#[tokio::test(flavor = "current_thread")]
async fn test_load_account_missing_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET).path(format!("/accounts/{}", ACCOUNT));
            then.status(404).json_body(json!({
                "type": "https://stellar.org/horizon-errors/not_found",
                "title": "Resource Missing",
                "status": 404
            }));
        })
        .await;

    let err = client(&server).load_account(&account()).await.unwrap_err();
    assert!(matches!(err, WalletError::NotFoundError(_)), "got {:?}", err);
    assert!(!err.is_retryable());
}

#[tokio::test(flavor = "current_thread")]
async fn test_load_account_server_error_is_retryable_network_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET).path(format!("/accounts/{}", ACCOUNT));
            then.status(503).body("maintenance");
        })
        .await;

    let err = client(&server).load_account(&account()).await.unwrap_err();
    assert!(matches!(err, WalletError::NetworkError(_)), "got {:?}", err);
    assert!(err.is_retryable());
}

#[tokio::test(flavor = "current_thread")]
async fn test_submit_success_returns_hash_and_ledger() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::POST)
                .path("/transactions")
                .header("content-type", "application/x-www-form-urlencoded")
                .x_www_form_urlencoded_tuple("tx", "AAAAAgAAAAA=");
            then.status(200).json_body(json!({
                "hash": "abc123",
                "ledger": 4242,
                "successful": true
            }));
        })
        .await;

    let response = client(&server).submit_transaction(&envelope()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.hash, "abc123");
    assert_eq!(response.ledger, Some(4242));
}

#[tokio::test(flavor = "current_thread")]
async fn test_submit_accepted_with_unreadable_body_keeps_envelope_hash() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/transactions");
            then.status(200).body("<html>proxy says ok</html>");
        })
        .await;

    let response = client(&server).submit_transaction(&envelope()).await.unwrap();

    assert_eq!(response.hash, "deadbeef");
    assert_eq!(response.ledger, None);
}

#[tokio::test(flavor = "current_thread")]
async fn test_submit_rejection_carries_result_codes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/transactions");
            then.status(400).json_body(json!({
                "type": "https://stellar.org/horizon-errors/transaction_failed",
                "title": "Transaction Failed",
                "status": 400,
                "extras": {
                    "result_codes": {
                        "transaction": "tx_failed",
                        "operations": ["op_underfunded"]
                    }
                }
            }));
        })
        .await;

    let err = client(&server).submit_transaction(&envelope()).await.unwrap_err();
    assert_eq!(
        err,
        WalletError::TransactionRejected {
            result_code: "tx_failed".to_string(),
            operation_codes: vec!["op_underfunded".to_string()],
        }
    );
    assert!(err.is_ledger_rejection());
}

#[tokio::test(flavor = "current_thread")]
async fn test_submit_bad_request_without_extras_uses_problem_type() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/transactions");
            then.status(400).json_body(json!({
                "type": "https://stellar.org/horizon-errors/transaction_malformed",
                "title": "Transaction Malformed",
                "status": 400
            }));
        })
        .await;

    let err = client(&server).submit_transaction(&envelope()).await.unwrap_err();
    match err {
        WalletError::TransactionRejected {
            result_code,
            operation_codes,
        } => {
            assert_eq!(result_code, "transaction_malformed");
            assert!(operation_codes.is_empty());
        }
        other => panic!("expected a rejection, got {:?}", other),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_submit_gateway_timeout_is_timeout_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/transactions");
            then.status(504).json_body(json!({
                "type": "https://stellar.org/horizon-errors/timeout",
                "title": "Timeout",
                "status": 504
            }));
        })
        .await;

    let err = client(&server).submit_transaction(&envelope()).await.unwrap_err();
    assert!(matches!(err, WalletError::TimeoutError(_)), "got {:?}", err);
    assert!(err.is_retryable());
}

#[tokio::test(flavor = "current_thread")]
async fn test_list_transactions_sends_limit_and_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path(format!("/accounts/{}/transactions", ACCOUNT))
                .query_param("limit", "5")
                .query_param("order", "desc");
            then.status(200).json_body(json!({
                "_embedded": {
                    "records": [
                        {
                            "hash": "bbb",
                            "ledger": 20,
                            "created_at": "2024-05-02T10:00:00Z",
                            "source_account": ACCOUNT,
                            "fee_charged": "100",
                            "operation_count": 1,
                            "successful": true,
                            "memo_type": "text",
                            "memo": "rent"
                        },
                        {
                            "hash": "aaa",
                            "ledger": 10,
                            "created_at": "2024-05-01T10:00:00Z",
                            "source_account": ACCOUNT,
                            "fee_charged": 200,
                            "operation_count": 2,
                            "successful": false,
                            "memo_type": "none"
                        }
                    ]
                }
            }));
        })
        .await;

    let records = client(&server)
        .list_transactions(&account(), 5)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].hash, "bbb");
    assert_eq!(records[0].memo.as_deref(), Some("rent"));
    assert_eq!(records[1].fee_charged, "200");
    assert!(!records[1].successful);
    assert_eq!(records[1].memo, None);
}

#[tokio::test(flavor = "current_thread")]
async fn test_list_transactions_clamps_limit() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path(format!("/accounts/{}/transactions", ACCOUNT))
                .query_param("limit", "200");
            then.status(200)
                .json_body(json!({ "_embedded": { "records": [] } }));
        })
        .await;

    let records = client(&server)
        .list_transactions(&account(), 10_000)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(records.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn test_list_transactions_unfunded_account_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path(format!("/accounts/{}/transactions", ACCOUNT));
            then.status(404).json_body(json!({ "status": 404 }));
        })
        .await;

    let records = client(&server)
        .list_transactions(&account(), 10)
        .await
        .unwrap();
    assert!(records.is_empty());
}
