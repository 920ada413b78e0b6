//! tests/session_tests.rs
//!
//! Connection handshake, balance and history through `WalletSession`.

use chrono::{TimeZone, Utc};
use lumen_wallet::core::config::WalletConfig;
use lumen_wallet::core::domain::{AccountId, Network};
use lumen_wallet::core::errors::WalletError;
use lumen_wallet::service::{ConnectionState, WalletSession};
use lumen_wallet::stellar::mock::{MockLedger, MockSigner};
use lumen_wallet::stellar::TransactionRecord;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const SOURCE: &str = "GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57";

fn session_with(signer: MockSigner, ledger: Arc<MockLedger>) -> WalletSession {
    WalletSession::new(
        WalletConfig::for_network(Network::Testnet),
        ledger,
        Arc::new(signer),
    )
}

fn funded_ledger() -> Arc<MockLedger> {
    let ledger = Arc::new(MockLedger::new());
    ledger.add_account(SOURCE, 100, "50.0000000");
    ledger
}

fn record(hash: &str, ledger: u32) -> TransactionRecord {
    TransactionRecord {
        hash: hash.to_string(),
        ledger,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        source_account: SOURCE.to_string(),
        fee_charged: "100".to_string(),
        operation_count: 1,
        successful: true,
        memo: None,
    }
}

#[tokio::test]
async fn test_connect_loads_account_and_balance() {
    let mut session = session_with(MockSigner::new([7u8; 32]), funded_ledger());

    let account = session.connect().await.unwrap();

    assert_eq!(account.as_str(), SOURCE);
    assert_eq!(
        session.connection(),
        &ConnectionState::Connected {
            account: account.clone(),
            network: Network::Testnet,
        }
    );
    assert_eq!(session.balance().await.as_deref(), Some("50.0000000"));
}

#[tokio::test]
async fn test_connect_without_signer_fails() {
    let ledger = funded_ledger();
    let mut session = session_with(MockSigner::new([7u8; 32]).unavailable(), ledger.clone());

    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, WalletError::SignerUnavailable(_)), "got {:?}", err);
    assert_eq!(session.account(), None);
    assert_eq!(ledger.total_calls(), 0);
}

#[tokio::test]
async fn test_connect_permission_denied() {
    let mut session = session_with(
        MockSigner::new([7u8; 32]).denying_permission(),
        funded_ledger(),
    );
    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, WalletError::PermissionDenied(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_connect_network_mismatch() {
    let mut session = session_with(
        MockSigner::new([7u8; 32]).on_network("PUBLIC"),
        funded_ledger(),
    );

    let err = session.connect().await.unwrap_err();

    assert_eq!(
        err,
        WalletError::NetworkMismatch {
            expected: "TESTNET".to_string(),
            actual: "PUBLIC".to_string(),
        }
    );
    assert_eq!(session.connection(), &ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connect_unknown_network_name_is_mismatch() {
    let mut session = session_with(
        MockSigner::new([7u8; 32]).on_network("STANDALONE"),
        funded_ledger(),
    );
    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, WalletError::NetworkMismatch { .. }));
}

#[tokio::test]
async fn test_connect_unfunded_account_still_connects() {
    let ledger = Arc::new(MockLedger::new());
    let mut session = session_with(MockSigner::new([7u8; 32]), ledger);

    session.connect().await.unwrap();

    assert!(session.account().is_some());
    assert_eq!(session.balance().await, None);
    let err = session.refresh_balance().await.unwrap_err();
    assert!(matches!(err, WalletError::NotFoundError(_)));
}

#[tokio::test]
async fn test_refresh_balance_requires_connection() {
    let session = session_with(MockSigner::new([7u8; 32]), funded_ledger());
    let err = session.refresh_balance().await.unwrap_err();
    assert!(matches!(err, WalletError::ValidationError(_)));
}

#[tokio::test]
async fn test_history_uses_configured_limit_and_clamps() {
    let ledger = funded_ledger();
    let records: Vec<_> = (0..15).rev().map(|i| record(&format!("h{}", i), i)).collect();
    ledger.set_history(SOURCE, records);
    let mut session = session_with(MockSigner::new([7u8; 32]), ledger.clone());
    session.connect().await.unwrap();

    let default_page = session.history(None).await.unwrap();
    assert_eq!(default_page.len(), 10);
    assert_eq!(default_page[0].hash, "h14");

    let one = session.history(Some(0)).await.unwrap();
    assert_eq!(one.len(), 1);

    let all = session.history(Some(5000)).await.unwrap();
    assert_eq!(all.len(), 15);
    assert_eq!(ledger.list_calls(), 3);
}

#[tokio::test]
async fn test_disconnect_clears_state() {
    let mut session = session_with(MockSigner::new([7u8; 32]), funded_ledger());
    session.connect().await.unwrap();

    session.disconnect().await;

    assert_eq!(session.connection(), &ConnectionState::Disconnected);
    assert_eq!(session.balance().await, None);
    assert!(session.history(None).await.is_err());
}

#[test]
fn test_explorer_links() {
    let session = session_with(MockSigner::new([7u8; 32]), funded_ledger());
    let account = AccountId::parse(SOURCE).unwrap();
    assert_eq!(
        session.explorer_tx_url("abc123"),
        "https://stellar.expert/explorer/testnet/tx/abc123"
    );
    assert_eq!(
        session.explorer_account_url(&account),
        format!("https://stellar.expert/explorer/testnet/account/{}", SOURCE)
    );
}
