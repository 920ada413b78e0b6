use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::domain::AccountId;
use crate::core::errors::WalletError;
use crate::stellar::xdr::Transaction;

/// Account state needed by the wallet: sequence for building, balance for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: String,
    pub sequence: i64,
    /// Native balance, as the decimal string Horizon reports.
    pub native_balance: String,
}

/// Accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub hash: String,
    pub ledger: Option<u32>,
}

/// One entry of an account's history, newest first when listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub ledger: u32,
    pub created_at: DateTime<Utc>,
    pub source_account: String,
    pub fee_charged: String,
    pub operation_count: u32,
    pub successful: bool,
    pub memo: Option<String>,
}

/// Envelope built for one payment, with no signatures yet.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedEnvelope {
    pub tx: Transaction,
    /// Base64 `TransactionEnvelope` XDR, as handed to signers.
    pub xdr: String,
    pub network_passphrase: String,
}

impl UnsignedEnvelope {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.tx.hash(&self.network_passphrase))
    }
}

/// Envelope carrying at least one signature, ready to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedEnvelope {
    pub xdr: String,
    pub hash: String,
}

/// What a signer is told alongside the envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SigningContext {
    pub network_passphrase: String,
    pub account: AccountId,
}

/// Network API the wallet reads from and submits to.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Looks up sequence and native balance. Unknown accounts are `NotFoundError`.
    async fn load_account(&self, account: &AccountId) -> Result<AccountInfo, WalletError>;

    /// Submits once. Ledger rejections come back as `TransactionRejected`.
    async fn submit_transaction(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<SubmitResponse, WalletError>;

    /// Most recent transactions for `account`, newest first.
    async fn list_transactions(
        &self,
        account: &AccountId,
        limit: u32,
    ) -> Result<Vec<TransactionRecord>, WalletError>;
}

/// Capability interface of an external signer that holds the keys.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    async fn is_available(&self) -> bool;

    /// Asks the user to let this wallet see their account. `false` when declined.
    async fn request_permission(&self) -> Result<bool, WalletError>;

    async fn get_account_id(&self) -> Result<String, WalletError>;

    /// Network the signer is currently pointed at, e.g. `TESTNET`.
    async fn get_active_network(&self) -> Result<String, WalletError>;

    /// Signs base64 envelope XDR. `Ok(None)` means the user declined.
    async fn sign_envelope(
        &self,
        envelope_xdr: &str,
        context: &SigningContext,
    ) -> Result<Option<String>, WalletError>;
}
