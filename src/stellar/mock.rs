// filepath: src/stellar/mock.rs
//! In-memory ledger and signer doubles used by tests and offline demos.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::signer::KeypairSigner;
use super::traits::{
    AccountInfo, LedgerApi, SignedEnvelope, SigningContext, SubmitResponse, TransactionRecord,
    WalletSigner,
};
use crate::core::domain::{AccountId, Network};
use crate::core::errors::WalletError;

/// Fake Horizon: accounts and history live in maps, submissions are recorded.
#[derive(Debug, Default)]
pub struct MockLedger {
    accounts: Mutex<HashMap<String, AccountInfo>>,
    history: Mutex<HashMap<String, Vec<TransactionRecord>>>,
    load_error: Mutex<Option<WalletError>>,
    submit_result: Mutex<Option<Result<SubmitResponse, WalletError>>>,
    submitted: Mutex<Vec<SignedEnvelope>>,
    load_account_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account_id: &str, sequence: i64, native_balance: &str) {
        self.accounts.lock().insert(
            account_id.to_string(),
            AccountInfo {
                account_id: account_id.to_string(),
                sequence,
                native_balance: native_balance.to_string(),
            },
        );
    }

    pub fn set_balance(&self, account_id: &str, native_balance: &str) {
        if let Some(info) = self.accounts.lock().get_mut(account_id) {
            info.native_balance = native_balance.to_string();
        }
    }

    pub fn set_history(&self, account_id: &str, records: Vec<TransactionRecord>) {
        self.history.lock().insert(account_id.to_string(), records);
    }

    /// Every following `load_account` fails with `error`.
    pub fn fail_loads_with(&self, error: WalletError) {
        *self.load_error.lock() = Some(error);
    }

    /// Next submission returns `result` instead of echoing the envelope hash.
    pub fn respond_to_submit(&self, result: Result<SubmitResponse, WalletError>) {
        *self.submit_result.lock() = Some(result);
    }

    pub fn submitted(&self) -> Vec<SignedEnvelope> {
        self.submitted.lock().clone()
    }

    pub fn load_account_calls(&self) -> usize {
        self.load_account_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Total number of network round trips made against this ledger.
    pub fn total_calls(&self) -> usize {
        self.load_account_calls() + self.submit_calls() + self.list_calls()
    }
}

#[async_trait]
impl LedgerApi for MockLedger {
    async fn load_account(&self, account: &AccountId) -> Result<AccountInfo, WalletError> {
        self.load_account_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.load_error.lock().clone() {
            return Err(err);
        }
        self.accounts
            .lock()
            .get(account.as_str())
            .cloned()
            .ok_or_else(|| WalletError::NotFoundError(format!("account {} not found", account)))
    }

    async fn submit_transaction(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<SubmitResponse, WalletError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().push(envelope.clone());
        match self.submit_result.lock().take() {
            Some(result) => result,
            None => Ok(SubmitResponse {
                hash: envelope.hash.clone(),
                ledger: Some(1),
            }),
        }
    }

    async fn list_transactions(
        &self,
        account: &AccountId,
        limit: u32,
    ) -> Result<Vec<TransactionRecord>, WalletError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .history
            .lock()
            .get(account.as_str())
            .map(|records| records.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }
}

/// How a `MockSigner` answers signature requests.
#[derive(Debug, Clone)]
pub enum SignBehavior {
    /// Sign with the wrapped keypair.
    Approve,
    /// User pressed "reject".
    Decline,
    /// The extension itself failed.
    Fail(WalletError),
    /// The popup stays open; the request never resolves.
    Pending,
}

/// Scriptable wallet extension.
#[derive(Debug)]
pub struct MockSigner {
    keypair: KeypairSigner,
    available: bool,
    grant_permission: bool,
    network: String,
    behavior: Mutex<SignBehavior>,
    sign_calls: AtomicUsize,
}

impl MockSigner {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            keypair: KeypairSigner::from_seed_bytes(&seed, Network::Testnet),
            available: true,
            grant_permission: true,
            network: Network::Testnet.signer_name().to_string(),
            behavior: Mutex::new(SignBehavior::Approve),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn denying_permission(mut self) -> Self {
        self.grant_permission = false;
        self
    }

    pub fn on_network(mut self, network: &str) -> Self {
        self.network = network.to_string();
        self
    }

    pub fn set_behavior(&self, behavior: SignBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn account_id(&self) -> &AccountId {
        self.keypair.account_id()
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for MockSigner {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn request_permission(&self) -> Result<bool, WalletError> {
        Ok(self.grant_permission)
    }

    async fn get_account_id(&self) -> Result<String, WalletError> {
        Ok(self.keypair.account_id().to_string())
    }

    async fn get_active_network(&self) -> Result<String, WalletError> {
        Ok(self.network.clone())
    }

    async fn sign_envelope(
        &self,
        envelope_xdr: &str,
        context: &SigningContext,
    ) -> Result<Option<String>, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().clone();
        match behavior {
            SignBehavior::Approve => self.keypair.sign_envelope(envelope_xdr, context).await,
            SignBehavior::Decline => Ok(None),
            SignBehavior::Fail(err) => Err(err),
            SignBehavior::Pending => std::future::pending().await,
        }
    }
}
