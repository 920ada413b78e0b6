//! Wallet session controller
//!
//! Owns the connection, the displayed balance and the payment flow, and
//! hands them to collaborators explicitly. There is no global state.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::core::config::WalletConfig;
use crate::core::domain::{AccountId, Network};
use crate::core::errors::WalletError;
use crate::payment::flow::{BalanceRefresher, PaymentFlow, PaymentOutcome};
use crate::stellar::builder::NetworkContext;
use crate::stellar::horizon::MAX_PAGE_LIMIT;
use crate::stellar::traits::{LedgerApi, TransactionRecord, WalletSigner};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connected { account: AccountId, network: Network },
}

/// Last known native balance of the connected account.
pub struct BalanceTracker {
    api: Arc<dyn LedgerApi>,
    balance: RwLock<Option<String>>,
    refreshes: AtomicUsize,
}

impl BalanceTracker {
    pub fn new(api: Arc<dyn LedgerApi>) -> Self {
        Self {
            api,
            balance: RwLock::new(None),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub async fn refresh(&self, account: &AccountId) -> Result<String, WalletError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let info = self.api.load_account(account).await?;
        *self.balance.write().await = Some(info.native_balance.clone());
        info!(account = %account, balance = %info.native_balance, "Balance refreshed");
        Ok(info.native_balance)
    }

    pub async fn current(&self) -> Option<String> {
        self.balance.read().await.clone()
    }

    pub async fn clear(&self) {
        *self.balance.write().await = None;
    }

    /// Number of refresh attempts so far.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceRefresher for BalanceTracker {
    async fn refresh_balance(&self, account: &AccountId) {
        if let Err(e) = self.refresh(account).await {
            warn!(account = %account, error = %e, "Balance refresh after payment failed");
        }
    }
}

pub struct WalletSession {
    config: WalletConfig,
    api: Arc<dyn LedgerApi>,
    signer: Arc<dyn WalletSigner>,
    connection: ConnectionState,
    balance: Arc<BalanceTracker>,
    flow: PaymentFlow,
}

impl WalletSession {
    pub fn new(
        config: WalletConfig,
        api: Arc<dyn LedgerApi>,
        signer: Arc<dyn WalletSigner>,
    ) -> Self {
        let balance = Arc::new(BalanceTracker::new(api.clone()));
        let flow = PaymentFlow::new(
            api.clone(),
            signer.clone(),
            NetworkContext::from_config(&config),
            config.network.explorer_url(),
        )
        .with_refresher(balance.clone());

        Self {
            config,
            api,
            signer,
            connection: ConnectionState::Disconnected,
            balance,
            flow,
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn account(&self) -> Option<&AccountId> {
        match &self.connection {
            ConnectionState::Connected { account, .. } => Some(account),
            ConnectionState::Disconnected => None,
        }
    }

    pub fn balance_tracker(&self) -> &Arc<BalanceTracker> {
        &self.balance
    }

    /// Availability check, permission prompt, account query and network check.
    pub async fn connect(&mut self) -> Result<AccountId, WalletError> {
        if !self.signer.is_available().await {
            return Err(WalletError::SignerUnavailable(
                "no wallet signer detected".to_string(),
            ));
        }
        if !self.signer.request_permission().await? {
            return Err(WalletError::PermissionDenied(
                "the wallet did not share an account".to_string(),
            ));
        }

        let raw_account = self.signer.get_account_id().await?;
        let account = AccountId::parse(&raw_account)?;

        let expected = self.config.network.network;
        let reported = self.signer.get_active_network().await?;
        match Network::from_name(&reported) {
            Some(network) if network == expected => {}
            _ => {
                return Err(WalletError::NetworkMismatch {
                    expected: expected.signer_name().to_string(),
                    actual: reported,
                });
            }
        }

        info!(account = %account, network = %expected, "Wallet connected");
        self.connection = ConnectionState::Connected {
            account: account.clone(),
            network: expected,
        };

        if let Err(e) = self.balance.refresh(&account).await {
            // an unfunded account is still a valid connection
            warn!(account = %account, error = %e, "Could not load balance");
        }
        Ok(account)
    }

    pub async fn disconnect(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.balance.clear().await;
        self.flow.reset();
        info!("Wallet disconnected");
    }

    pub async fn refresh_balance(&self) -> Result<String, WalletError> {
        let account = self.require_account()?;
        self.balance.refresh(account).await
    }

    pub async fn balance(&self) -> Option<String> {
        self.balance.current().await
    }

    /// Most recent transactions, newest first. `None` uses the configured limit.
    pub async fn history(&self, limit: Option<u32>) -> Result<Vec<TransactionRecord>, WalletError> {
        let account = self.require_account()?;
        let limit = limit
            .unwrap_or(self.config.client.history_limit)
            .clamp(1, MAX_PAGE_LIMIT);
        self.api.list_transactions(account, limit).await
    }

    pub fn flow(&self) -> &PaymentFlow {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut PaymentFlow {
        &mut self.flow
    }

    /// Fills the form and runs the payment flow for the connected account.
    pub async fn send_payment(
        &mut self,
        destination: &str,
        amount: &str,
        memo: Option<&str>,
    ) -> PaymentOutcome {
        self.flow.set_destination(destination);
        self.flow.set_amount(amount);
        self.flow.set_memo(memo.unwrap_or(""));
        let account = self.account().cloned();
        self.flow.submit(account.as_ref()).await
    }

    pub fn explorer_tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.config.network.explorer_url(), hash)
    }

    pub fn explorer_account_url(&self, account: &AccountId) -> String {
        format!("{}/account/{}", self.config.network.explorer_url(), account)
    }

    fn require_account(&self) -> Result<&AccountId, WalletError> {
        self.account().ok_or_else(|| {
            WalletError::ValidationError("no wallet connected".to_string())
        })
    }
}
