//! Payment flow state machine
//!
//! `Input -> Validating -> Building -> Signing -> Submitting`, ending in
//! `Success`, `Failed` or `AbortedByUser`, after which the flow is back in
//! `Input`. Only `Success` clears the form; failures keep what the user
//! typed so they can retry without retyping.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::PaymentError;
use crate::core::domain::{AccountId, Amount};
use crate::core::validation::{parse_amount, validate_destination, validate_memo, ValidationError};
use crate::stellar::builder::{NetworkContext, TransactionBuilder};
use crate::stellar::traits::{LedgerApi, SignedEnvelope, SigningContext, WalletSigner};
use crate::stellar::xdr::{Memo, TransactionEnvelope};

/// Told to reload the displayed balance after a payment lands.
#[async_trait]
pub trait BalanceRefresher: Send + Sync {
    async fn refresh_balance(&self, account: &AccountId);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub hash: String,
    pub ledger: Option<u32>,
    pub explorer_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Input,
    Validating,
    Building,
    Signing,
    Submitting,
    Success(SubmissionReceipt),
    Failed(PaymentError),
    AbortedByUser,
}

impl FlowState {
    /// Step label shown while the flow is running.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            FlowState::Validating => Some("Validating"),
            FlowState::Building => Some("Building transaction"),
            FlowState::Signing => Some("Waiting for signature"),
            FlowState::Submitting => Some("Submitting"),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Success(_) | FlowState::Failed(_) | FlowState::AbortedByUser
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Success(SubmissionReceipt),
    Failed(PaymentError),
    AbortedByUser,
}

/// Form fields, kept verbatim as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentForm {
    pub destination: String,
    pub amount: String,
    pub memo: String,
}

impl PaymentForm {
    fn clear(&mut self) {
        self.destination.clear();
        self.amount.clear();
        self.memo.clear();
    }
}

/// Render-neutral content of the status region.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusView {
    Idle,
    ValidationError(String),
    InProgress(&'static str),
    Success { hash: String, explorer_url: String },
    Failure(String),
}

pub struct PaymentFlow {
    builder: TransactionBuilder,
    api: Arc<dyn LedgerApi>,
    signer: Arc<dyn WalletSigner>,
    refresher: Option<Arc<dyn BalanceRefresher>>,
    explorer_url: String,
    form: PaymentForm,
    state: FlowState,
    status: StatusView,
    transitions: Vec<FlowState>,
}

impl PaymentFlow {
    pub fn new(
        api: Arc<dyn LedgerApi>,
        signer: Arc<dyn WalletSigner>,
        context: NetworkContext,
        explorer_url: &str,
    ) -> Self {
        Self {
            builder: TransactionBuilder::new(api.clone(), context),
            api,
            signer,
            refresher: None,
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
            form: PaymentForm::default(),
            state: FlowState::Input,
            status: StatusView::Idle,
            transitions: Vec::new(),
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn BalanceRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn form(&self) -> &PaymentForm {
        &self.form
    }

    pub fn set_destination(&mut self, destination: &str) {
        self.form.destination = destination.to_string();
    }

    pub fn set_amount(&mut self, amount: &str) {
        self.form.amount = amount.to_string();
    }

    pub fn set_memo(&mut self, memo: &str) {
        self.form.memo = memo.to_string();
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn status(&self) -> &StatusView {
        &self.status
    }

    /// States entered during the last `submit`, in order.
    pub fn transitions(&self) -> &[FlowState] {
        &self.transitions
    }

    /// The submit control is disabled while this is true.
    pub fn is_busy(&self) -> bool {
        !matches!(self.state, FlowState::Input) && !self.state.is_terminal()
    }

    /// Puts an interrupted flow (dropped future) back into `Input`.
    pub fn reset(&mut self) {
        self.state = FlowState::Input;
        self.status = StatusView::Idle;
    }

    fn enter(&mut self, state: FlowState) {
        debug!(state = ?state, "Payment flow transition");
        self.status = match &state {
            FlowState::Input => StatusView::Idle,
            FlowState::Success(receipt) => StatusView::Success {
                hash: receipt.hash.clone(),
                explorer_url: receipt.explorer_url.clone(),
            },
            FlowState::Failed(PaymentError::Validation(err)) => {
                StatusView::ValidationError(err.to_string())
            }
            FlowState::Failed(err) => StatusView::Failure(err.to_string()),
            FlowState::AbortedByUser => StatusView::Idle,
            running => StatusView::InProgress(running.label().unwrap_or("Working")),
        };
        self.transitions.push(state.clone());
        self.state = state;
    }

    fn finish(&mut self, outcome: PaymentOutcome) -> PaymentOutcome {
        let terminal = match &outcome {
            PaymentOutcome::Success(receipt) => FlowState::Success(receipt.clone()),
            PaymentOutcome::Failed(err) => FlowState::Failed(err.clone()),
            PaymentOutcome::AbortedByUser => FlowState::AbortedByUser,
        };
        self.enter(terminal);
        // back to an editable form; the status region keeps the result
        self.state = FlowState::Input;
        outcome
    }

    /// Runs one payment from the current form contents.
    pub async fn submit(&mut self, source: Option<&AccountId>) -> PaymentOutcome {
        if self.is_busy() {
            warn!("Submit ignored: payment already in progress");
            return PaymentOutcome::Failed(PaymentError::Busy);
        }
        self.transitions.clear();

        self.enter(FlowState::Validating);
        let (source, destination, amount, memo) = match self.validate(source) {
            Ok(checked) => checked,
            Err(err) => {
                info!(error = %err, "Payment input rejected");
                return self.finish(PaymentOutcome::Failed(err.into()));
            }
        };

        self.enter(FlowState::Building);
        let envelope = match self
            .builder
            .build_with_memo(&source, &destination, amount, memo)
            .await
        {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "Failed to build payment");
                return self.finish(PaymentOutcome::Failed(PaymentError::from_build_error(err)));
            }
        };

        self.enter(FlowState::Signing);
        let context = SigningContext {
            network_passphrase: envelope.network_passphrase.clone(),
            account: source.clone(),
        };
        let signed_xdr = match self.signer.sign_envelope(&envelope.xdr, &context).await {
            Ok(Some(xdr)) => xdr,
            Ok(None) => {
                info!("Signature declined by user");
                return self.finish(PaymentOutcome::AbortedByUser);
            }
            Err(err) => {
                warn!(error = %err, "Signer failed");
                return self.finish(PaymentOutcome::Failed(PaymentError::Signing(
                    err.to_string(),
                )));
            }
        };
        match TransactionEnvelope::from_base64(&signed_xdr) {
            Ok(signed) if signed.tx == envelope.tx && !signed.signatures.is_empty() => {}
            Ok(_) => {
                return self.finish(PaymentOutcome::Failed(PaymentError::Signing(
                    "signer returned an unsigned or altered transaction".to_string(),
                )));
            }
            Err(err) => {
                return self.finish(PaymentOutcome::Failed(PaymentError::Signing(
                    err.to_string(),
                )));
            }
        }
        let signed = SignedEnvelope {
            xdr: signed_xdr,
            hash: envelope.hash_hex(),
        };

        self.enter(FlowState::Submitting);
        let response = match self.api.submit_transaction(&signed).await {
            Ok(response) => response,
            Err(err) => {
                return self.finish(PaymentOutcome::Failed(
                    PaymentError::from_submission_error(err),
                ));
            }
        };
        if response.hash.is_empty() {
            return self.finish(PaymentOutcome::Failed(PaymentError::SubmissionTransient(
                "response did not include a transaction hash".to_string(),
            )));
        }

        let receipt = SubmissionReceipt {
            explorer_url: format!("{}/tx/{}", self.explorer_url, response.hash),
            hash: response.hash,
            ledger: response.ledger,
        };
        info!(hash = %receipt.hash, ledger = ?receipt.ledger, "Payment succeeded");

        self.form.clear();
        if let Some(refresher) = &self.refresher {
            refresher.refresh_balance(&source).await;
        }
        self.finish(PaymentOutcome::Success(receipt))
    }

    fn validate(
        &self,
        source: Option<&AccountId>,
    ) -> Result<(AccountId, AccountId, Amount, Memo), ValidationError> {
        let source = source.ok_or(ValidationError::NotConnected)?;
        let destination = validate_destination(source, &self.form.destination)?;
        let amount = parse_amount(&self.form.amount)?;
        let memo_text = self.form.memo.trim();
        let memo = if memo_text.is_empty() {
            Memo::None
        } else {
            validate_memo(memo_text)?;
            Memo::Text(memo_text.to_string())
        };
        Ok((source.clone(), destination, amount, memo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stellar::mock::{MockLedger, MockSigner, SignBehavior};
    use std::time::Duration;

    const DEST: &str = "GD7777777777777777777777777777777777777777777777777773DB";

    fn flow() -> (PaymentFlow, Arc<MockLedger>, Arc<MockSigner>) {
        let ledger = Arc::new(MockLedger::new());
        let signer = Arc::new(MockSigner::new([7u8; 32]));
        ledger.add_account(signer.account_id().as_str(), 100, "50.0000000");
        let flow = PaymentFlow::new(
            ledger.clone(),
            signer.clone(),
            NetworkContext {
                passphrase: "Test SDF Network ; September 2015".to_string(),
                base_fee: 100,
                tx_timeout_secs: 180,
            },
            "https://stellar.expert/explorer/testnet/",
        );
        (flow, ledger, signer)
    }

    #[test]
    fn test_labels_only_for_running_states() {
        assert_eq!(FlowState::Signing.label(), Some("Waiting for signature"));
        assert_eq!(FlowState::Input.label(), None);
        assert!(FlowState::AbortedByUser.is_terminal());
        assert!(!FlowState::Submitting.is_terminal());
    }

    #[tokio::test]
    async fn test_not_connected_fails_validation() {
        let (mut flow, ledger, _) = flow();
        flow.set_destination(DEST);
        flow.set_amount("1");
        let outcome = flow.submit(None).await;
        assert_eq!(
            outcome,
            PaymentOutcome::Failed(PaymentError::Validation(ValidationError::NotConnected))
        );
        assert_eq!(ledger.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_success_links_to_explorer() {
        let (mut flow, _, signer) = flow();
        let source = signer.account_id().clone();
        flow.set_destination(DEST);
        flow.set_amount("2.5");
        flow.set_memo("lunch");
        let outcome = flow.submit(Some(&source)).await;
        let receipt = match outcome {
            PaymentOutcome::Success(receipt) => receipt,
            other => panic!("expected success, got {:?}", other),
        };
        assert!(receipt
            .explorer_url
            .starts_with("https://stellar.expert/explorer/testnet/tx/"));
        assert_eq!(flow.state(), &FlowState::Input);
        assert!(!flow.is_busy());
        assert_eq!(flow.form(), &PaymentForm::default());
    }

    #[tokio::test]
    async fn test_submit_refused_while_waiting_for_signature() {
        let (mut flow, ledger, signer) = flow();
        let source = signer.account_id().clone();
        signer.set_behavior(SignBehavior::Pending);
        flow.set_destination(DEST);
        flow.set_amount("3");

        let interrupted =
            tokio::time::timeout(Duration::from_millis(50), flow.submit(Some(&source))).await;
        assert!(interrupted.is_err());
        assert_eq!(flow.state(), &FlowState::Signing);
        assert_eq!(flow.status(), &StatusView::InProgress("Waiting for signature"));
        assert!(flow.is_busy());

        let before = flow.transitions().to_vec();
        let calls_before = ledger.total_calls();
        let outcome = flow.submit(Some(&source)).await;
        assert_eq!(outcome, PaymentOutcome::Failed(PaymentError::Busy));
        assert_eq!(flow.transitions().to_vec(), before);
        assert_eq!(flow.state(), &FlowState::Signing);
        assert_eq!(ledger.total_calls(), calls_before);
        assert_eq!(signer.sign_calls(), 1);

        flow.reset();
        assert_eq!(flow.state(), &FlowState::Input);
        assert_eq!(flow.status(), &StatusView::Idle);
        assert!(!flow.is_busy());
        assert_eq!(flow.form().amount, "3");

        signer.set_behavior(SignBehavior::Approve);
        let outcome = flow.submit(Some(&source)).await;
        assert!(matches!(outcome, PaymentOutcome::Success(_)));
    }

    #[tokio::test]
    async fn test_memo_too_long_rejected() {
        let (mut flow, ledger, signer) = flow();
        let source = signer.account_id().clone();
        flow.set_destination(DEST);
        flow.set_amount("1");
        flow.set_memo("a memo that is far too long for the ledger");
        let outcome = flow.submit(Some(&source)).await;
        assert_eq!(
            outcome,
            PaymentOutcome::Failed(PaymentError::Validation(ValidationError::MemoTooLong))
        );
        assert_eq!(ledger.total_calls(), 0);
    }
}
