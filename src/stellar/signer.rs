//! Local ed25519 signer
//!
//! Stands in for a browser wallet extension when running from a terminal:
//! the seed lives in process memory and every signature goes through an
//! approval hook, so the user can still decline.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::strkey;
use super::traits::{SigningContext, WalletSigner};
use super::xdr::{DecoratedSignature, Transaction, TransactionEnvelope};
use crate::core::domain::{AccountId, Network};
use crate::core::errors::WalletError;

/// Decides whether a transaction gets signed. `false` declines.
/// Runs on the blocking thread pool, so it may wait for terminal input.
pub type ApprovalHook = Arc<dyn Fn(&Transaction) -> bool + Send + Sync>;

pub struct KeypairSigner {
    signing_key: SigningKey,
    account_id: AccountId,
    network: Network,
    approval: ApprovalHook,
}

impl std::fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print key material
        f.debug_struct("KeypairSigner")
            .field("account_id", &self.account_id)
            .field("network", &self.network)
            .finish()
    }
}

impl KeypairSigner {
    pub fn from_seed_bytes(seed: &[u8; 32], network: Network) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let account_id = AccountId::from_public_key(&signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            account_id,
            network,
            approval: Arc::new(|_: &Transaction| true),
        }
    }

    /// Parses an `S...` secret seed.
    pub fn from_secret(secret: &str, network: Network) -> Result<Self, WalletError> {
        let seed = Zeroizing::new(strkey::decode_secret_seed(secret.trim())?);
        Ok(Self::from_seed_bytes(&seed, network))
    }

    pub fn generate(network: Network) -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_seed_bytes(&signing_key.to_bytes(), network)
    }

    pub fn with_approval(mut self, approval: ApprovalHook) -> Self {
        self.approval = approval;
        self
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn secret_seed(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.signing_key.to_bytes());
        Zeroizing::new(strkey::encode_secret_seed(&seed))
    }

    fn decorate(&self, tx: &Transaction, passphrase: &str) -> DecoratedSignature {
        let public_key = self.signing_key.verifying_key().to_bytes();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public_key[28..]);
        let signature = self.signing_key.sign(&tx.hash(passphrase));
        DecoratedSignature {
            hint,
            signature: signature.to_bytes().to_vec(),
        }
    }
}

#[async_trait]
impl WalletSigner for KeypairSigner {
    async fn is_available(&self) -> bool {
        true
    }

    async fn request_permission(&self) -> Result<bool, WalletError> {
        Ok(true)
    }

    async fn get_account_id(&self) -> Result<String, WalletError> {
        Ok(self.account_id.to_string())
    }

    async fn get_active_network(&self) -> Result<String, WalletError> {
        Ok(self.network.signer_name().to_string())
    }

    async fn sign_envelope(
        &self,
        envelope_xdr: &str,
        context: &SigningContext,
    ) -> Result<Option<String>, WalletError> {
        if context.account != self.account_id {
            return Err(WalletError::SigningFailed(format!(
                "signer holds {} but {} was requested",
                self.account_id, context.account
            )));
        }

        let mut envelope = TransactionEnvelope::from_base64(envelope_xdr)?;
        if envelope.tx.source_account != self.account_id.public_key() {
            return Err(WalletError::SigningFailed(
                "transaction source is not the signer's account".to_string(),
            ));
        }

        let approval = self.approval.clone();
        let pending_tx = envelope.tx.clone();
        let approved = tokio::task::spawn_blocking(move || approval(&pending_tx))
            .await
            .map_err(|e| WalletError::SigningFailed(format!("approval prompt failed: {}", e)))?;
        if !approved {
            warn!(account = %self.account_id, "Signature request declined");
            return Ok(None);
        }

        let signature = self.decorate(&envelope.tx, &context.network_passphrase);
        envelope.signatures.push(signature);
        debug!(signatures = envelope.signatures.len(), "Envelope signed");
        info!(account = %self.account_id, "Signed transaction");
        Ok(Some(envelope.to_base64()))
    }
}
