//! Payment transaction construction

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::traits::{LedgerApi, UnsignedEnvelope};
use super::xdr::{Memo, PaymentOp, TimeBounds, Transaction, TransactionEnvelope};
use crate::core::config::WalletConfig;
use crate::core::domain::{AccountId, Amount};
use crate::core::errors::WalletError;

/// Fixed network context every envelope is built against.
#[derive(Debug, Clone)]
pub struct NetworkContext {
    pub passphrase: String,
    pub base_fee: u32,
    pub tx_timeout_secs: u64,
}

impl NetworkContext {
    pub fn from_config(config: &WalletConfig) -> Self {
        Self {
            passphrase: config.network.passphrase().to_string(),
            base_fee: config.transaction.base_fee,
            tx_timeout_secs: config.transaction.tx_timeout_secs,
        }
    }
}

/// Builds single-payment envelopes, fetching the source sequence from the network.
pub struct TransactionBuilder {
    api: Arc<dyn LedgerApi>,
    context: NetworkContext,
}

impl TransactionBuilder {
    pub fn new(api: Arc<dyn LedgerApi>, context: NetworkContext) -> Self {
        Self { api, context }
    }

    pub fn context(&self) -> &NetworkContext {
        &self.context
    }

    pub async fn build(
        &self,
        source: &AccountId,
        destination: &AccountId,
        amount: Amount,
    ) -> Result<UnsignedEnvelope, WalletError> {
        self.build_with_memo(source, destination, amount, Memo::None)
            .await
    }

    /// Lookup failures are returned as-is; nothing here retries.
    pub async fn build_with_memo(
        &self,
        source: &AccountId,
        destination: &AccountId,
        amount: Amount,
        memo: Memo,
    ) -> Result<UnsignedEnvelope, WalletError> {
        if source == destination {
            return Err(WalletError::ValidationError(
                "source and destination must differ".to_string(),
            ));
        }

        let account = self.api.load_account(source).await?;
        let sequence = account.sequence.checked_add(1).ok_or_else(|| {
            WalletError::InternalError(format!("sequence overflow for {}", source))
        })?;
        debug!(source = %source, sequence, "Fetched account sequence");

        let time_bounds = if self.context.tx_timeout_secs == 0 {
            None
        } else {
            let now = Utc::now().timestamp().max(0) as u64;
            Some(TimeBounds {
                min_time: 0,
                max_time: now.saturating_add(self.context.tx_timeout_secs),
            })
        };

        let operations = vec![PaymentOp {
            destination: destination.public_key(),
            amount: amount.stroops(),
        }];
        let tx = Transaction {
            source_account: source.public_key(),
            fee: self.context.base_fee.saturating_mul(operations.len() as u32),
            sequence,
            time_bounds,
            memo,
            operations,
        };

        let xdr = TransactionEnvelope::unsigned(tx.clone()).to_base64();
        info!(
            source = %source,
            destination = %destination,
            amount = %amount,
            fee = tx.fee,
            "Built payment envelope"
        );

        Ok(UnsignedEnvelope {
            tx,
            xdr,
            network_passphrase: self.context.passphrase.clone(),
        })
    }
}
