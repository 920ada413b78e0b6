//! Payment flow error taxonomy
//!
//! A declined signature is deliberately absent: it is a normal outcome
//! (`PaymentOutcome::AbortedByUser`), not an error.

use thiserror::Error;

use crate::core::errors::WalletError;
pub use crate::core::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// Local input check failed; the network was never contacted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Account lookup failed while building the envelope.
    #[error("Could not prepare the payment: {0}")]
    Build(String),

    /// The signer errored (as opposed to the user declining).
    #[error("Signer error: {0}")]
    Signing(String),

    /// Network-level failure during submission. The payment may be retried.
    #[error("Network error while submitting: {0}")]
    SubmissionTransient(String),

    /// The ledger refused the transaction.
    #[error("{message}")]
    SubmissionRejected {
        result_code: String,
        operation_codes: Vec<String>,
        message: String,
    },

    /// Submit pressed while an earlier payment is still running.
    #[error("A payment is already in progress")]
    Busy,
}

impl PaymentError {
    pub fn from_build_error(err: WalletError) -> Self {
        match err {
            WalletError::NotFoundError(_) => PaymentError::Build(
                "the sending account does not exist on this network (fund it first)".to_string(),
            ),
            other => PaymentError::Build(other.to_string()),
        }
    }

    pub fn from_submission_error(err: WalletError) -> Self {
        match err {
            WalletError::TransactionRejected {
                result_code,
                operation_codes,
            } => {
                let message = describe_result_codes(&result_code, &operation_codes);
                PaymentError::SubmissionRejected {
                    result_code,
                    operation_codes,
                    message,
                }
            }
            other => PaymentError::SubmissionTransient(other.to_string()),
        }
    }

    /// Ledger reason code, when the ledger gave one.
    pub fn reason_code(&self) -> Option<&str> {
        match self {
            PaymentError::SubmissionRejected { result_code, .. } => Some(result_code),
            _ => None,
        }
    }
}

fn describe_code(code: &str) -> Option<&'static str> {
    let text = match code {
        "op_underfunded" => "Insufficient balance for this payment",
        "op_low_reserve" => "Payment would leave the account below its minimum reserve",
        "op_no_destination" => {
            "Destination account does not exist; it must be created with at least 1 XLM"
        }
        "op_line_full" => "Destination cannot receive more of this asset",
        "op_malformed" => "The payment operation is malformed",
        "tx_bad_seq" => "Sequence number is out of date, please try again",
        "tx_bad_auth" => "Transaction signature is missing or invalid",
        "tx_insufficient_balance" => "Insufficient balance to cover the fee",
        "tx_insufficient_fee" => "Fee is too low for current network load",
        "tx_too_late" => "Transaction expired before it reached the ledger",
        "tx_too_early" => "Transaction is not valid yet",
        "tx_no_source_account" => "Sending account does not exist",
        "tx_malformed" | "transaction_malformed" => "The transaction is malformed",
        _ => return None,
    };
    Some(text)
}

/// Human-readable text for Horizon result codes. Operation codes are more
/// specific than `tx_failed`, so they win when present.
pub fn describe_result_codes(result_code: &str, operation_codes: &[String]) -> String {
    operation_codes
        .iter()
        .filter(|code| code.as_str() != "op_success")
        .find_map(|code| describe_code(code))
        .or_else(|| describe_code(result_code))
        .map(str::to_string)
        .unwrap_or_else(|| {
            if operation_codes.is_empty() {
                format!("Transaction failed ({})", result_code)
            } else {
                format!(
                    "Transaction failed ({}: {})",
                    result_code,
                    operation_codes.join(", ")
                )
            }
        })
}
