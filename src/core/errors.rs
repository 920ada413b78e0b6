use std::fmt;

/// Custom error type for wallet operations.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletError {
    /// Configuration-related errors.
    ConfigError(String),
    /// Network errors (connection refused, DNS, 5xx).
    NetworkError(String),
    /// Timeout errors.
    TimeoutError(String),
    /// Resource not found errors (unfunded or unknown account).
    NotFoundError(String),
    /// Invalid address errors.
    InvalidAddress(String),
    /// Invalid amount errors.
    InvalidAmount(String),
    /// Invalid secret seed errors.
    InvalidSecretKey(String),
    /// Validation errors.
    ValidationError(String),
    /// XDR / JSON encoding and decoding errors.
    SerializationError(String),
    /// The signer could not be reached.
    SignerUnavailable(String),
    /// The signer refused to share the account.
    PermissionDenied(String),
    /// The signer is pointed at a different network than the wallet.
    NetworkMismatch { expected: String, actual: String },
    /// Signing failed errors.
    SigningFailed(String),
    /// The ledger rejected the transaction.
    TransactionRejected {
        result_code: String,
        operation_codes: Vec<String>,
    },
    /// Internal errors.
    InternalError(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            WalletError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            WalletError::TimeoutError(msg) => write!(f, "Timeout error: {}", msg),
            WalletError::NotFoundError(msg) => write!(f, "Not found: {}", msg),
            WalletError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            WalletError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            WalletError::InvalidSecretKey(msg) => write!(f, "Invalid secret key: {}", msg),
            WalletError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            WalletError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            WalletError::SignerUnavailable(msg) => write!(f, "Signer unavailable: {}", msg),
            WalletError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            WalletError::NetworkMismatch { expected, actual } => write!(
                f,
                "Network mismatch: wallet is on {} but signer is on {}",
                expected, actual
            ),
            WalletError::SigningFailed(msg) => write!(f, "Signing failed: {}", msg),
            WalletError::TransactionRejected {
                result_code,
                operation_codes,
            } => {
                if operation_codes.is_empty() {
                    write!(f, "Transaction rejected: {}", result_code)
                } else {
                    write!(
                        f,
                        "Transaction rejected: {} ({})",
                        result_code,
                        operation_codes.join(", ")
                    )
                }
            }
            WalletError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

impl WalletError {
    /// Whether the same request could succeed if simply sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::NetworkError(_) | WalletError::TimeoutError(_)
        )
    }

    /// Whether the ledger itself said no (as opposed to the transport failing).
    pub fn is_ledger_rejection(&self) -> bool {
        matches!(self, WalletError::TransactionRejected { .. })
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WalletError::TimeoutError(err.to_string())
        } else if err.is_decode() {
            WalletError::SerializationError(err.to_string())
        } else {
            WalletError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for WalletError {
    fn from(err: base64::DecodeError) -> Self {
        WalletError::SerializationError(format!("invalid base64: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_network_error() {
        let err = WalletError::NetworkError("connection refused".to_string());
        assert_eq!(format!("{}", err), "Network error: connection refused");
    }

    #[test]
    fn test_display_rejection_with_operation_codes() {
        let err = WalletError::TransactionRejected {
            result_code: "tx_failed".to_string(),
            operation_codes: vec!["op_underfunded".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Transaction rejected: tx_failed (op_underfunded)"
        );
    }

    #[test]
    fn test_display_rejection_without_operation_codes() {
        let err = WalletError::TransactionRejected {
            result_code: "tx_bad_seq".to_string(),
            operation_codes: vec![],
        };
        assert_eq!(err.to_string(), "Transaction rejected: tx_bad_seq");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(WalletError::TimeoutError("504".into()).is_retryable());
        assert!(WalletError::NetworkError("reset".into()).is_retryable());
        assert!(!WalletError::NotFoundError("acct".into()).is_retryable());
        let rejected = WalletError::TransactionRejected {
            result_code: "tx_failed".into(),
            operation_codes: vec![],
        };
        assert!(!rejected.is_retryable());
        assert!(rejected.is_ledger_rejection());
    }
}
