use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::core::domain::{AccountId, Amount, XLM_DECIMALS};
use crate::stellar::strkey;

static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d+(?:\.\d+)?$").expect("Hardcoded regex should always compile")
});

/// Reasons a payment form is refused before anything touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Connect a wallet before sending")]
    NotConnected,
    #[error("Destination address is required")]
    EmptyDestination,
    #[error("Destination is not a valid Stellar account address")]
    InvalidDestination,
    #[error("You cannot send a payment to your own account")]
    SelfPayment,
    #[error("Amount is required")]
    EmptyAmount,
    #[error("Amount must be a decimal number")]
    InvalidAmount,
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Amount is below the minimum of 0.0000001 XLM")]
    BelowMinimum,
    #[error("Amount can have at most 7 decimal places")]
    TooManyDecimals,
    #[error("Amount is too large")]
    AmountTooLarge,
    #[error("Memo text must be at most 28 bytes")]
    MemoTooLong,
}

/// Returns true when `address` is a well-formed `G...` account id
/// (length, prefix, base32 alphabet, version byte and checksum).
pub fn is_valid_account_id(address: &str) -> bool {
    strkey::decode_account_id(address).is_ok()
}

/// Parses a user-entered XLM amount into stroops.
pub fn parse_amount(input: &str) -> Result<Amount, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::EmptyAmount);
    }
    // ".5" is a common way to type half a lumen
    let normalized = if let Some(rest) = input.strip_prefix('.') {
        format!("0.{}", rest)
    } else if let Some(rest) = input.strip_prefix("-.") {
        format!("-0.{}", rest)
    } else {
        input.to_string()
    };
    if !DECIMAL_RE.is_match(&normalized) {
        return Err(ValidationError::InvalidAmount);
    }

    // precision is checked on the digits as typed; Decimal parsing rounds
    let unsigned = normalized.trim_start_matches('-');
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let whole = whole.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    let max_fraction = XLM_DECIMALS as usize;

    if normalized.starts_with('-') || (whole.is_empty() && fraction.is_empty()) {
        return Err(ValidationError::NonPositiveAmount);
    }
    if fraction.len() > max_fraction {
        if whole.is_empty() && fraction[..max_fraction].bytes().all(|b| b == b'0') {
            return Err(ValidationError::BelowMinimum);
        }
        return Err(ValidationError::TooManyDecimals);
    }

    let value =
        Decimal::from_str_exact(&normalized).map_err(|_| ValidationError::AmountTooLarge)?;
    Amount::from_decimal(value).ok_or(ValidationError::AmountTooLarge)
}

/// Checks a destination against the sending account.
pub fn validate_destination(
    source: &AccountId,
    destination: &str,
) -> Result<AccountId, ValidationError> {
    let destination = destination.trim();
    if destination.is_empty() {
        return Err(ValidationError::EmptyDestination);
    }
    let destination =
        AccountId::parse(destination).map_err(|_| ValidationError::InvalidDestination)?;
    if &destination == source {
        return Err(ValidationError::SelfPayment);
    }
    Ok(destination)
}

/// Memo text is an XDR `string<28>`, measured in bytes.
pub fn validate_memo(memo: &str) -> Result<(), ValidationError> {
    if memo.len() > 28 {
        return Err(ValidationError::MemoTooLong);
    }
    Ok(())
}
