pub mod session;

// Re-export the session so callers can use `crate::service::WalletSession`
pub use session::{BalanceTracker, ConnectionState, WalletSession};
