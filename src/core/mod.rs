pub mod config;
pub mod domain;
pub mod errors;
pub mod validation;

pub use config::WalletConfig;
pub use domain::{AccountId, Amount, Network};
pub use errors::WalletError;
