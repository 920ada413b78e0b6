pub mod builder;
pub mod horizon;
pub mod mock;
pub mod signer;
pub mod strkey;
pub mod traits;
pub mod xdr;

pub use builder::{NetworkContext, TransactionBuilder};
pub use horizon::HorizonClient;
pub use signer::KeypairSigner;
pub use traits::{
    AccountInfo, LedgerApi, SignedEnvelope, SigningContext, SubmitResponse, TransactionRecord,
    UnsignedEnvelope, WalletSigner,
};
