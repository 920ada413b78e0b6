pub mod errors;
pub mod flow;

pub use errors::{describe_result_codes, PaymentError, ValidationError};
pub use flow::{
    BalanceRefresher, FlowState, PaymentFlow, PaymentForm, PaymentOutcome, StatusView,
    SubmissionReceipt,
};
