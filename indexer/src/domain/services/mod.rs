pub mod account_deriver;
pub mod delegation_transformer;

pub use account_deriver::AccountDeriver;
pub use delegation_transformer::{DelegationTransformer, APPLIED_STATUS};
