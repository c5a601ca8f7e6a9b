pub mod accounts;
pub mod delegations;
