pub mod account;
pub mod address;
pub mod delegation;

pub use account::Account;
pub use address::{AddressError, WalletAddress};
pub use delegation::{year_window, Delegation, DelegationPage, ListQuery, StoredDelegation};
