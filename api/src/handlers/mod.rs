// API endpoint handlers

pub mod delegations;

use crate::services::DelegationService;

/// State shared by the API handlers
#[derive(Clone)]
pub struct AppState {
    pub delegations: DelegationService,
    /// Page size when the request has no `limit`
    pub default_limit: u16,
}

pub use delegations::get_delegations;
