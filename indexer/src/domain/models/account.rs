use serde::{Deserialize, Serialize};

/// Wallet seen as a delegator or delegate of an ingested operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub alias: Option<String>,
    /// Block level of the first delegation that referenced this address
    pub first_seen_level: u64,
}
