// API request/response models

use serde::{Deserialize, Serialize};

use tezos_indexer::config::MAX_API_PAGE_LIMIT;
use tezos_indexer::domain::models::{ListQuery, StoredDelegation};

use crate::error::ApiError;

/// Raw query parameters for GET /xtz/delegations.
///
/// Kept as strings so malformed values become 400s with a useful message
/// rather than extractor rejections.
#[derive(Debug, Deserialize, Default)]
pub struct DelegationsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub year: Option<String>,
}

/// Validated listing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub year: Option<i32>,
}

impl ListParams {
    pub fn to_query(self) -> ListQuery {
        ListQuery::new(self.page, self.limit, self.year)
    }
}

impl DelegationsQuery {
    pub fn validate(&self, default_limit: u16) -> Result<ListParams, ApiError> {
        let page = match non_empty(&self.page) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(page) if page >= 1 => page as u64,
                Ok(_) => {
                    return Err(ApiError::InvalidParameter(
                        "page must be greater than or equal to 1".to_string(),
                    ))
                }
                Err(_) => {
                    return Err(ApiError::InvalidParameter(format!(
                        "page must be an integer, got {raw:?}"
                    )))
                }
            },
        };

        let limit = match non_empty(&self.limit) {
            None => u64::from(default_limit),
            Some(raw) => match raw.parse::<i64>() {
                Ok(limit) if (1..=i64::from(MAX_API_PAGE_LIMIT)).contains(&limit) => limit as u64,
                Ok(_) => {
                    return Err(ApiError::InvalidParameter(format!(
                        "limit must be between 1 and {MAX_API_PAGE_LIMIT}"
                    )))
                }
                Err(_) => {
                    return Err(ApiError::InvalidParameter(format!(
                        "limit must be an integer, got {raw:?}"
                    )))
                }
            },
        };

        let year = match non_empty(&self.year) {
            None => None,
            Some(raw) if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) => {
                raw.parse::<i32>().ok()
            }
            Some(raw) => {
                return Err(ApiError::InvalidParameter(format!(
                    "year must be a four-digit year, got {raw:?}"
                )))
            }
        };

        let params = ListParams { page, limit, year };
        if params.to_query().checked_offset().is_none() {
            return Err(ApiError::InvalidParameter(format!(
                "page {page} is out of range for limit {limit}"
            )));
        }
        Ok(params)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One delegation as served by the API
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DelegationData {
    pub id: i64,
    pub delegator: String,
    pub delegate: String,
    /// Tez, as a decimal string
    pub amount: String,
    pub level: u64,
    /// RFC3339
    pub timestamp: String,
}

impl From<StoredDelegation> for DelegationData {
    fn from(row: StoredDelegation) -> Self {
        let d = row.delegation;
        Self {
            id: row.id,
            delegator: d.delegator,
            delegate: d.delegate,
            amount: d.amount_tez.normalize().to_string(),
            level: d.block_level,
            timestamp: d.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub current_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u64>,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let has_prev_page = page > 1;
        let has_next_page = page.saturating_mul(per_page) < total;
        Self {
            current_page: page,
            per_page,
            total,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DelegationsResponse {
    pub data: Vec<DelegationData>,
    pub pagination: PaginationMeta,
}
