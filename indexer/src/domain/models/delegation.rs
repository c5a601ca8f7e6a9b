use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of mutez in one tez
pub const MUTEZ_PER_TEZ: i64 = 1_000_000;

/// Canonical delegation record, as written by the sync engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delegation {
    /// Operation id assigned by the upstream indexer; idempotence key
    pub upstream_id: u64,

    /// Sender of the delegation operation
    pub delegator: String,

    /// New baker; empty for an un-delegation
    pub delegate: String,

    /// Delegated balance in tez
    pub amount_tez: Decimal,

    /// Block level the operation was included at
    pub block_level: u64,

    /// Block timestamp
    pub timestamp: DateTime<Utc>,
}

impl Delegation {
    /// Converts an upstream micro-tez amount into tez
    pub fn tez_from_mutez(amount_mutez: u64) -> Decimal {
        Decimal::from(amount_mutez) / Decimal::from(MUTEZ_PER_TEZ)
    }
}

/// Delegation row as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDelegation {
    pub id: i64,
    pub delegation: Delegation,
    /// Ingestion instant, set by the store
    pub created_at: DateTime<Utc>,
}

/// Offset pagination over stored delegations, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u64,
    pub limit: u64,
    /// Restricts results to one calendar year (UTC)
    pub year: Option<i32>,
}

impl ListQuery {
    /// Largest offset a SQL `OFFSET` (signed 64-bit) can carry
    pub const MAX_OFFSET: u64 = i64::MAX as u64;

    pub fn new(page: u64, limit: u64, year: Option<i32>) -> Self {
        Self { page, limit, year }
    }

    /// Number of rows to skip, or `None` when it exceeds `MAX_OFFSET`
    pub fn checked_offset(&self) -> Option<u64> {
        self.page
            .saturating_sub(1)
            .checked_mul(self.limit)
            .filter(|offset| *offset <= Self::MAX_OFFSET)
    }

    /// Number of rows to skip for this page, capped at `MAX_OFFSET`
    pub fn offset(&self) -> u64 {
        self.checked_offset().unwrap_or(Self::MAX_OFFSET)
    }

    /// Half-open `[start, end)` unix-seconds window for the year filter.
    ///
    /// Returns `None` when no year is set or the year cannot be represented.
    pub fn year_window(&self) -> Option<(i64, i64)> {
        year_window(self.year?)
    }
}

/// Unix-seconds bounds of `[year-01-01, (year+1)-01-01)` in UTC
pub fn year_window(year: i32) -> Option<(i64, i64)> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year.checked_add(1)?, 1, 1, 0, 0, 0).single()?;
    Some((start.timestamp(), end.timestamp()))
}

/// One page of stored delegations plus the total matching the filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelegationPage {
    pub items: Vec<StoredDelegation>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn converts_mutez_to_tez() {
        assert_eq!(Delegation::tez_from_mutez(1_000_000), Decimal::ONE);
        assert_eq!(
            Delegation::tez_from_mutez(500_000),
            Decimal::from_str("0.5").unwrap()
        );
        assert_eq!(
            Delegation::tez_from_mutez(1),
            Decimal::from_str("0.000001").unwrap()
        );
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(ListQuery::new(1, 50, None).offset(), 0);
        assert_eq!(ListQuery::new(3, 20, None).offset(), 40);
    }

    #[test]
    fn offset_never_exceeds_signed_range() {
        let huge = ListQuery::new(i64::MAX as u64, 100, None);
        assert_eq!(huge.checked_offset(), None);
        assert_eq!(huge.offset(), ListQuery::MAX_OFFSET);
        assert!(i64::try_from(huge.offset()).is_ok());

        let edge = ListQuery::new(i64::MAX as u64, 1, None);
        assert_eq!(edge.checked_offset(), Some(ListQuery::MAX_OFFSET - 1));
    }

    #[test]
    fn year_window_covers_the_calendar_year() {
        let (start, end) = year_window(2023).unwrap();
        assert_eq!(start, 1_672_531_200);
        assert_eq!(end, 1_704_067_200);
        assert_eq!(ListQuery::new(1, 10, Some(2023)).year_window(), Some((start, end)));
        assert_eq!(ListQuery::new(1, 10, None).year_window(), None);
    }
}
