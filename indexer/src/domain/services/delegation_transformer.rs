//! Conversion of upstream delegation operations into canonical records

use crate::domain::models::Delegation;
use crate::infrastructure::tzkt::TzktDelegation;

/// The only operation status admitted into the store
pub const APPLIED_STATUS: &str = "applied";

/// Filters and converts upstream records
pub struct DelegationTransformer;

impl DelegationTransformer {
    /// Drops every record whose status is not `applied` and converts the rest,
    /// preserving upstream order
    pub fn transform_page(page: &[TzktDelegation]) -> Vec<Delegation> {
        page.iter()
            .filter(|op| op.status == APPLIED_STATUS)
            .map(Self::transform)
            .collect()
    }

    /// Converts one upstream record without looking at its status
    pub fn transform(op: &TzktDelegation) -> Delegation {
        Delegation {
            upstream_id: op.id,
            delegator: op.sender.address.clone(),
            delegate: op
                .new_delegate
                .as_ref()
                .map(|d| d.address.clone())
                .unwrap_or_default(),
            amount_tez: Delegation::tez_from_mutez(op.amount),
            block_level: op.level,
            timestamp: op.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::tzkt::TzktAlias;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn op(id: u64, status: &str, delegate: Option<&str>) -> TzktDelegation {
        TzktDelegation {
            kind: "delegation".to_string(),
            id,
            level: 100 + id,
            timestamp: Utc.with_ymd_and_hms(2023, 5, 5, 6, 29, 14).unwrap(),
            hash: format!("oo{id}"),
            sender: TzktAlias {
                address: "tz1a1SAaXRt9yoGMx29rh9FsBF4UzmvojdTL".to_string(),
                alias: None,
            },
            new_delegate: delegate.map(|address| TzktAlias {
                address: address.to_string(),
                alias: Some("Baker".to_string()),
            }),
            amount: 1_500_000,
            status: status.to_string(),
        }
    }

    #[test]
    fn keeps_only_applied_operations() {
        let page = vec![
            op(1, "applied", Some("tz1baker")),
            op(2, "failed", Some("tz1baker")),
            op(3, "backtracked", None),
            op(4, "applied", None),
        ];

        let out = DelegationTransformer::transform_page(&page);
        let ids: Vec<u64> = out.iter().map(|d| d.upstream_id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn maps_fields_and_converts_amount() {
        let d = DelegationTransformer::transform(&op(7, "applied", Some("tz1baker")));
        assert_eq!(d.upstream_id, 7);
        assert_eq!(d.delegator, "tz1a1SAaXRt9yoGMx29rh9FsBF4UzmvojdTL");
        assert_eq!(d.delegate, "tz1baker");
        assert_eq!(d.amount_tez, Decimal::from_str("1.5").unwrap());
        assert_eq!(d.block_level, 107);
        assert_eq!(d.timestamp.timestamp(), 1_683_268_154);
    }

    #[test]
    fn undelegation_has_empty_delegate() {
        let d = DelegationTransformer::transform(&op(9, "applied", None));
        assert_eq!(d.delegate, "");
    }
}
