use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account reference embedded in an upstream operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TzktAlias {
    pub address: String,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Delegation operation as returned by `/v1/operations/delegations`.
///
/// Fields this indexer does not consume are ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TzktDelegation {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub id: u64,
    pub level: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub hash: String,
    pub sender: TzktAlias,
    /// Absent for an un-delegation
    #[serde(default)]
    pub new_delegate: Option<TzktAlias>,
    /// Delegated balance in mutez
    #[serde(default)]
    pub amount: u64,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_upstream_payload_and_ignores_unknown_fields() {
        let raw = r#"[
            {
                "type": "delegation",
                "id": 1098907648,
                "level": 109,
                "timestamp": "2018-06-30T19:30:27Z",
                "block": "BLwRUPupZMAMaZ7BPFsCpVJCF4TuqBxJCtD5YVkWZX8eXNnWbzp",
                "hash": "oneP2kbDyDyVX5WqdBS9KW4PMCrQhCk5aNRkBbxmYU8onrxnHTB",
                "counter": 24,
                "sender": { "address": "tz1Wit2PqodvPeuRRhdQXmkrtU8e8bRYZecd" },
                "gasLimit": 0,
                "newDelegate": { "alias": "Foundation Baker 1", "address": "tz3RDC3Jdn4j15J7bBHZd29EUee9gVB1CxD9" },
                "amount": 25079312620,
                "status": "applied"
            },
            {
                "type": "delegation",
                "id": 1098907649,
                "level": 110,
                "timestamp": "2018-06-30T19:31:27Z",
                "hash": "ooXXX",
                "sender": { "address": "tz1Wit2PqodvPeuRRhdQXmkrtU8e8bRYZecd" },
                "newDelegate": null,
                "amount": 0,
                "status": "failed"
            }
        ]"#;

        let ops: Vec<TzktDelegation> = serde_json::from_str(raw).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].id, 1_098_907_648);
        assert_eq!(ops[0].amount, 25_079_312_620);
        assert_eq!(
            ops[0].new_delegate.as_ref().and_then(|d| d.alias.as_deref()),
            Some("Foundation Baker 1")
        );
        assert_eq!(ops[0].timestamp.timestamp(), 1_530_387_027);
        assert!(ops[1].new_delegate.is_none());
        assert_eq!(ops[1].status, "failed");
    }
}
