use std::fmt;

use thiserror::Error;

const ADDRESS_LENGTH: usize = 36;
const ADDRESS_PREFIXES: [&str; 4] = ["tz1", "tz2", "tz3", "KT1"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("wallet address must be {ADDRESS_LENGTH} characters, got {0}")]
    InvalidLength(usize),
    #[error("wallet address must start with one of tz1, tz2, tz3, KT1: {0}")]
    InvalidPrefix(String),
}

/// Tezos implicit (`tz1`/`tz2`/`tz3`) or originated (`KT1`) account address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        if raw.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(raw.len()));
        }
        if !ADDRESS_PREFIXES.iter().any(|prefix| raw.starts_with(prefix)) {
            return Err(AddressError::InvalidPrefix(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_known_prefix() {
        for addr in [
            "tz1a1SAaXRt9yoGMx29rh9FsBF4UzmvojdTL",
            "tz2FCNBrERXtaTtNX6iimR1UJ5JSDxvdHM93",
            "tz3WXYtyDUNL91qfiCJtVUX746QpNv5i5ve5",
            "KT1PWx2mnDueood7fEmfbBDKx1D9BAnnXitn",
        ] {
            assert!(WalletAddress::is_valid(addr), "{addr} should be valid");
        }
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            WalletAddress::parse("tz1short"),
            Err(AddressError::InvalidLength(8))
        );
        assert!(!WalletAddress::is_valid(""));
    }

    #[test]
    fn rejects_unknown_prefix() {
        let err = WalletAddress::parse("tz4a1SAaXRt9yoGMx29rh9FsBF4UzmvojdTL").unwrap_err();
        assert!(matches!(err, AddressError::InvalidPrefix(_)));
    }
}
