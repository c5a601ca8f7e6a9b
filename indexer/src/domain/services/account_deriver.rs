//! Derives account entities from ingested delegation operations

use std::collections::BTreeMap;

use crate::domain::models::{Account, WalletAddress};
use crate::infrastructure::tzkt::TzktDelegation;

use super::delegation_transformer::APPLIED_STATUS;

pub struct AccountDeriver;

impl AccountDeriver {
    /// One account per unique valid sender and delegate address of the applied
    /// operations in `page`, ordered by address.
    ///
    /// `first_seen_level` is the lowest level the address appears at within
    /// the page. The first non-empty alias wins.
    pub fn derive(page: &[TzktDelegation]) -> Vec<Account> {
        let mut accounts: BTreeMap<String, Account> = BTreeMap::new();

        let parties = page
            .iter()
            .filter(|op| op.status == APPLIED_STATUS)
            .flat_map(|op| {
                std::iter::once((&op.sender, op.level))
                    .chain(op.new_delegate.as_ref().map(|d| (d, op.level)))
            });

        for (party, level) in parties {
            let Ok(address) = WalletAddress::parse(&party.address) else {
                continue;
            };
            let alias = party.alias.clone().filter(|a| !a.is_empty());
            accounts
                .entry(address.as_str().to_string())
                .and_modify(|acc| {
                    acc.first_seen_level = acc.first_seen_level.min(level);
                    if acc.alias.is_none() {
                        acc.alias = alias.clone();
                    }
                })
                .or_insert_with(|| Account {
                    address: address.into_inner(),
                    alias,
                    first_seen_level: level,
                });
        }

        accounts.into_values().collect()
    }
}
