//! Static Holdings - Eligibility Oracle backed by a balance table
//!
//! Balances are keyed by (account, asset). Assets listed as broken make
//! every query fail, which is how a malformed reference asset behaves
//! against a real node.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::domain::types::{AccountId, Amount, AssetRef};
use crate::ports::eligibility::EligibilityOracle;

#[derive(Debug, Clone, Default)]
pub struct StaticHoldings {
    balances: HashMap<(AccountId, AssetRef), Amount>,
    broken: HashSet<AssetRef>,
}

impl StaticHoldings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&mut self, account: AccountId, asset: AssetRef, balance: Amount) {
        self.balances.insert((account, asset), balance);
    }

    pub fn with_balance(
        mut self,
        account: impl Into<AccountId>,
        asset: &str,
        balance: Amount,
    ) -> Self {
        self.set_balance(account.into(), AssetRef::new(asset), balance);
        self
    }

    /// Makes every query against `asset` return an error.
    pub fn break_asset(&mut self, asset: AssetRef) {
        self.broken.insert(asset);
    }

    pub fn balance_of(&self, account: &AccountId, asset: &AssetRef) -> Amount {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl EligibilityOracle for StaticHoldings {
    async fn holds(
        &self,
        account: &AccountId,
        asset: &AssetRef,
        min_holding: Amount,
    ) -> anyhow::Result<bool> {
        anyhow::ensure!(!self.broken.contains(asset), "balance query for {asset} reverted");
        Ok(self.balance_of(account, asset) >= min_holding)
    }
}
