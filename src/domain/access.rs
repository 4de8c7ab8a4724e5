//! Owner and resolver capability checks.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};
use super::types::AccountId;

/// Who may resolve, cancel, seed and administer the ledger.
///
/// The owner always holds resolver authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: AccountId,
    resolvers: BTreeSet<AccountId>,
}

impl AccessControl {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            resolvers: BTreeSet::new(),
        }
    }

    pub const fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn is_owner(&self, account: &AccountId) -> bool {
        &self.owner == account
    }

    pub fn is_resolver(&self, account: &AccountId) -> bool {
        self.is_owner(account) || self.resolvers.contains(account)
    }

    pub fn resolvers(&self) -> impl Iterator<Item = &AccountId> {
        self.resolvers.iter()
    }

    /// Returns `false` if the account already held the role.
    pub fn grant(&mut self, account: AccountId) -> bool {
        self.resolvers.insert(account)
    }

    /// Returns `false` if the account did not hold the role.
    pub fn revoke(&mut self, account: &AccountId) -> bool {
        self.resolvers.remove(account)
    }

    pub fn require_owner(&self, account: &AccountId, action: &'static str) -> LedgerResult<()> {
        if self.is_owner(account) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                account: account.clone(),
                action,
            })
        }
    }

    pub fn require_resolver(&self, account: &AccountId, action: &'static str) -> LedgerResult<()> {
        if self.is_resolver(account) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                account: account.clone(),
                action,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_resolver() {
        let access = AccessControl::new("owner".into());
        assert!(access.is_resolver(&"owner".into()));
        assert!(!access.is_resolver(&"alice".into()));
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut access = AccessControl::new("owner".into());
        assert!(access.grant("oracle".into()));
        assert!(!access.grant("oracle".into()));
        assert!(access.require_resolver(&"oracle".into(), "resolve").is_ok());
        assert!(access.require_owner(&"oracle".into(), "withdraw fees").is_err());
        assert!(access.revoke(&"oracle".into()));
        assert!(access.require_resolver(&"oracle".into(), "resolve").is_err());
    }
}
