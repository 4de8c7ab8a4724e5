//! Bot Registry - Identity Gate backed by a fixed table

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::types::{AccountId, OptionId};
use crate::ports::identity::IdentityGate;

/// Registered bots and the option each one may not back.
#[derive(Debug, Clone, Default)]
pub struct BotRegistry {
    bots: HashMap<AccountId, Option<OptionId>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bot. `own_option` is its disqualified option in
    /// `BOT_ROI` markets.
    pub fn register(&mut self, account: AccountId, own_option: Option<OptionId>) {
        self.bots.insert(account, own_option);
    }

    pub fn with_bot(mut self, account: impl Into<AccountId>, own_option: OptionId) -> Self {
        self.register(account.into(), Some(own_option));
        self
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }
}

#[async_trait]
impl IdentityGate for BotRegistry {
    async fn is_exempt(&self, account: &AccountId) -> bool {
        self.bots.contains_key(account)
    }

    async fn disqualified_option(&self, account: &AccountId) -> Option<OptionId> {
        self.bots.get(account).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_bot_is_exempt() {
        let registry = BotRegistry::new().with_bot("bot-1", 2);
        assert!(registry.is_exempt(&"bot-1".into()).await);
        assert_eq!(registry.disqualified_option(&"bot-1".into()).await, Some(2));
        assert!(!registry.is_exempt(&"alice".into()).await);
        assert_eq!(registry.disqualified_option(&"alice".into()).await, None);
    }
}
