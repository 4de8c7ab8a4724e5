//! Identity Port - Bot Registry Interface
//!
//! Registered bots skip the holding check but may never back their own
//! option in a `BOT_ROI` market. The registry itself is managed elsewhere.

use async_trait::async_trait;

use crate::domain::types::{AccountId, OptionId};

/// Read-only view of the bot registry.
#[async_trait]
pub trait IdentityGate: Send + Sync + 'static {
  /// Whether the account is a registered bot.
  async fn is_exempt(&self, account: &AccountId) -> bool;

  /// The option a bot may not stake on in `BOT_ROI` markets.
  ///
  /// `None` for unregistered accounts and for bots without one.
  async fn disqualified_option(&self, account: &AccountId) -> Option<OptionId>;
}
