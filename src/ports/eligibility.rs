//! Eligibility Port - Reference-Asset Holding Checks

use async_trait::async_trait;

use crate::domain::types::{AccountId, Amount, AssetRef};

/// Answers "does this account hold enough of this asset?".
///
/// Implementations may fail (unreachable node, malformed asset handle).
/// Callers treat any error as "not eligible"; it never faults the ledger.
#[async_trait]
pub trait EligibilityOracle: Send + Sync + 'static {
  async fn holds(
    &self,
    account: &AccountId,
    asset: &AssetRef,
    min_holding: Amount,
  ) -> anyhow::Result<bool>;
}
