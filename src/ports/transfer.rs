//! Value Transfer Port - Outbound Payments
//!
//! Used only at claim, refund and fee-withdrawal time, after the ledger
//! has marked the record being paid.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::types::{AccountId, Amount};

/// Confirmation of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
  /// Adapter-specific reference (transaction hash, ledger entry id).
  pub reference: String,
  pub recipient: AccountId,
  pub amount: Amount,
}

/// Moves value to an external recipient.
///
/// An `Err` means nothing was sent; the ledger rolls back the operation
/// that requested the transfer.
#[async_trait]
pub trait ValueTransfer: Send + Sync + 'static {
  async fn send(&self, recipient: &AccountId, amount: Amount) -> anyhow::Result<TransferReceipt>;
}
