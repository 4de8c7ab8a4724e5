//! Ledger API Request/Response Types
//!
//! Request amounts are decimal strings in whole asset units (`"1.5"`).
//! Responses carry raw base units, plus a formatted copy where a human
//! is the likely reader.

use serde::{Deserialize, Serialize};

use crate::domain::types::{AccountId, Amount, MarketId, MarketKind, OptionId};

/// Market creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMarketRequest {
  /// Reference asset handle (ERC-20 address on chain deployments).
  pub asset: String,
  pub question: String,
  pub kind: MarketKind,
  pub duration_secs: i64,
  /// Option labels, 2 to 10.
  pub options: Vec<String>,
  /// Seed liquidity split evenly across options.
  #[serde(default)]
  pub seed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBetRequest {
  pub option: OptionId,
  pub amount: String,
}

/// Liquidity injection; `option` 0 spreads across every option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRequest {
  #[serde(default)]
  pub option: OptionId,
  pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeBoundsRequest {
  pub min_stake: String,
  pub max_stake: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinHoldingRequest {
  pub min_holding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeRequest {
  pub fee_bps: u16,
}

/// Display-only payout estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutResponse {
  pub market_id: MarketId,
  pub account: AccountId,
  /// Base units.
  pub amount: Amount,
  /// `amount` in whole asset units.
  pub formatted: String,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
  /// Error taxonomy name (`not_found`, `state_conflict`, ...).
  pub kind: String,
  pub error: String,
}
