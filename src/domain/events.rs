//! Ledger notifications for external indexers.
//!
//! Every event carries the post-update totals it touched, so an observer
//! can rebuild ledger state from the stream without querying back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{AccountId, Amount, AssetRef, MarketId, MarketKind, OptionId};

/// A state change committed by the ledger.
///
/// Externally tagged: amounts are `u128` and must not pass through serde's
/// buffered (internally tagged) path, which only carries 64-bit integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    MarketCreated {
        market_id: MarketId,
        creator: AccountId,
        asset: AssetRef,
        question: String,
        kind: MarketKind,
        close_time: DateTime<Utc>,
        options: Vec<String>,
        /// Seed credited to each option.
        seed_per_option: Amount,
        /// Pool at creation (`seed_per_option * options`).
        pool: Amount,
        /// Seed remainder left out of the pool.
        stranded: Amount,
    },
    BetPlaced {
        market_id: MarketId,
        bettor: AccountId,
        option: OptionId,
        amount: Amount,
        option_total: Amount,
        option_bettors: u64,
        pool: Amount,
        bet_count: u64,
    },
    BetIncreased {
        market_id: MarketId,
        bettor: AccountId,
        option: OptionId,
        added: Amount,
        position: Amount,
        option_total: Amount,
        pool: Amount,
    },
    MarketResolved {
        market_id: MarketId,
        resolver: AccountId,
        winning_option: OptionId,
        is_tie: bool,
        tied_options: Vec<OptionId>,
        pool: Amount,
        fee: Amount,
    },
    MarketCancelled {
        market_id: MarketId,
        cancelled_by: AccountId,
        pool: Amount,
    },
    WinningsClaimed {
        market_id: MarketId,
        claimant: AccountId,
        amount: Amount,
    },
    RefundClaimed {
        market_id: MarketId,
        claimant: AccountId,
        amount: Amount,
    },
    LiquiditySeeded {
        market_id: MarketId,
        /// `0` when spread across every option.
        option: OptionId,
        /// Value actually credited to the pool.
        amount: Amount,
        stranded: Amount,
        pool: Amount,
        option_totals: Vec<Amount>,
    },
    FeesWithdrawn {
        recipient: AccountId,
        amount: Amount,
    },
    StakeBoundsUpdated {
        min_stake: Amount,
        max_stake: Amount,
    },
    MinHoldingUpdated {
        min_holding: Amount,
    },
    FeeUpdated {
        fee_bps: u16,
    },
    ResolverGranted {
        account: AccountId,
    },
    ResolverRevoked {
        account: AccountId,
    },
}

impl LedgerEvent {
    /// Stable snake_case name, used as a metrics label.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MarketCreated { .. } => "market_created",
            Self::BetPlaced { .. } => "bet_placed",
            Self::BetIncreased { .. } => "bet_increased",
            Self::MarketResolved { .. } => "market_resolved",
            Self::MarketCancelled { .. } => "market_cancelled",
            Self::WinningsClaimed { .. } => "winnings_claimed",
            Self::RefundClaimed { .. } => "refund_claimed",
            Self::LiquiditySeeded { .. } => "liquidity_seeded",
            Self::FeesWithdrawn { .. } => "fees_withdrawn",
            Self::StakeBoundsUpdated { .. } => "stake_bounds_updated",
            Self::MinHoldingUpdated { .. } => "min_holding_updated",
            Self::FeeUpdated { .. } => "fee_updated",
            Self::ResolverGranted { .. } => "resolver_granted",
            Self::ResolverRevoked { .. } => "resolver_revoked",
        }
    }

    /// Market the event belongs to, if any.
    pub const fn market_id(&self) -> Option<MarketId> {
        match self {
            Self::MarketCreated { market_id, .. }
            | Self::BetPlaced { market_id, .. }
            | Self::BetIncreased { market_id, .. }
            | Self::MarketResolved { market_id, .. }
            | Self::MarketCancelled { market_id, .. }
            | Self::WinningsClaimed { market_id, .. }
            | Self::RefundClaimed { market_id, .. }
            | Self::LiquiditySeeded { market_id, .. } => Some(*market_id),
            _ => None,
        }
    }
}

/// An event stamped with the ledger version that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEnvelope {
    /// Ledger sequence after the commit.
    pub sequence: u64,
    pub at: DateTime<Utc>,
    pub event: LedgerEvent,
}
