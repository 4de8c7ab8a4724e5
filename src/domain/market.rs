//! Market, option and bet records.
//!
//! A market is in exactly one of three lifecycle states for its whole life:
//! open, resolved or cancelled. The state is a single tagged variant so the
//! three can never overlap.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{AccountId, Amount, AssetRef, MarketId, MarketKind, OptionId};

/// One selectable outcome within a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOption {
    /// Fixed at creation.
    pub label: String,
    /// Sum of every stake on this option, seeded liquidity included.
    pub total_staked: Amount,
    /// Number of distinct bettors whose position is on this option.
    pub bettor_count: u64,
}

/// A bettor's cumulative position in one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Chosen at first stake; never changes afterwards.
    pub option: OptionId,
    /// Cumulative stake.
    pub amount: Amount,
    /// Set exactly once, on payout or refund.
    pub claimed: bool,
    /// Time of the first stake.
    pub placed_at: DateTime<Utc>,
}

/// Declared outcome of a resolved market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    /// A single winning option.
    Winner { option: OptionId },
    /// Joint winners. `declared` is the option the resolver named; payouts
    /// only look at `options`, which is kept exactly as supplied.
    Tie {
        declared: OptionId,
        options: Vec<OptionId>,
    },
}

impl Outcome {
    /// Whether a position on `option` is paid out.
    pub fn pays(&self, option: OptionId) -> bool {
        match self {
            Self::Winner { option: winner } => *winner == option,
            Self::Tie { options, .. } => options.contains(&option),
        }
    }
}

/// Terminal data recorded once, at resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: Outcome,
    pub resolved_at: DateTime<Utc>,
    pub resolved_by: AccountId,
    /// Fee extracted from the pool at resolution time; never recomputed.
    pub fee: Amount,
}

/// Lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    Open,
    Resolved(Resolution),
    Cancelled { cancelled_at: DateTime<Utc> },
}

/// A prediction market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub asset: AssetRef,
    pub question: String,
    pub kind: MarketKind,
    pub creator: AccountId,
    pub created_at: DateTime<Utc>,
    /// Bets are accepted strictly before this instant.
    pub close_time: DateTime<Utc>,
    /// Total value across all options; only grows while open.
    pub pool: Amount,
    /// Number of distinct bettors (not bet events).
    pub bet_count: u64,
    pub status: MarketStatus,
    /// Index 0 holds option 1.
    pub options: Vec<MarketOption>,
    /// Positions keyed by bettor.
    pub bets: BTreeMap<AccountId, Bet>,
    /// Bettors in order of first stake.
    pub bettors: Vec<AccountId>,
}

impl Market {
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn has_option(&self, option: OptionId) -> bool {
        option >= 1 && usize::from(option) <= self.options.len()
    }

    pub fn option(&self, option: OptionId) -> Option<&MarketOption> {
        if self.has_option(option) {
            self.options.get(usize::from(option) - 1)
        } else {
            None
        }
    }

    pub(crate) fn option_mut(&mut self, option: OptionId) -> Option<&mut MarketOption> {
        if self.has_option(option) {
            self.options.get_mut(usize::from(option) - 1)
        } else {
            None
        }
    }

    pub const fn is_open(&self) -> bool {
        matches!(self.status, MarketStatus::Open)
    }

    pub const fn is_resolved(&self) -> bool {
        matches!(self.status, MarketStatus::Resolved(_))
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self.status, MarketStatus::Cancelled { .. })
    }

    pub const fn resolution(&self) -> Option<&Resolution> {
        match &self.status {
            MarketStatus::Resolved(resolution) => Some(resolution),
            _ => None,
        }
    }

    /// Meaningful only when resolved.
    pub fn is_tie(&self) -> bool {
        matches!(
            self.resolution().map(|r| &r.outcome),
            Some(Outcome::Tie { .. })
        )
    }

    /// The single winning option; `None` while open, when cancelled and
    /// for ties.
    pub fn winning_option(&self) -> Option<OptionId> {
        match self.resolution().map(|r| &r.outcome) {
            Some(Outcome::Winner { option }) => Some(*option),
            _ => None,
        }
    }

    /// Tied winners in the order supplied; empty unless resolved as a tie.
    pub fn tied_options(&self) -> &[OptionId] {
        match self.resolution().map(|r| &r.outcome) {
            Some(Outcome::Tie { options, .. }) => options,
            _ => &[],
        }
    }

    /// Sum of every option's `total_staked`.
    pub fn staked_total(&self) -> Amount {
        self.options.iter().map(|o| o.total_staked).sum()
    }

    /// Stake on the winning side: the single winner's total, or the sum
    /// over the tied list (a duplicated entry counts twice).
    pub fn winning_stake(&self) -> Amount {
        match self.resolution().map(|r| &r.outcome) {
            Some(Outcome::Winner { option }) => {
                self.option(*option).map_or(0, |o| o.total_staked)
            }
            Some(Outcome::Tie { options, .. }) => options
                .iter()
                .filter_map(|id| self.option(*id))
                .map(|o| o.total_staked)
                .sum(),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_with(status: MarketStatus, stakes: &[Amount]) -> Market {
        let now = Utc::now();
        Market {
            id: 1,
            asset: AssetRef::new("0xasset"),
            question: "Who wins?".to_string(),
            kind: MarketKind::Custom,
            creator: AccountId::from("creator"),
            created_at: now,
            close_time: now,
            pool: stakes.iter().sum(),
            bet_count: 0,
            status,
            options: stakes
                .iter()
                .enumerate()
                .map(|(i, s)| MarketOption {
                    label: format!("opt{}", i + 1),
                    total_staked: *s,
                    bettor_count: 0,
                })
                .collect(),
            bets: BTreeMap::new(),
            bettors: Vec::new(),
        }
    }

    fn resolved(outcome: Outcome) -> MarketStatus {
        MarketStatus::Resolved(Resolution {
            outcome,
            resolved_at: Utc::now(),
            resolved_by: AccountId::from("resolver"),
            fee: 0,
        })
    }

    #[test]
    fn test_option_indexing_is_one_based() {
        let market = market_with(MarketStatus::Open, &[5, 7]);
        assert!(!market.has_option(0));
        assert_eq!(market.option(1).unwrap().total_staked, 5);
        assert_eq!(market.option(2).unwrap().total_staked, 7);
        assert!(market.option(3).is_none());
    }

    #[test]
    fn test_open_market_has_no_winner() {
        let market = market_with(MarketStatus::Open, &[5, 7]);
        assert!(market.is_open());
        assert_eq!(market.winning_option(), None);
        assert!(market.tied_options().is_empty());
        assert_eq!(market.winning_stake(), 0);
    }

    #[test]
    fn test_single_winner_accessors() {
        let market = market_with(resolved(Outcome::Winner { option: 2 }), &[5, 7]);
        assert!(market.is_resolved());
        assert!(!market.is_tie());
        assert_eq!(market.winning_option(), Some(2));
        assert_eq!(market.winning_stake(), 7);
    }

    #[test]
    fn test_tie_sums_listed_options() {
        let market = market_with(
            resolved(Outcome::Tie { declared: 1, options: vec![1, 3] }),
            &[5, 7, 11],
        );
        assert!(market.is_tie());
        assert_eq!(market.winning_option(), None);
        assert_eq!(market.tied_options(), &[1, 3]);
        assert_eq!(market.winning_stake(), 16);
    }

    #[test]
    fn test_tie_duplicate_counts_twice() {
        let market = market_with(
            resolved(Outcome::Tie { declared: 1, options: vec![1, 1] }),
            &[5, 7],
        );
        assert_eq!(market.winning_stake(), 10);
    }

    #[test]
    fn test_outcome_pays() {
        assert!(Outcome::Winner { option: 1 }.pays(1));
        assert!(!Outcome::Winner { option: 1 }.pays(2));
        let tie = Outcome::Tie { declared: 2, options: vec![2, 3] };
        assert!(tie.pays(3));
        assert!(!tie.pays(1));
    }
}
