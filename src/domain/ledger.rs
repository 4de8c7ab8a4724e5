//! The pari-mutuel ledger state machine.
//!
//! Pure and synchronous: time comes in as an argument and nothing here
//! touches the outside world. Every operation validates completely before
//! mutating, so a returned error always means "no state change".
//!
//! Payouts are two-phase. `begin_*` marks the record (claimed flag, zeroed
//! fee counter) and hands back a [`PendingPayout`]; the caller then moves
//! the value and either [`Ledger::settle_payout`]s or
//! [`Ledger::abort_payout`]s. The mark lands before the transfer, so a
//! recipient that re-enters cannot claim twice.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::access::AccessControl;
use super::error::{LedgerError, LedgerResult};
use super::events::LedgerEvent;
use super::market::{Bet, Market, MarketOption, MarketStatus, Outcome, Resolution};
use super::payout::{self, FeeSchedule};
use super::types::{
    ALL_OPTIONS, AccountId, Amount, AssetRef, MAX_DURATION_SECS, MAX_OPTIONS, MIN_DURATION_SECS,
    MIN_OPTIONS, MarketId, MarketKind, OptionId,
};

/// Owner-tunable ledger parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    pub min_stake: Amount,
    pub max_stake: Amount,
    /// Reference-asset balance a non-exempt bettor must hold.
    pub min_holding: Amount,
    pub fee: FeeSchedule,
}

impl Default for LedgerParams {
    /// 0.001 to 100 units of an 18-decimal asset, 1 unit holding, 2.5% fee.
    fn default() -> Self {
        Self {
            min_stake: 1_000_000_000_000_000,
            max_stake: 100_000_000_000_000_000_000,
            min_holding: 1_000_000_000_000_000_000,
            fee: FeeSchedule::default(),
        }
    }
}

/// Parameters for a new market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMarket {
    pub asset: AssetRef,
    pub question: String,
    pub kind: MarketKind,
    pub duration_secs: i64,
    pub options: Vec<String>,
}

/// A resolver's verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub winning_option: OptionId,
    #[serde(default)]
    pub is_tie: bool,
    /// Copied verbatim when `is_tie` is set; ignored otherwise.
    #[serde(default)]
    pub tied_options: Vec<OptionId>,
}

impl ResolveRequest {
    pub const fn winner(option: OptionId) -> Self {
        Self {
            winning_option: option,
            is_tie: false,
            tied_options: Vec::new(),
        }
    }

    pub fn tie(declared: OptionId, options: Vec<OptionId>) -> Self {
        Self {
            winning_option: declared,
            is_tie: true,
            tied_options: options,
        }
    }
}

/// What the admission gates need to know about a bet that passed the
/// ledger's own preconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetAdmission {
    pub kind: MarketKind,
    pub asset: AssetRef,
    pub min_holding: Amount,
}

impl BetAdmission {
    /// Applies the bot rules for `bettor` staking on `option`.
    ///
    /// Returns whether the bettor still owes a holding check: bots are
    /// exempt, everyone else is not.
    pub fn screen_identity(
        &self,
        bettor: &AccountId,
        option: OptionId,
        is_bot: bool,
        disqualified: Option<OptionId>,
    ) -> LedgerResult<bool> {
        if is_bot && self.kind.restricts_self_bet() && disqualified == Some(option) {
            return Err(LedgerError::SelfBetForbidden {
                account: bettor.clone(),
                option,
            });
        }
        Ok(!is_bot)
    }
}

/// Value owed to someone, already marked in the ledger but not yet sent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending payout must be settled or aborted"]
pub enum PendingPayout {
    Winnings {
        market_id: MarketId,
        claimant: AccountId,
        amount: Amount,
    },
    Refund {
        market_id: MarketId,
        claimant: AccountId,
        amount: Amount,
    },
    Fees {
        recipient: AccountId,
        amount: Amount,
    },
}

impl PendingPayout {
    pub const fn recipient(&self) -> &AccountId {
        match self {
            Self::Winnings { claimant, .. } | Self::Refund { claimant, .. } => claimant,
            Self::Fees { recipient, .. } => recipient,
        }
    }

    pub const fn amount(&self) -> Amount {
        match self {
            Self::Winnings { amount, .. } | Self::Refund { amount, .. } | Self::Fees { amount, .. } => {
                *amount
            }
        }
    }
}

/// Ledger-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub markets: u64,
    pub accumulated_fees: Amount,
    pub total_volume: Amount,
    pub total_paid_out: Amount,
    pub sequence: u64,
    pub params: LedgerParams,
}

/// All markets, options and bets, plus fee and volume counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    params: LedgerParams,
    access: AccessControl,
    markets: BTreeMap<MarketId, Market>,
    next_market_id: MarketId,
    accumulated_fees: Amount,
    total_volume: Amount,
    total_paid_out: Amount,
    /// Bumped on every committed mutation.
    sequence: u64,
}

impl Ledger {
    pub fn new(owner: AccountId, params: LedgerParams) -> Self {
        Self {
            params,
            access: AccessControl::new(owner),
            markets: BTreeMap::new(),
            next_market_id: 1,
            accumulated_fees: 0,
            total_volume: 0,
            total_paid_out: 0,
            sequence: 0,
        }
    }

    // ── Queries ─────────────────────────────────────────────

    pub const fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub const fn access(&self) -> &AccessControl {
        &self.access
    }

    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    pub const fn accumulated_fees(&self) -> Amount {
        self.accumulated_fees
    }

    pub const fn total_volume(&self) -> Amount {
        self.total_volume
    }

    pub fn market(&self, market_id: MarketId) -> LedgerResult<&Market> {
        self.markets
            .get(&market_id)
            .ok_or(LedgerError::MarketNotFound(market_id))
    }

    pub fn option(&self, market_id: MarketId, option: OptionId) -> LedgerResult<&MarketOption> {
        self.market(market_id)?
            .option(option)
            .ok_or(LedgerError::InvalidOption { market_id, option })
    }

    pub fn bet(&self, market_id: MarketId, bettor: &AccountId) -> LedgerResult<Option<&Bet>> {
        Ok(self.market(market_id)?.bets.get(bettor))
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            markets: self.markets.len() as u64,
            accumulated_fees: self.accumulated_fees,
            total_volume: self.total_volume,
            total_paid_out: self.total_paid_out,
            sequence: self.sequence,
            params: self.params,
        }
    }

    /// What `bettor` would receive right now. Display only.
    ///
    /// Open markets assume the bettor's option wins alone and use the
    /// current fee rate; resolved markets use the fee fixed at resolution;
    /// cancelled markets return the stake. Claimed positions are worth 0.
    pub fn potential_payout(&self, market_id: MarketId, bettor: &AccountId) -> LedgerResult<Amount> {
        let market = self.market(market_id)?;
        let Some(bet) = market.bets.get(bettor).filter(|b| !b.claimed) else {
            return Ok(0);
        };
        match &market.status {
            MarketStatus::Open => {
                let after_fee = self.params.fee.net_of_fee(market.pool)?;
                let side = market.option(bet.option).map_or(0, |o| o.total_staked);
                payout::winnings(bet.amount, after_fee, side)
            }
            MarketStatus::Resolved(resolution) => {
                if !resolution.outcome.pays(bet.option) {
                    return Ok(0);
                }
                payout::winnings(
                    bet.amount,
                    market.pool - resolution.fee,
                    market.winning_stake(),
                )
            }
            MarketStatus::Cancelled { .. } => Ok(bet.amount),
        }
    }

    /// Broken invariants, as human-readable lines. Empty when healthy.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (id, market) in &self.markets {
            if market.staked_total() != market.pool {
                problems.push(format!(
                    "market {id}: option totals {} != pool {}",
                    market.staked_total(),
                    market.pool
                ));
            }
            if market.bet_count != market.bets.len() as u64
                || market.bettors.len() != market.bets.len()
            {
                problems.push(format!("market {id}: bettor roster out of sync"));
            }
            for (index, option) in market.options.iter().enumerate() {
                let on_option = market
                    .bets
                    .values()
                    .filter(|b| usize::from(b.option) == index + 1)
                    .count() as u64;
                if on_option != option.bettor_count {
                    problems.push(format!(
                        "market {id} option {}: bettor_count {} != {on_option} positions",
                        index + 1,
                        option.bettor_count
                    ));
                }
            }
        }
        problems
    }

    // ── Market creation ─────────────────────────────────────

    /// Opens a market, optionally seeding every option evenly with `seed`.
    ///
    /// The seed remainder (`seed % options`) is not added to the pool.
    pub fn create_market(
        &mut self,
        creator: AccountId,
        request: NewMarket,
        seed: Amount,
        now: DateTime<Utc>,
    ) -> LedgerResult<LedgerEvent> {
        if request.asset.is_absent() {
            return Err(LedgerError::InvalidMarket("reference asset is required".to_string()));
        }
        if request.question.trim().is_empty() {
            return Err(LedgerError::InvalidMarket("question is empty".to_string()));
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&request.duration_secs) {
            return Err(LedgerError::InvalidMarket(format!(
                "duration {}s outside [{MIN_DURATION_SECS}, {MAX_DURATION_SECS}]",
                request.duration_secs
            )));
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&request.options.len()) {
            return Err(LedgerError::InvalidMarket(format!(
                "{} options outside [{MIN_OPTIONS}, {MAX_OPTIONS}]",
                request.options.len()
            )));
        }

        let split = payout::split_evenly(seed, request.options.len());
        let close_time = now + Duration::seconds(request.duration_secs);
        let market_id = self.next_market_id;

        let market = Market {
            id: market_id,
            asset: request.asset.clone(),
            question: request.question.clone(),
            kind: request.kind,
            creator: creator.clone(),
            created_at: now,
            close_time,
            pool: split.distributed,
            bet_count: 0,
            status: MarketStatus::Open,
            options: request
                .options
                .iter()
                .map(|label| MarketOption {
                    label: label.clone(),
                    total_staked: split.per_option,
                    bettor_count: 0,
                })
                .collect(),
            bets: BTreeMap::new(),
            bettors: Vec::new(),
        };

        self.markets.insert(market_id, market);
        self.next_market_id += 1;
        self.sequence += 1;

        Ok(LedgerEvent::MarketCreated {
            market_id,
            creator,
            asset: request.asset,
            question: request.question,
            kind: request.kind,
            close_time,
            options: request.options,
            seed_per_option: split.per_option,
            pool: split.distributed,
            stranded: split.stranded,
        })
    }

    // ── Betting ─────────────────────────────────────────────

    /// Runs the ledger's own bet preconditions, in order: market exists,
    /// not resolved, not cancelled, window open, option in range, stake
    /// within bounds.
    ///
    /// Identity and eligibility gates run after this, outside the ledger.
    pub fn check_bet(
        &self,
        market_id: MarketId,
        option: OptionId,
        stake: Amount,
        now: DateTime<Utc>,
    ) -> LedgerResult<BetAdmission> {
        let market = self.market(market_id)?;
        match market.status {
            MarketStatus::Resolved(_) => return Err(LedgerError::AlreadyResolved(market_id)),
            MarketStatus::Cancelled { .. } => return Err(LedgerError::MarketCancelled(market_id)),
            MarketStatus::Open => {}
        }
        if now >= market.close_time {
            return Err(LedgerError::BettingClosed(market_id));
        }
        if !market.has_option(option) {
            return Err(LedgerError::InvalidOption { market_id, option });
        }
        if stake < self.params.min_stake {
            return Err(LedgerError::StakeTooSmall {
                stake,
                min: self.params.min_stake,
            });
        }
        if stake > self.params.max_stake {
            return Err(LedgerError::StakeTooLarge {
                stake,
                max: self.params.max_stake,
            });
        }
        Ok(BetAdmission {
            kind: market.kind,
            asset: market.asset.clone(),
            min_holding: self.params.min_holding,
        })
    }

    /// Records a stake that already passed every admission gate.
    ///
    /// A first stake opens a position on `option`; later stakes must target
    /// the same option and only grow the amount.
    pub fn apply_bet(
        &mut self,
        bettor: AccountId,
        market_id: MarketId,
        option: OptionId,
        stake: Amount,
        now: DateTime<Utc>,
    ) -> LedgerResult<LedgerEvent> {
        self.check_bet(market_id, option, stake, now)?;
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(LedgerError::MarketNotFound(market_id))?;

        let existing = market.bets.get(&bettor).map(|b| (b.option, b.amount));
        if let Some((recorded, _)) = existing {
            if recorded != option {
                return Err(LedgerError::SameOptionRequired {
                    recorded,
                    requested: option,
                });
            }
        }

        let pool = market.pool.checked_add(stake).ok_or(LedgerError::Overflow)?;
        let option_total = market
            .option(option)
            .map(|o| o.total_staked)
            .ok_or(LedgerError::InvalidOption { market_id, option })?
            .checked_add(stake)
            .ok_or(LedgerError::Overflow)?;
        let position = existing
            .map_or(Some(stake), |(_, amount)| amount.checked_add(stake))
            .ok_or(LedgerError::Overflow)?;

        market.pool = pool;
        let slot = market
            .option_mut(option)
            .ok_or(LedgerError::InvalidOption { market_id, option })?;
        slot.total_staked = option_total;
        if existing.is_none() {
            slot.bettor_count += 1;
        }
        let option_bettors = slot.bettor_count;

        let event = match market.bets.get_mut(&bettor) {
            Some(bet) => {
                bet.amount = position;
                LedgerEvent::BetIncreased {
                    market_id,
                    bettor,
                    option,
                    added: stake,
                    position,
                    option_total,
                    pool,
                }
            }
            None => {
                market.bets.insert(
                    bettor.clone(),
                    Bet {
                        option,
                        amount: stake,
                        claimed: false,
                        placed_at: now,
                    },
                );
                market.bettors.push(bettor.clone());
                market.bet_count += 1;
                LedgerEvent::BetPlaced {
                    market_id,
                    bettor,
                    option,
                    amount: stake,
                    option_total,
                    option_bettors,
                    pool,
                    bet_count: market.bet_count,
                }
            }
        };

        self.total_volume = self.total_volume.saturating_add(stake);
        self.sequence += 1;
        Ok(event)
    }

    // ── Resolution & cancellation ───────────────────────────

    /// Declares the outcome and books the platform fee. Irreversible.
    ///
    /// A tied list is stored exactly as given: no de-duplication, no range
    /// check, no requirement that it contains `winning_option`.
    pub fn resolve(
        &mut self,
        caller: &AccountId,
        market_id: MarketId,
        request: ResolveRequest,
        now: DateTime<Utc>,
    ) -> LedgerResult<LedgerEvent> {
        let market = self.market(market_id)?;
        match market.status {
            MarketStatus::Resolved(_) => return Err(LedgerError::AlreadyResolved(market_id)),
            MarketStatus::Cancelled { .. } => return Err(LedgerError::MarketCancelled(market_id)),
            MarketStatus::Open => {}
        }
        if now < market.close_time {
            return Err(LedgerError::BettingStillOpen(market_id));
        }
        if !market.has_option(request.winning_option) {
            return Err(LedgerError::InvalidOption {
                market_id,
                option: request.winning_option,
            });
        }
        self.access.require_resolver(caller, "resolve markets")?;

        let pool = market.pool;
        let fee = self.params.fee.fee_on(pool)?;
        let accumulated = self
            .accumulated_fees
            .checked_add(fee)
            .ok_or(LedgerError::Overflow)?;

        let outcome = if request.is_tie {
            Outcome::Tie {
                declared: request.winning_option,
                options: request.tied_options.clone(),
            }
        } else {
            Outcome::Winner {
                option: request.winning_option,
            }
        };
        let tied_options = if request.is_tie {
            request.tied_options
        } else {
            Vec::new()
        };

        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(LedgerError::MarketNotFound(market_id))?;
        market.status = MarketStatus::Resolved(Resolution {
            outcome,
            resolved_at: now,
            resolved_by: caller.clone(),
            fee,
        });
        self.accumulated_fees = accumulated;
        self.sequence += 1;

        Ok(LedgerEvent::MarketResolved {
            market_id,
            resolver: caller.clone(),
            winning_option: request.winning_option,
            is_tie: request.is_tie,
            tied_options,
            pool,
            fee,
        })
    }

    /// Voids an open market. Irreversible; no fee is ever taken.
    pub fn cancel(
        &mut self,
        caller: &AccountId,
        market_id: MarketId,
        now: DateTime<Utc>,
    ) -> LedgerResult<LedgerEvent> {
        let market = self.market(market_id)?;
        match market.status {
            MarketStatus::Resolved(_) => return Err(LedgerError::AlreadyResolved(market_id)),
            MarketStatus::Cancelled { .. } => return Err(LedgerError::MarketCancelled(market_id)),
            MarketStatus::Open => {}
        }
        self.access.require_resolver(caller, "cancel markets")?;

        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(LedgerError::MarketNotFound(market_id))?;
        market.status = MarketStatus::Cancelled { cancelled_at: now };
        let pool = market.pool;
        self.sequence += 1;

        Ok(LedgerEvent::MarketCancelled {
            market_id,
            cancelled_by: caller.clone(),
            pool,
        })
    }

    // ── Liquidity ───────────────────────────────────────────

    /// Injects liquidity into an open market.
    ///
    /// `option == 0` spreads `value` evenly with the same truncation as
    /// creation-time seeding; only the distributed part enters the pool.
    pub fn seed(
        &mut self,
        caller: &AccountId,
        market_id: MarketId,
        option: OptionId,
        value: Amount,
    ) -> LedgerResult<LedgerEvent> {
        let market = self.market(market_id)?;
        match market.status {
            MarketStatus::Resolved(_) => return Err(LedgerError::AlreadyResolved(market_id)),
            MarketStatus::Cancelled { .. } => return Err(LedgerError::MarketCancelled(market_id)),
            MarketStatus::Open => {}
        }
        if option != ALL_OPTIONS && !market.has_option(option) {
            return Err(LedgerError::InvalidOption { market_id, option });
        }
        self.access.require_resolver(caller, "seed liquidity")?;

        let (credits, stranded): (Vec<Amount>, Amount) = if option == ALL_OPTIONS {
            let split = payout::split_evenly(value, market.option_count());
            (vec![split.per_option; market.option_count()], split.stranded)
        } else {
            let mut credits = vec![0; market.option_count()];
            credits[usize::from(option) - 1] = value;
            (credits, 0)
        };
        let distributed: Amount = credits.iter().sum();
        if distributed == 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "seed of {value} credits nothing across {} options",
                market.option_count()
            )));
        }

        let pool = market
            .pool
            .checked_add(distributed)
            .ok_or(LedgerError::Overflow)?;
        let option_totals = market
            .options
            .iter()
            .zip(&credits)
            .map(|(o, credit)| o.total_staked.checked_add(*credit))
            .collect::<Option<Vec<_>>>()
            .ok_or(LedgerError::Overflow)?;

        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(LedgerError::MarketNotFound(market_id))?;
        market.pool = pool;
        for (slot, total) in market.options.iter_mut().zip(&option_totals) {
            slot.total_staked = *total;
        }
        self.sequence += 1;

        Ok(LedgerEvent::LiquiditySeeded {
            market_id,
            option,
            amount: distributed,
            stranded,
            pool,
            option_totals,
        })
    }

    // ── Payouts ─────────────────────────────────────────────

    /// Marks a winner's position claimed and computes the payout:
    /// `amount * (pool - fee) / winning_stake`, truncated.
    pub fn begin_claim(
        &mut self,
        claimant: &AccountId,
        market_id: MarketId,
    ) -> LedgerResult<PendingPayout> {
        let market = self.market(market_id)?;
        let resolution = match &market.status {
            MarketStatus::Resolved(resolution) => resolution,
            MarketStatus::Open | MarketStatus::Cancelled { .. } => {
                return Err(LedgerError::NotResolved(market_id));
            }
        };
        let bet = Self::claimable_bet(market, claimant)?;
        if !resolution.outcome.pays(bet.option) {
            return Err(LedgerError::NotWinner {
                market_id,
                option: bet.option,
            });
        }

        let pool_after_fee = market.pool - resolution.fee;
        let amount = payout::winnings(bet.amount, pool_after_fee, market.winning_stake())?;

        self.mark_claimed(market_id, claimant, true)?;
        Ok(PendingPayout::Winnings {
            market_id,
            claimant: claimant.clone(),
            amount,
        })
    }

    /// Marks a position in a cancelled market refunded; pays back the stake
    /// exactly.
    pub fn begin_refund(
        &mut self,
        claimant: &AccountId,
        market_id: MarketId,
    ) -> LedgerResult<PendingPayout> {
        let market = self.market(market_id)?;
        if !market.is_cancelled() {
            return Err(LedgerError::NotCancelled(market_id));
        }
        let amount = Self::claimable_bet(market, claimant)?.amount;

        self.mark_claimed(market_id, claimant, true)?;
        Ok(PendingPayout::Refund {
            market_id,
            claimant: claimant.clone(),
            amount,
        })
    }

    /// Zeroes the fee counter and hands the whole balance to the owner.
    pub fn begin_fee_withdrawal(&mut self, caller: &AccountId) -> LedgerResult<PendingPayout> {
        self.access.require_owner(caller, "withdraw fees")?;
        if self.accumulated_fees == 0 {
            return Err(LedgerError::NothingToWithdraw);
        }
        let amount = std::mem::take(&mut self.accumulated_fees);
        Ok(PendingPayout::Fees {
            recipient: self.access.owner().clone(),
            amount,
        })
    }

    /// Confirms a transferred payout.
    pub fn settle_payout(&mut self, payout: PendingPayout) -> LedgerEvent {
        self.total_paid_out = self.total_paid_out.saturating_add(payout.amount());
        self.sequence += 1;
        match payout {
            PendingPayout::Winnings {
                market_id,
                claimant,
                amount,
            } => LedgerEvent::WinningsClaimed {
                market_id,
                claimant,
                amount,
            },
            PendingPayout::Refund {
                market_id,
                claimant,
                amount,
            } => LedgerEvent::RefundClaimed {
                market_id,
                claimant,
                amount,
            },
            PendingPayout::Fees { recipient, amount } => {
                LedgerEvent::FeesWithdrawn { recipient, amount }
            }
        }
    }

    /// Undoes the mark made by `begin_*` after a failed transfer.
    pub fn abort_payout(&mut self, payout: PendingPayout) -> LedgerResult<()> {
        match payout {
            PendingPayout::Winnings {
                market_id,
                claimant,
                ..
            }
            | PendingPayout::Refund {
                market_id,
                claimant,
                ..
            } => self.mark_claimed(market_id, &claimant, false),
            PendingPayout::Fees { amount, .. } => {
                self.accumulated_fees = self
                    .accumulated_fees
                    .checked_add(amount)
                    .ok_or(LedgerError::Overflow)?;
                Ok(())
            }
        }
    }

    fn claimable_bet<'a>(market: &'a Market, claimant: &AccountId) -> LedgerResult<&'a Bet> {
        let bet = market
            .bets
            .get(claimant)
            .filter(|b| b.amount > 0)
            .ok_or_else(|| LedgerError::NoStake {
                market_id: market.id,
                account: claimant.clone(),
            })?;
        if bet.claimed {
            return Err(LedgerError::AlreadyClaimed {
                market_id: market.id,
                account: claimant.clone(),
            });
        }
        Ok(bet)
    }

    fn mark_claimed(
        &mut self,
        market_id: MarketId,
        claimant: &AccountId,
        claimed: bool,
    ) -> LedgerResult<()> {
        let bet = self
            .markets
            .get_mut(&market_id)
            .and_then(|m| m.bets.get_mut(claimant))
            .ok_or_else(|| LedgerError::NoStake {
                market_id,
                account: claimant.clone(),
            })?;
        bet.claimed = claimed;
        Ok(())
    }

    // ── Administration ──────────────────────────────────────

    pub fn set_stake_bounds(
        &mut self,
        caller: &AccountId,
        min_stake: Amount,
        max_stake: Amount,
    ) -> LedgerResult<LedgerEvent> {
        self.access.require_owner(caller, "set stake bounds")?;
        if min_stake == 0 || min_stake > max_stake {
            return Err(LedgerError::InvalidStakeBounds {
                min: min_stake,
                max: max_stake,
            });
        }
        self.params.min_stake = min_stake;
        self.params.max_stake = max_stake;
        self.sequence += 1;
        Ok(LedgerEvent::StakeBoundsUpdated {
            min_stake,
            max_stake,
        })
    }

    pub fn set_min_holding(
        &mut self,
        caller: &AccountId,
        min_holding: Amount,
    ) -> LedgerResult<LedgerEvent> {
        self.access.require_owner(caller, "set minimum holding")?;
        self.params.min_holding = min_holding;
        self.sequence += 1;
        Ok(LedgerEvent::MinHoldingUpdated { min_holding })
    }

    /// Changes the rate for future resolutions only.
    pub fn set_fee_bps(&mut self, caller: &AccountId, fee_bps: u16) -> LedgerResult<LedgerEvent> {
        self.access.require_owner(caller, "set fee")?;
        self.params.fee = FeeSchedule::new(fee_bps)?;
        self.sequence += 1;
        Ok(LedgerEvent::FeeUpdated { fee_bps })
    }

    pub fn grant_resolver(
        &mut self,
        caller: &AccountId,
        account: AccountId,
    ) -> LedgerResult<LedgerEvent> {
        self.access.require_owner(caller, "grant resolver")?;
        self.access.grant(account.clone());
        self.sequence += 1;
        Ok(LedgerEvent::ResolverGranted { account })
    }

    pub fn revoke_resolver(
        &mut self,
        caller: &AccountId,
        account: AccountId,
    ) -> LedgerResult<LedgerEvent> {
        self.access.require_owner(caller, "revoke resolver")?;
        self.access.revoke(&account);
        self.sequence += 1;
        Ok(LedgerEvent::ResolverRevoked { account })
    }
}
