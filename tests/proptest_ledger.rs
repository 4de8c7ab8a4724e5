//! Property-Based Tests - Ledger Invariants
//!
//! Uses `proptest` to verify that the pool accounting and payout
//! arithmetic hold across random bet sequences.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

use parimutuel_ledger::adapters::clock::ManualClock;
use parimutuel_ledger::adapters::memory::{BotRegistry, CreditBook, StaticHoldings};
use parimutuel_ledger::domain::ledger::{Ledger, LedgerParams, NewMarket, ResolveRequest};
use parimutuel_ledger::domain::payout::{FeeSchedule, split_evenly};
use parimutuel_ledger::domain::types::{AccountId, Amount, AssetRef, MarketKind, OptionId};
use parimutuel_ledger::ports::transfer::ValueTransfer;
use parimutuel_ledger::usecases::{LedgerPorts, LedgerService};

const UNIT: Amount = 1_000_000_000_000_000_000;
const BETTORS: u8 = 6;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn bettor(index: u8) -> AccountId {
    AccountId::new(format!("bettor-{index}"))
}

fn new_market(options: usize) -> NewMarket {
    NewMarket {
        asset: AssetRef::new("0xtoken"),
        question: "Generated market".to_string(),
        kind: MarketKind::Custom,
        duration_secs: 3_600,
        options: (1..=options).map(|i| format!("option-{i}")).collect(),
    }
}

/// A ledger with one market and every generated stake applied. Rejected
/// stakes (out-of-range option, switched option) are skipped.
fn ledger_with_bets(options: usize, seed: Amount, bets: &[(u8, OptionId, Amount)]) -> Ledger {
    let mut ledger = Ledger::new("owner".into(), LedgerParams::default());
    ledger
        .create_market("creator".into(), new_market(options), seed, t0())
        .unwrap();
    for (who, option, stake) in bets {
        let _ = ledger.apply_bet(bettor(*who), 1, *option, *stake, t0());
    }
    ledger
}

fn bet_strategy() -> impl Strategy<Value = Vec<(u8, OptionId, Amount)>> {
    prop::collection::vec(
        (0..BETTORS, 1u8..=10, UNIT / 1_000..=10 * UNIT),
        1..40,
    )
}

// ── Pool accounting ─────────────────────────────────────────

proptest! {
    /// Option totals always add up to the pool, and every option's
    /// bettor count matches the positions recorded on it.
    #[test]
    fn pool_matches_option_totals(
        options in 2usize..=10,
        seed in 0u128..=100 * UNIT,
        bets in bet_strategy(),
    ) {
        let ledger = ledger_with_bets(options, seed, &bets);
        let market = ledger.market(1).unwrap();
        let summed: Amount = market.options.iter().map(|o| o.total_staked).sum();
        prop_assert_eq!(summed, market.pool);
        prop_assert!(
            ledger.invariant_violations().is_empty(),
            "violations: {:?}",
            ledger.invariant_violations()
        );
    }

    /// A bettor's option never changes; the position is the sum of every
    /// stake accepted on that option.
    #[test]
    fn positions_are_sticky_and_cumulative(bets in bet_strategy()) {
        let ledger = ledger_with_bets(10, 0, &bets);
        for who in 0..BETTORS {
            let mine: Vec<_> = bets.iter().filter(|(b, _, _)| *b == who).collect();
            let Some((_, first, _)) = mine.first() else {
                continue;
            };
            let expected: Amount = mine
                .iter()
                .filter(|(_, option, _)| option == first)
                .map(|(_, _, stake)| stake)
                .sum();
            let bet = ledger.bet(1, &bettor(who)).unwrap().unwrap();
            prop_assert_eq!(bet.option, *first);
            prop_assert_eq!(bet.amount, expected);
        }
    }
}

// ── Payout arithmetic ───────────────────────────────────────

proptest! {
    /// Winners never receive more than the post-fee pool, and truncation
    /// dust stays below one base unit per claimant.
    #[test]
    fn payouts_never_exceed_pool_after_fee(
        bets in prop::collection::vec((0..BETTORS, 1u8..=3, UNIT / 1_000..=10 * UNIT), 1..40),
        winner in 1u8..=3,
        fee_bps in 0u16..=1_000,
    ) {
        let mut ledger = ledger_with_bets(3, 0, &bets);
        ledger.set_fee_bps(&"owner".into(), fee_bps).unwrap();
        ledger
            .resolve(&"owner".into(), 1, ResolveRequest::winner(winner), t0() + Duration::hours(1))
            .unwrap();

        let market = ledger.market(1).unwrap();
        let pool_after_fee = market.pool - market.resolution().unwrap().fee;
        let winners_stake = market.winning_stake();

        let mut paid: Amount = 0;
        let mut claimants: Amount = 0;
        for who in 0..BETTORS {
            let backed_winner = ledger
                .bet(1, &bettor(who))
                .unwrap()
                .is_some_and(|bet| bet.option == winner);
            let claim = ledger.begin_claim(&bettor(who), 1);
            prop_assert_eq!(claim.is_ok(), backed_winner, "bettor {}: {:?}", who, claim);
            if let Ok(payout) = claim {
                paid += payout.amount();
                claimants += 1;
                let _ = ledger.settle_payout(payout);
            }
        }

        prop_assert!(paid <= pool_after_fee, "paid {} > {}", paid, pool_after_fee);
        if winners_stake > 0 {
            prop_assert!(pool_after_fee - paid < claimants);
        } else {
            prop_assert_eq!(claimants, 0);
        }
    }

    /// Even splits credit `per_option * n` and strand the remainder.
    #[test]
    fn even_split_strands_only_the_remainder(value in 0u128..=u128::from(u64::MAX), n in 2usize..=10) {
        let split = split_evenly(value, n);
        prop_assert_eq!(split.distributed, split.per_option * n as Amount);
        prop_assert_eq!(split.distributed + split.stranded, value);
        prop_assert!(split.stranded < n as Amount);
    }

    /// The fee never exceeds the cap share of the pool.
    #[test]
    fn fee_is_bounded_by_rate(pool in 0u128..=1_000_000 * UNIT, bps in 0u16..=1_000) {
        let fee = FeeSchedule::new(bps).unwrap().fee_on(pool).unwrap();
        prop_assert!(fee <= pool / 10);
        prop_assert_eq!(fee, pool * Amount::from(bps) / 10_000);
    }
}

// ── Service-level refunds ───────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Cancelling and refunding every bettor returns exactly what was
    /// staked, with no fee taken.
    #[test]
    fn refunds_return_every_stake(bets in prop::collection::vec((0..BETTORS, 1u8..=2, UNIT / 1_000..=10 * UNIT), 1..20)) {
        let mut holdings = StaticHoldings::new();
        for who in 0..BETTORS {
            holdings.set_balance(bettor(who), AssetRef::new("0xtoken"), UNIT);
        }
        let book = Arc::new(CreditBook::new());
        let ports = LedgerPorts {
            identity: Arc::new(BotRegistry::new()),
            eligibility: Arc::new(holdings),
            transfer: Arc::clone(&book) as Arc<dyn ValueTransfer>,
            clock: Arc::new(ManualClock::new(t0())),
        };
        let service = LedgerService::new(
            Ledger::new("owner".into(), LedgerParams::default()),
            ports,
        );

        let (pool, refunded) = tokio_test::block_on(async {
            service.create_market("creator".into(), new_market(2), 0).await.unwrap();
            for (who, option, stake) in &bets {
                let _ = service.place_bet(bettor(*who), 1, *option, *stake).await;
            }
            service.cancel(&"owner".into(), 1).await.unwrap();

            let mut refunded: Amount = 0;
            for who in service.bettors(1).await.unwrap() {
                service.refund(&who, 1).await.unwrap();
                refunded += book.credited(&who);
            }
            (service.market(1).await.unwrap().pool, refunded)
        });

        prop_assert_eq!(refunded, pool);
        prop_assert_eq!(tokio_test::block_on(service.stats()).accumulated_fees, 0);
    }
}
