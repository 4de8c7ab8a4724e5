//! Integration Tests - End-to-end Ledger Behavior
//!
//! Drives `LedgerService` through its public API with mocked ports.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockall::mock;

use parimutuel_ledger::adapters::clock::ManualClock;
use parimutuel_ledger::adapters::memory::{BotRegistry, CreditBook, StaticHoldings};
use parimutuel_ledger::domain::error::LedgerError;
use parimutuel_ledger::domain::events::LedgerEvent;
use parimutuel_ledger::domain::ledger::{Ledger, LedgerParams, NewMarket, ResolveRequest};
use parimutuel_ledger::domain::types::{AccountId, Amount, AssetRef, MarketKind, OptionId};
use parimutuel_ledger::ports::clock::Clock;
use parimutuel_ledger::ports::eligibility::EligibilityOracle;
use parimutuel_ledger::ports::identity::IdentityGate;
use parimutuel_ledger::ports::transfer::{TransferReceipt, ValueTransfer};
use parimutuel_ledger::usecases::{LedgerPorts, LedgerService};

// ---- Mock Definitions ----

mock! {
    pub Identity {}

    #[async_trait::async_trait]
    impl IdentityGate for Identity {
        async fn is_exempt(&self, account: &AccountId) -> bool;
        async fn disqualified_option(&self, account: &AccountId) -> Option<OptionId>;
    }
}

mock! {
    pub Eligibility {}

    #[async_trait::async_trait]
    impl EligibilityOracle for Eligibility {
        async fn holds(
            &self,
            account: &AccountId,
            asset: &AssetRef,
            min_holding: Amount,
        ) -> anyhow::Result<bool>;
    }
}

mock! {
    pub Transfer {}

    #[async_trait::async_trait]
    impl ValueTransfer for Transfer {
        async fn send(&self, recipient: &AccountId, amount: Amount) -> anyhow::Result<TransferReceipt>;
    }
}

// ---- Fixtures ----

const UNIT: Amount = 1_000_000_000_000_000_000;

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn nobody_is_a_bot() -> MockIdentity {
    let mut identity = MockIdentity::new();
    identity.expect_is_exempt().returning(|_| false);
    identity.expect_disqualified_option().returning(|_| None);
    identity
}

fn everyone_holds() -> MockEligibility {
    let mut eligibility = MockEligibility::new();
    eligibility.expect_holds().returning(|_, _, _| Ok(true));
    eligibility
}

fn receipt(recipient: &AccountId, amount: Amount) -> anyhow::Result<TransferReceipt> {
    Ok(TransferReceipt {
        reference: format!("tx-{recipient}-{amount}"),
        recipient: recipient.clone(),
        amount,
    })
}

fn transfers_succeed() -> MockTransfer {
    let mut transfer = MockTransfer::new();
    transfer.expect_send().returning(|to, amount| receipt(to, amount));
    transfer
}

fn service(
    identity: impl IdentityGate,
    eligibility: impl EligibilityOracle,
    transfer: Arc<dyn ValueTransfer>,
) -> (LedgerService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let owner = AccountId::from("owner");
    let mut ledger = Ledger::new(owner.clone(), LedgerParams::default());
    ledger.grant_resolver(&owner, "resolver".into()).unwrap();

    let ports = LedgerPorts {
        identity: Arc::new(identity),
        eligibility: Arc::new(eligibility),
        transfer,
        clock: Arc::clone(&clock) as Arc<dyn Clock>,
    };
    (LedgerService::new(ledger, ports), clock)
}

fn market(kind: MarketKind, options: &[&str]) -> NewMarket {
    NewMarket {
        asset: AssetRef::new("0xtoken"),
        question: "Which outcome?".to_string(),
        kind,
        duration_secs: 3_600,
        options: options.iter().map(|s| (*s).to_string()).collect(),
    }
}

fn resolver() -> AccountId {
    "resolver".into()
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_pool_equals_option_totals_through_bets_and_seeding() {
    let (service, _clock) = service(
        nobody_is_a_bot(),
        everyone_holds(),
        Arc::new(transfers_succeed()),
    );

    service
        .create_market("creator".into(), market(MarketKind::Volume, &["a", "b", "c"]), 10 * UNIT + 1)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap();
    service.place_bet("bob".into(), 1, 3, 2 * UNIT).await.unwrap();
    service.place_bet("alice".into(), 1, 1, UNIT / 2).await.unwrap();
    service.seed(&resolver(), 1, 2, 7 * UNIT).await.unwrap();
    service.seed(&resolver(), 1, 0, 5).await.unwrap();

    let view = service.market(1).await.unwrap();
    let summed: Amount = view.options.iter().map(|o| o.total_staked).sum();
    assert_eq!(summed, view.pool);
    assert!(service.snapshot().await.invariant_violations().is_empty());
}

#[tokio::test]
async fn test_repeat_stake_keeps_option_and_grows_amount() {
    let (service, _clock) = service(
        nobody_is_a_bot(),
        everyone_holds(),
        Arc::new(transfers_succeed()),
    );
    service
        .create_market("creator".into(), market(MarketKind::Price, &["up", "down"]), 0)
        .await
        .unwrap();

    service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap();
    let increased = service.place_bet("alice".into(), 1, 1, 2 * UNIT).await.unwrap();
    assert!(matches!(
        increased.event,
        LedgerEvent::BetIncreased { added, position, .. } if added == 2 * UNIT && position == 3 * UNIT
    ));

    let err = service.place_bet("alice".into(), 1, 2, UNIT).await.unwrap_err();
    assert_eq!(err, LedgerError::SameOptionRequired { recorded: 1, requested: 2 });

    let bet = service.bet(1, &"alice".into()).await.unwrap().unwrap();
    assert_eq!(bet.option, 1);
    assert_eq!(bet.amount, 3 * UNIT);

    let view = service.market(1).await.unwrap();
    assert_eq!(view.bet_count, 1);
    assert_eq!(view.options[0].bettor_count, 1);
    assert_eq!(view.options[1].total_staked, 0);
    assert_eq!(view.pool, 3 * UNIT);
}

#[tokio::test]
async fn test_two_option_round_trip_pays_3_9() {
    let mut transfer = MockTransfer::new();
    transfer
        .expect_send()
        .withf(|to, amount| to.as_str() == "alice" && *amount == 39 * UNIT / 10)
        .times(1)
        .returning(|to, amount| receipt(to, amount));
    let (service, clock) = service(nobody_is_a_bot(), everyone_holds(), Arc::new(transfer));

    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, 2 * UNIT).await.unwrap();
    service.place_bet("bob".into(), 1, 2, 2 * UNIT).await.unwrap();

    clock.advance(Duration::hours(1));
    let resolved = service
        .resolve(&resolver(), 1, ResolveRequest::winner(1))
        .await
        .unwrap();
    assert!(matches!(
        resolved.event,
        LedgerEvent::MarketResolved { pool, fee, .. } if pool == 4 * UNIT && fee == UNIT / 10
    ));

    let paid = service.claim(&"alice".into(), 1).await.unwrap();
    assert!(matches!(
        paid.event,
        LedgerEvent::WinningsClaimed { amount, .. } if amount == 3_900_000_000_000_000_000
    ));

    let err = service.claim(&"bob".into(), 1).await.unwrap_err();
    assert_eq!(err, LedgerError::NotWinner { market_id: 1, option: 2 });
    assert!(!service.bet(1, &"bob".into()).await.unwrap().unwrap().claimed);
}

#[tokio::test]
async fn test_multi_winner_split_is_proportional() {
    let book = Arc::new(CreditBook::new());
    let (service, clock) = service(nobody_is_a_bot(), everyone_holds(), Arc::clone(&book) as Arc<dyn ValueTransfer>);

    service
        .create_market("creator".into(), market(MarketKind::Custom, &["win", "lose"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap();
    service.place_bet("bob".into(), 1, 1, 3 * UNIT).await.unwrap();
    service.place_bet("carol".into(), 1, 2, 4 * UNIT).await.unwrap();

    clock.advance(Duration::hours(2));
    service.resolve(&resolver(), 1, ResolveRequest::winner(1)).await.unwrap();

    service.claim(&"alice".into(), 1).await.unwrap();
    service.claim(&"bob".into(), 1).await.unwrap();
    assert_eq!(book.credited(&"alice".into()), 1_950_000_000_000_000_000);
    assert_eq!(book.credited(&"bob".into()), 5_850_000_000_000_000_000);
    assert_eq!(service.stats().await.accumulated_fees, UNIT / 5);
}

#[tokio::test]
async fn test_max_stake_winner_claims_full_share() {
    let book = Arc::new(CreditBook::new());
    let (service, clock) = service(nobody_is_a_bot(), everyone_holds(), Arc::clone(&book) as Arc<dyn ValueTransfer>);

    service
        .create_market("creator".into(), market(MarketKind::Custom, &["win", "lose"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, 100 * UNIT).await.unwrap();
    service.place_bet("bob".into(), 1, 2, 100 * UNIT).await.unwrap();
    service.place_bet("carol".into(), 1, 2, 40 * UNIT).await.unwrap();

    clock.advance(Duration::hours(2));
    service.resolve(&resolver(), 1, ResolveRequest::winner(1)).await.unwrap();

    // 240 pool less 2.5% leaves 234, all of it alice's
    service.claim(&"alice".into(), 1).await.unwrap();
    assert_eq!(book.credited(&"alice".into()), 234 * UNIT);
    assert_eq!(service.stats().await.accumulated_fees, 6 * UNIT);
    assert!(matches!(
        service.claim(&"bob".into(), 1).await,
        Err(LedgerError::NotWinner { .. })
    ));
}

#[tokio::test]
async fn test_tied_options_share_the_pool() {
    let book = Arc::new(CreditBook::new());
    let (service, clock) = service(nobody_is_a_bot(), everyone_holds(), Arc::clone(&book) as Arc<dyn ValueTransfer>);

    service
        .create_market("creator".into(), market(MarketKind::Price, &["x", "y", "z"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap();
    service.place_bet("bob".into(), 1, 2, UNIT).await.unwrap();
    service.place_bet("carol".into(), 1, 3, 2 * UNIT).await.unwrap();

    clock.advance(Duration::hours(1));
    service
        .resolve(&resolver(), 1, ResolveRequest::tie(1, vec![1, 2]))
        .await
        .unwrap();
    assert_eq!(service.tied_options(1).await.unwrap(), vec![1, 2]);

    // pool 4, fee 0.1, denominator 2: each tied unit is worth 1.95
    service.claim(&"alice".into(), 1).await.unwrap();
    service.claim(&"bob".into(), 1).await.unwrap();
    assert_eq!(book.credited(&"alice".into()), 1_950_000_000_000_000_000);
    assert_eq!(book.credited(&"bob".into()), 1_950_000_000_000_000_000);

    let err = service.claim(&"carol".into(), 1).await.unwrap_err();
    assert_eq!(err, LedgerError::NotWinner { market_id: 1, option: 3 });
}

#[tokio::test]
async fn test_claim_guards_never_reach_the_transfer() {
    let mut transfer = MockTransfer::new();
    transfer
        .expect_send()
        .times(1)
        .returning(|to, amount| receipt(to, amount));
    let (service, clock) = service(nobody_is_a_bot(), everyone_holds(), Arc::new(transfer));

    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap();
    service.place_bet("bob".into(), 1, 2, UNIT).await.unwrap();

    let before = service.stats().await.sequence;
    assert_eq!(
        service.claim(&"alice".into(), 1).await.unwrap_err(),
        LedgerError::NotResolved(1)
    );
    assert_eq!(service.stats().await.sequence, before);

    clock.advance(Duration::hours(1));
    service.resolve(&resolver(), 1, ResolveRequest::winner(1)).await.unwrap();

    assert!(matches!(
        service.claim(&"dave".into(), 1).await.unwrap_err(),
        LedgerError::NoStake { .. }
    ));

    service.claim(&"alice".into(), 1).await.unwrap();
    let after_first = service.stats().await;
    assert!(matches!(
        service.claim(&"alice".into(), 1).await.unwrap_err(),
        LedgerError::AlreadyClaimed { .. }
    ));
    assert_eq!(service.stats().await, after_first);
}

#[tokio::test]
async fn test_second_resolution_always_fails() {
    let (service, clock) = service(
        nobody_is_a_bot(),
        everyone_holds(),
        Arc::new(transfers_succeed()),
    );
    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B", "C"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap();

    clock.advance(Duration::hours(1));
    service.resolve(&resolver(), 1, ResolveRequest::winner(1)).await.unwrap();
    let fees = service.stats().await.accumulated_fees;

    for request in [
        ResolveRequest::winner(1),
        ResolveRequest::winner(2),
        ResolveRequest::tie(2, vec![2, 3]),
    ] {
        assert_eq!(
            service.resolve(&resolver(), 1, request).await.unwrap_err(),
            LedgerError::AlreadyResolved(1)
        );
    }
    assert_eq!(service.stats().await.accumulated_fees, fees);
}

#[tokio::test]
async fn test_resolution_requires_closed_window_and_authority() {
    let (service, clock) = service(
        nobody_is_a_bot(),
        everyone_holds(),
        Arc::new(transfers_succeed()),
    );
    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B"]), 0)
        .await
        .unwrap();

    assert_eq!(
        service.resolve(&resolver(), 1, ResolveRequest::winner(1)).await.unwrap_err(),
        LedgerError::BettingStillOpen(1)
    );

    clock.advance(Duration::hours(1));
    assert!(matches!(
        service.resolve(&"mallory".into(), 1, ResolveRequest::winner(1)).await.unwrap_err(),
        LedgerError::Unauthorized { .. }
    ));
    assert!(service.market(1).await.unwrap().is_open());
}

#[tokio::test]
async fn test_betting_closes_exactly_at_close_time() {
    let (service, clock) = service(
        nobody_is_a_bot(),
        everyone_holds(),
        Arc::new(transfers_succeed()),
    );
    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B"]), 0)
        .await
        .unwrap();

    clock.advance(Duration::seconds(3_599));
    service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap();

    clock.advance(Duration::seconds(1));
    assert_eq!(
        service.place_bet("bob".into(), 1, 2, UNIT).await.unwrap_err(),
        LedgerError::BettingClosed(1)
    );
}

#[tokio::test]
async fn test_cancellation_refunds_exact_stake_once() {
    let book = Arc::new(CreditBook::new());
    let (service, _clock) = service(nobody_is_a_bot(), everyone_holds(), Arc::clone(&book) as Arc<dyn ValueTransfer>);

    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, 5 * UNIT).await.unwrap();
    service.cancel(&resolver(), 1).await.unwrap();

    assert_eq!(
        service.claim(&"alice".into(), 1).await.unwrap_err(),
        LedgerError::NotResolved(1)
    );

    let refund = service.refund(&"alice".into(), 1).await.unwrap();
    assert!(matches!(
        refund.event,
        LedgerEvent::RefundClaimed { amount, .. } if amount == 5 * UNIT
    ));
    assert_eq!(book.credited(&"alice".into()), 5 * UNIT);
    assert_eq!(service.stats().await.accumulated_fees, 0);

    assert!(matches!(
        service.refund(&"alice".into(), 1).await.unwrap_err(),
        LedgerError::AlreadyClaimed { .. }
    ));
    assert_eq!(book.transfer_count(), 1);
}

#[tokio::test]
async fn test_bot_cannot_back_own_option_in_bot_roi() {
    let mut identity = MockIdentity::new();
    identity
        .expect_is_exempt()
        .returning(|account| account.as_str() == "bot-7");
    identity
        .expect_disqualified_option()
        .returning(|account| (account.as_str() == "bot-7").then_some(1));
    // Bots never reach the holding check.
    let mut eligibility = MockEligibility::new();
    eligibility.expect_holds().never();

    let (service, _clock) = service(identity, eligibility, Arc::new(transfers_succeed()));
    service
        .create_market("creator".into(), market(MarketKind::BotRoi, &["bot-7", "bot-9"]), 0)
        .await
        .unwrap();
    service
        .create_market("creator".into(), market(MarketKind::Price, &["up", "down"]), 0)
        .await
        .unwrap();

    let params = service.stats().await.params;
    for stake in [params.min_stake, UNIT, params.max_stake] {
        assert_eq!(
            service.place_bet("bot-7".into(), 1, 1, stake).await.unwrap_err(),
            LedgerError::SelfBetForbidden { account: "bot-7".into(), option: 1 }
        );
    }

    service.place_bet("bot-7".into(), 1, 2, UNIT).await.unwrap();
    service.place_bet("bot-7".into(), 2, 1, UNIT).await.unwrap();
    assert_eq!(service.market(1).await.unwrap().options[0].total_staked, 0);
}

#[tokio::test]
async fn test_holding_oracle_failure_means_ineligible() {
    let mut eligibility = MockEligibility::new();
    eligibility
        .expect_holds()
        .returning(|account, _, _| match account.as_str() {
            "alice" => Ok(true),
            "bob" => Ok(false),
            _ => Err(anyhow::anyhow!("execution reverted")),
        });
    let (service, _clock) = service(nobody_is_a_bot(), eligibility, Arc::new(transfers_succeed()));
    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B"]), 0)
        .await
        .unwrap();

    service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap();
    let sequence = service.stats().await.sequence;

    for bettor in ["bob", "carol"] {
        assert_eq!(
            service.place_bet(bettor.into(), 1, 2, UNIT).await.unwrap_err(),
            LedgerError::NotEligible { account: bettor.into() }
        );
    }
    assert_eq!(service.stats().await.sequence, sequence);
    assert_eq!(service.bettors(1).await.unwrap(), vec![AccountId::from("alice")]);
}

#[tokio::test]
async fn test_broken_asset_does_not_fault_other_markets() {
    let mut holdings = StaticHoldings::new().with_balance("alice", "0xgood", UNIT);
    holdings.break_asset(AssetRef::new("0xbroken"));
    let (service, _clock) = service(BotRegistry::new(), holdings, Arc::new(CreditBook::new()));

    let mut broken = market(MarketKind::Price, &["A", "B"]);
    broken.asset = AssetRef::new("0xbroken");
    let mut good = market(MarketKind::Price, &["A", "B"]);
    good.asset = AssetRef::new("0xgood");
    service.create_market("creator".into(), broken, 0).await.unwrap();
    service.create_market("creator".into(), good, 0).await.unwrap();

    assert!(matches!(
        service.place_bet("alice".into(), 1, 1, UNIT).await.unwrap_err(),
        LedgerError::NotEligible { .. }
    ));
    service.place_bet("alice".into(), 2, 1, UNIT).await.unwrap();
}

#[tokio::test]
async fn test_seeding_strands_the_remainder() {
    let (service, _clock) = service(
        nobody_is_a_bot(),
        everyone_holds(),
        Arc::new(transfers_succeed()),
    );

    let created = service
        .create_market("creator".into(), market(MarketKind::Price, &["a", "b", "c"]), 10)
        .await
        .unwrap();
    assert!(matches!(
        created.event,
        LedgerEvent::MarketCreated { seed_per_option: 3, pool: 9, stranded: 1, .. }
    ));

    let seeded = service.seed(&resolver(), 1, 0, 11).await.unwrap();
    assert!(matches!(
        seeded.event,
        LedgerEvent::LiquiditySeeded { amount: 9, stranded: 2, pool: 18, .. }
    ));

    let view = service.market(1).await.unwrap();
    assert_eq!(view.pool, 18);
    assert!(view.options.iter().all(|o| o.total_staked == 6));
    assert_eq!(service.stats().await.total_volume, 0);
}

#[tokio::test]
async fn test_rejected_transfer_rolls_back_fee_withdrawal() {
    let book = Arc::new(CreditBook::new());
    let (service, clock) = service(nobody_is_a_bot(), everyone_holds(), Arc::clone(&book) as Arc<dyn ValueTransfer>);

    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, 2 * UNIT).await.unwrap();
    service.place_bet("bob".into(), 1, 2, 2 * UNIT).await.unwrap();
    clock.advance(Duration::hours(1));
    service.resolve(&resolver(), 1, ResolveRequest::winner(1)).await.unwrap();

    assert!(matches!(
        service.withdraw_fees(&"alice".into()).await.unwrap_err(),
        LedgerError::Unauthorized { .. }
    ));

    book.reject("owner".into());
    assert!(matches!(
        service.withdraw_fees(&"owner".into()).await.unwrap_err(),
        LedgerError::TransferFailed { .. }
    ));
    assert_eq!(service.stats().await.accumulated_fees, UNIT / 10);
    assert_eq!(service.transfer_failures(), 1);

    book.accept(&"owner".into());
    service.withdraw_fees(&"owner".into()).await.unwrap();
    assert_eq!(book.credited(&"owner".into()), UNIT / 10);
    assert_eq!(
        service.withdraw_fees(&"owner".into()).await.unwrap_err(),
        LedgerError::NothingToWithdraw
    );
}

#[tokio::test]
async fn test_fee_change_applies_to_future_resolutions_only() {
    let book = Arc::new(CreditBook::new());
    let (service, clock) = service(nobody_is_a_bot(), everyone_holds(), Arc::clone(&book) as Arc<dyn ValueTransfer>);

    service
        .create_market("creator".into(), market(MarketKind::Price, &["A", "B"]), 0)
        .await
        .unwrap();
    service.place_bet("alice".into(), 1, 1, 2 * UNIT).await.unwrap();
    service.place_bet("bob".into(), 1, 2, 2 * UNIT).await.unwrap();
    clock.advance(Duration::hours(1));
    service.resolve(&resolver(), 1, ResolveRequest::winner(1)).await.unwrap();

    service.set_fee_bps(&"owner".into(), 1_000).await.unwrap();
    assert_eq!(
        service.potential_payout(1, &"alice".into()).await.unwrap(),
        39 * UNIT / 10
    );
    service.claim(&"alice".into(), 1).await.unwrap();
    assert_eq!(book.credited(&"alice".into()), 39 * UNIT / 10);
}
