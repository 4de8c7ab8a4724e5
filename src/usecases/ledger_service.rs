//! Ledger Service - Serial Transactional Façade
//!
//! Binds the pure `Ledger` to its collaborators. Every mutating call takes
//! the single ledger lock and keeps it until the call is finished,
//! including across awaited port calls, so no caller ever observes a
//! half-applied bet or a claim mid-transfer.
//!
//! Bet flow:
//! 1. Ledger preconditions (exists, open, window, option, stake bounds)
//! 2. Identity gate (bot self-bet rule, keyed on market kind)
//! 3. Eligibility oracle for non-bots (errors count as "not eligible")
//! 4. Commit and publish
//!
//! Payout flow: mark, transfer, then settle or roll back.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, instrument, warn};

use crate::domain::error::{LedgerError, LedgerResult};
use crate::domain::events::{LedgerEnvelope, LedgerEvent};
use crate::domain::ledger::{Ledger, LedgerStats, NewMarket, PendingPayout, ResolveRequest};
use crate::domain::market::{Bet, Market, MarketOption};
use crate::domain::types::{AccountId, Amount, MarketId, OptionId};
use crate::ports::clock::Clock;
use crate::ports::eligibility::EligibilityOracle;
use crate::ports::identity::IdentityGate;
use crate::ports::transfer::ValueTransfer;

/// Capacity of the notification channel.
const EVENT_BUFFER: usize = 1024;

/// The collaborators a `LedgerService` needs.
#[derive(Clone)]
pub struct LedgerPorts {
  pub identity: Arc<dyn IdentityGate>,
  pub eligibility: Arc<dyn EligibilityOracle>,
  pub transfer: Arc<dyn ValueTransfer>,
  pub clock: Arc<dyn Clock>,
}

/// Thread-safe entry point for every ledger operation.
pub struct LedgerService {
  ledger: Mutex<Ledger>,
  ports: LedgerPorts,
  events: broadcast::Sender<LedgerEnvelope>,
  transfer_failures: AtomicU64,
}

impl LedgerService {
  pub fn new(ledger: Ledger, ports: LedgerPorts) -> Self {
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    Self {
      ledger: Mutex::new(ledger),
      ports,
      events,
      transfer_failures: AtomicU64::new(0),
    }
  }

  /// Receive every committed mutation, in commit order.
  pub fn subscribe(&self) -> broadcast::Receiver<LedgerEnvelope> {
    self.events.subscribe()
  }

  /// Transfers rejected since startup.
  pub fn transfer_failures(&self) -> u64 {
    self.transfer_failures.load(Ordering::Relaxed)
  }

  // ── Markets ─────────────────────────────────────────────

  /// Open a market. `seed` is liquidity attached by the creator.
  #[instrument(skip(self, request), fields(creator = %creator, kind = %request.kind))]
  pub async fn create_market(
    &self,
    creator: AccountId,
    request: NewMarket,
    seed: Amount,
  ) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let event = ledger
      .create_market(creator, request, seed, now)
      .inspect_err(|e| debug!(error = %e, "Market rejected"))?;

    info!(
      market_id = event.market_id().unwrap_or_default(),
      seed = %seed,
      "Market created"
    );
    Ok(self.publish(&ledger, now, event))
  }

  /// Stake `stake` on `option`, opening or growing the bettor's position.
  #[instrument(skip(self), fields(bettor = %bettor, stake = %stake))]
  pub async fn place_bet(
    &self,
    bettor: AccountId,
    market_id: MarketId,
    option: OptionId,
    stake: Amount,
  ) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let admission = ledger
      .check_bet(market_id, option, stake, now)
      .inspect_err(|e| debug!(error = %e, "Bet rejected"))?;

    let is_bot = self.ports.identity.is_exempt(&bettor).await;
    let disqualified = if is_bot {
      self.ports.identity.disqualified_option(&bettor).await
    } else {
      None
    };
    let needs_holding = admission
      .screen_identity(&bettor, option, is_bot, disqualified)
      .inspect_err(|e| debug!(error = %e, "Bet rejected"))?;

    if needs_holding {
      let eligible = match self
        .ports
        .eligibility
        .holds(&bettor, &admission.asset, admission.min_holding)
        .await
      {
        Ok(holds) => holds,
        Err(e) => {
          warn!(
            asset = %admission.asset,
            error = %e,
            "Eligibility query failed, treating bettor as ineligible"
          );
          false
        }
      };
      if !eligible {
        debug!(asset = %admission.asset, "Bettor below holding threshold");
        return Err(LedgerError::NotEligible { account: bettor });
      }
    }

    let event = ledger.apply_bet(bettor, market_id, option, stake, now)?;
    info!(event = event.name(), "Bet committed");
    Ok(self.publish(&ledger, now, event))
  }

  /// Declare the outcome. Resolver authority required.
  #[instrument(skip(self), fields(caller = %caller))]
  pub async fn resolve(
    &self,
    caller: &AccountId,
    market_id: MarketId,
    request: ResolveRequest,
  ) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let event = ledger
      .resolve(caller, market_id, request, now)
      .inspect_err(|e| debug!(error = %e, "Resolution rejected"))?;

    if let LedgerEvent::MarketResolved { pool, fee, is_tie, .. } = &event {
      info!(pool = %pool, fee = %fee, is_tie, "Market resolved");
    }
    Ok(self.publish(&ledger, now, event))
  }

  /// Void an open market. Resolver authority required.
  #[instrument(skip(self), fields(caller = %caller))]
  pub async fn cancel(&self, caller: &AccountId, market_id: MarketId) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let event = ledger
      .cancel(caller, market_id, now)
      .inspect_err(|e| debug!(error = %e, "Cancellation rejected"))?;

    info!("Market cancelled");
    Ok(self.publish(&ledger, now, event))
  }

  /// Inject liquidity; `option == 0` spreads it over every option.
  #[instrument(skip(self), fields(caller = %caller, value = %value))]
  pub async fn seed(
    &self,
    caller: &AccountId,
    market_id: MarketId,
    option: OptionId,
    value: Amount,
  ) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let event = ledger
      .seed(caller, market_id, option, value)
      .inspect_err(|e| debug!(error = %e, "Seed rejected"))?;

    if let LedgerEvent::LiquiditySeeded { amount, stranded, .. } = &event {
      info!(credited = %amount, stranded = %stranded, "Liquidity seeded");
    }
    Ok(self.publish(&ledger, now, event))
  }

  // ── Payouts ─────────────────────────────────────────────

  /// Pay a winner their share of the pool after fee.
  #[instrument(skip(self), fields(claimant = %claimant))]
  pub async fn claim(&self, claimant: &AccountId, market_id: MarketId) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let payout = ledger
      .begin_claim(claimant, market_id)
      .inspect_err(|e| debug!(error = %e, "Claim rejected"))?;
    self.pay_out(&mut ledger, payout, now).await
  }

  /// Return a stake from a cancelled market.
  #[instrument(skip(self), fields(claimant = %claimant))]
  pub async fn refund(&self, claimant: &AccountId, market_id: MarketId) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let payout = ledger
      .begin_refund(claimant, market_id)
      .inspect_err(|e| debug!(error = %e, "Refund rejected"))?;
    self.pay_out(&mut ledger, payout, now).await
  }

  /// Send every accumulated fee to the owner.
  #[instrument(skip(self), fields(caller = %caller))]
  pub async fn withdraw_fees(&self, caller: &AccountId) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let payout = ledger
      .begin_fee_withdrawal(caller)
      .inspect_err(|e| debug!(error = %e, "Fee withdrawal rejected"))?;
    self.pay_out(&mut ledger, payout, now).await
  }

  /// Transfer a marked payout; settle on success, roll back on failure.
  ///
  /// The ledger lock is held across `send`, so a `ValueTransfer` must not
  /// call back into this service; a re-entrant claim would wait on the
  /// lock forever. Within the ledger itself the position is already marked,
  /// and a second `begin_claim` sees `AlreadyClaimed`.
  async fn pay_out(
    &self,
    ledger: &mut Ledger,
    payout: PendingPayout,
    now: DateTime<Utc>,
  ) -> LedgerResult<LedgerEnvelope> {
    let recipient = payout.recipient().clone();
    let amount = payout.amount();

    match self.ports.transfer.send(&recipient, amount).await {
      Ok(receipt) => {
        let event = ledger.settle_payout(payout);
        info!(
          event = event.name(),
          recipient = %recipient,
          amount = %amount,
          reference = %receipt.reference,
          "Payout settled"
        );
        Ok(self.publish(ledger, now, event))
      }
      Err(e) => {
        ledger.abort_payout(payout)?;
        self.transfer_failures.fetch_add(1, Ordering::Relaxed);
        warn!(
          recipient = %recipient,
          amount = %amount,
          error = %e,
          "Transfer failed, payout rolled back"
        );
        Err(LedgerError::TransferFailed {
          recipient,
          amount,
          reason: e.to_string(),
        })
      }
    }
  }

  // ── Administration ──────────────────────────────────────

  #[instrument(skip(self), fields(caller = %caller))]
  pub async fn set_stake_bounds(
    &self,
    caller: &AccountId,
    min_stake: Amount,
    max_stake: Amount,
  ) -> LedgerResult<LedgerEnvelope> {
    self
      .administer(|ledger| ledger.set_stake_bounds(caller, min_stake, max_stake))
      .await
  }

  #[instrument(skip(self), fields(caller = %caller))]
  pub async fn set_min_holding(&self, caller: &AccountId, min_holding: Amount) -> LedgerResult<LedgerEnvelope> {
    self
      .administer(|ledger| ledger.set_min_holding(caller, min_holding))
      .await
  }

  #[instrument(skip(self), fields(caller = %caller))]
  pub async fn set_fee_bps(&self, caller: &AccountId, fee_bps: u16) -> LedgerResult<LedgerEnvelope> {
    self.administer(|ledger| ledger.set_fee_bps(caller, fee_bps)).await
  }

  #[instrument(skip(self), fields(caller = %caller, account = %account))]
  pub async fn grant_resolver(&self, caller: &AccountId, account: AccountId) -> LedgerResult<LedgerEnvelope> {
    self
      .administer(|ledger| ledger.grant_resolver(caller, account))
      .await
  }

  #[instrument(skip(self), fields(caller = %caller, account = %account))]
  pub async fn revoke_resolver(&self, caller: &AccountId, account: AccountId) -> LedgerResult<LedgerEnvelope> {
    self
      .administer(|ledger| ledger.revoke_resolver(caller, account))
      .await
  }

  async fn administer(
    &self,
    apply: impl FnOnce(&mut Ledger) -> LedgerResult<LedgerEvent>,
  ) -> LedgerResult<LedgerEnvelope> {
    let mut ledger = self.ledger.lock().await;
    let now = self.ports.clock.now();

    let event = apply(&mut ledger).inspect_err(|e| debug!(error = %e, "Admin call rejected"))?;
    info!(event = event.name(), "Ledger parameters updated");
    Ok(self.publish(&ledger, now, event))
  }

  // ── Queries ─────────────────────────────────────────────

  pub async fn market(&self, market_id: MarketId) -> LedgerResult<Market> {
    self.ledger.lock().await.market(market_id).cloned()
  }

  pub async fn option(&self, market_id: MarketId, option: OptionId) -> LedgerResult<MarketOption> {
    self.ledger.lock().await.option(market_id, option).cloned()
  }

  pub async fn bet(&self, market_id: MarketId, bettor: &AccountId) -> LedgerResult<Option<Bet>> {
    Ok(self.ledger.lock().await.bet(market_id, bettor)?.cloned())
  }

  pub async fn tied_options(&self, market_id: MarketId) -> LedgerResult<Vec<OptionId>> {
    Ok(self.ledger.lock().await.market(market_id)?.tied_options().to_vec())
  }

  /// Bettors in order of first stake.
  pub async fn bettors(&self, market_id: MarketId) -> LedgerResult<Vec<AccountId>> {
    Ok(self.ledger.lock().await.market(market_id)?.bettors.clone())
  }

  pub async fn potential_payout(&self, market_id: MarketId, bettor: &AccountId) -> LedgerResult<Amount> {
    self.ledger.lock().await.potential_payout(market_id, bettor)
  }

  pub async fn stats(&self) -> LedgerStats {
    self.ledger.lock().await.stats()
  }

  /// A consistent copy of the whole ledger.
  pub async fn snapshot(&self) -> Ledger {
    self.ledger.lock().await.clone()
  }

  fn publish(&self, ledger: &Ledger, at: DateTime<Utc>, event: LedgerEvent) -> LedgerEnvelope {
    let envelope = LedgerEnvelope {
      sequence: ledger.sequence(),
      at,
      event,
    };
    // No subscribers is fine: the journal is optional.
    let _ = self.events.send(envelope.clone());
    envelope
  }
}
