//! Prometheus Metrics Registry - Ledger Observability
//!
//! Counters follow the notification stream; gauges are refreshed from
//! ledger stats after each event. Served on `/metrics`.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, instrument, warn};

use crate::domain::events::{LedgerEnvelope, LedgerEvent};
use crate::domain::ledger::LedgerStats;
use crate::domain::types::Amount;
use crate::usecases::ledger_service::LedgerService;

/// All metrics are named `parimutuel_ledger_*`.
pub struct LedgerMetrics {
    registry: Registry,
    /// Divisor turning base units into whole asset units for gauges.
    unit: f64,
    pub markets_created: IntCounterVec,
    /// Labelled `new` or `increase`.
    pub bets: IntCounterVec,
    pub markets_resolved: IntCounterVec,
    pub markets_cancelled: IntCounter,
    pub claims: IntCounter,
    pub refunds: IntCounter,
    pub fee_withdrawals: IntCounter,
    pub transfer_failures: IntCounter,
    pub accumulated_fees: Gauge,
    pub total_volume: Gauge,
    pub total_paid_out: Gauge,
    pub markets: IntGauge,
    pub sequence: IntGauge,
}

impl LedgerMetrics {
    /// Create and register all metrics. `asset_decimals` scales gauges.
    pub fn new(asset_decimals: u32) -> anyhow::Result<Self> {
        let registry = Registry::new();

        let markets_created = IntCounterVec::new(
            Opts::new("parimutuel_ledger_markets_created_total", "Markets created"),
            &["kind"],
        )?;
        let bets = IntCounterVec::new(
            Opts::new("parimutuel_ledger_bets_total", "Accepted stakes"),
            &["position"],
        )?;
        let markets_resolved = IntCounterVec::new(
            Opts::new("parimutuel_ledger_markets_resolved_total", "Markets resolved"),
            &["outcome"],
        )?;
        let markets_cancelled = IntCounter::new(
            "parimutuel_ledger_markets_cancelled_total",
            "Markets cancelled",
        )?;
        let claims = IntCounter::new("parimutuel_ledger_claims_total", "Winnings paid out")?;
        let refunds = IntCounter::new("parimutuel_ledger_refunds_total", "Refunds paid out")?;
        let fee_withdrawals = IntCounter::new(
            "parimutuel_ledger_fee_withdrawals_total",
            "Fee withdrawals",
        )?;
        let transfer_failures = IntCounter::new(
            "parimutuel_ledger_transfer_failures_total",
            "Payout transfers rejected and rolled back",
        )?;
        let accumulated_fees = Gauge::new(
            "parimutuel_ledger_accumulated_fees",
            "Fees awaiting withdrawal, in asset units",
        )?;
        let total_volume = Gauge::new(
            "parimutuel_ledger_total_volume",
            "Lifetime staked volume, in asset units",
        )?;
        let total_paid_out = Gauge::new(
            "parimutuel_ledger_total_paid_out",
            "Lifetime payouts, refunds and fee withdrawals, in asset units",
        )?;
        let markets = IntGauge::new("parimutuel_ledger_markets", "Markets on the ledger")?;
        let sequence = IntGauge::new("parimutuel_ledger_sequence", "Ledger sequence")?;

        registry.register(Box::new(markets_created.clone()))?;
        registry.register(Box::new(bets.clone()))?;
        registry.register(Box::new(markets_resolved.clone()))?;
        registry.register(Box::new(markets_cancelled.clone()))?;
        registry.register(Box::new(claims.clone()))?;
        registry.register(Box::new(refunds.clone()))?;
        registry.register(Box::new(fee_withdrawals.clone()))?;
        registry.register(Box::new(transfer_failures.clone()))?;
        registry.register(Box::new(accumulated_fees.clone()))?;
        registry.register(Box::new(total_volume.clone()))?;
        registry.register(Box::new(total_paid_out.clone()))?;
        registry.register(Box::new(markets.clone()))?;
        registry.register(Box::new(sequence.clone()))?;

        Ok(Self {
            registry,
            unit: 10f64.powi(i32::try_from(asset_decimals).unwrap_or(0)),
            markets_created,
            bets,
            markets_resolved,
            markets_cancelled,
            claims,
            refunds,
            fee_withdrawals,
            transfer_failures,
            accumulated_fees,
            total_volume,
            total_paid_out,
            markets,
            sequence,
        })
    }

    /// Count one committed event.
    pub fn observe(&self, envelope: &LedgerEnvelope) {
        match &envelope.event {
            LedgerEvent::MarketCreated { kind, .. } => {
                self.markets_created.with_label_values(&[kind.as_str()]).inc();
            }
            LedgerEvent::BetPlaced { .. } => self.bets.with_label_values(&["new"]).inc(),
            LedgerEvent::BetIncreased { .. } => self.bets.with_label_values(&["increase"]).inc(),
            LedgerEvent::MarketResolved { is_tie, .. } => {
                let outcome = if *is_tie { "tie" } else { "winner" };
                self.markets_resolved.with_label_values(&[outcome]).inc();
            }
            LedgerEvent::MarketCancelled { .. } => self.markets_cancelled.inc(),
            LedgerEvent::WinningsClaimed { .. } => self.claims.inc(),
            LedgerEvent::RefundClaimed { .. } => self.refunds.inc(),
            LedgerEvent::FeesWithdrawn { .. } => self.fee_withdrawals.inc(),
            _ => {}
        }
        self.sequence
            .set(i64::try_from(envelope.sequence).unwrap_or(i64::MAX));
    }

    /// Bring gauges in line with the ledger.
    pub fn refresh(&self, stats: &LedgerStats, transfer_failures: u64) {
        self.accumulated_fees.set(self.units(stats.accumulated_fees));
        self.total_volume.set(self.units(stats.total_volume));
        self.total_paid_out.set(self.units(stats.total_paid_out));
        self.markets.set(i64::try_from(stats.markets).unwrap_or(i64::MAX));
        self.sequence.set(i64::try_from(stats.sequence).unwrap_or(i64::MAX));
        let seen = self.transfer_failures.get();
        if transfer_failures > seen {
            self.transfer_failures.inc_by(transfer_failures - seen);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn units(&self, amount: Amount) -> f64 {
        amount as f64 / self.unit
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Follow the ledger's notification stream until shutdown.
    #[instrument(skip_all)]
    pub async fn track(
        self: Arc<Self>,
        service: Arc<LedgerService>,
        mut events: broadcast::Receiver<LedgerEnvelope>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(15));
        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(envelope) => self.observe(&envelope),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Metrics lagged behind ledger"),
                    Err(RecvError::Closed) => break,
                },
                _ = ticker.tick() => {}
                _ = shutdown_rx.recv() => break,
            }
            self.refresh(&service.stats().await, service.transfer_failures());
        }
    }

    /// Serve `/metrics` on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics);
                async move {
                    metrics
                        .render()
                        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
