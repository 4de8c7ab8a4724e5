//! Pari-mutuel Ledger - Entry Point
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Open the file repository, restore the latest snapshot
//! 4. Build ports (bot registry, eligibility oracle, credit book, clock)
//! 5. Create LedgerService and subscribe recorder + metrics
//! 6. Spawn recorder, metrics, health and API servers
//! 7. Wait for SIGINT → graceful shutdown (stop API → drain journal → snapshot)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use parimutuel_ledger::adapters::api::{ApiServer, ApiState};
use parimutuel_ledger::adapters::chain::{Erc20Holdings, EvmProvider};
use parimutuel_ledger::adapters::clock::SystemClock;
use parimutuel_ledger::adapters::memory::{BotRegistry, CreditBook, StaticHoldings};
use parimutuel_ledger::adapters::metrics::{HealthServer, HealthState, LedgerMetrics};
use parimutuel_ledger::adapters::persistence::FileRepository;
use parimutuel_ledger::config::{self, AppConfig};
use parimutuel_ledger::domain::ledger::Ledger;
use parimutuel_ledger::domain::types::{AccountId, AssetRef};
use parimutuel_ledger::ports::eligibility::EligibilityOracle;
use parimutuel_ledger::ports::repository::LedgerRepository;
use parimutuel_ledger::usecases::{EventRecorder, LedgerPorts, LedgerService};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = config::load_config(&config_path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.service.dry_run,
        "Starting pari-mutuel ledger"
    );

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 3. Repository + ledger state ────────────────────────
    let repo: Arc<dyn LedgerRepository> = Arc::new(
        FileRepository::from_data_dir(&config.persistence.data_dir)
            .await
            .context("Failed to open data directory")?,
    );
    let ledger = restore_or_create(&config, repo.as_ref()).await?;

    // ── 4. Ports ────────────────────────────────────────────
    let ports = LedgerPorts {
        identity: Arc::new(bot_registry(&config)),
        eligibility: eligibility_oracle(&config).await?,
        transfer: Arc::new(CreditBook::new()),
        clock: Arc::new(SystemClock),
    };

    // ── 5. Service; subscribe before anything can mutate ───
    let service = Arc::new(LedgerService::new(ledger, ports));
    let recorder_events = service.subscribe();

    let recorder = EventRecorder::new(
        Arc::clone(&service),
        Arc::clone(&repo),
        Duration::from_secs(config.persistence.snapshot_interval_seconds),
    );
    let recorder_shutdown = shutdown_tx.subscribe();
    let recorder_handle = tokio::spawn(async move {
        if let Err(e) = recorder.run(recorder_events, recorder_shutdown).await {
            error!(error = %e, "Event recorder failed");
        }
    });

    // ── 6. Metrics, health, API ─────────────────────────────
    if config.metrics.enabled {
        let metrics = Arc::new(
            LedgerMetrics::new(config.ledger.asset_decimals)
                .context("Failed to register metrics")?,
        );
        tokio::spawn(Arc::clone(&metrics).track(
            Arc::clone(&service),
            service.subscribe(),
            shutdown_tx.subscribe(),
        ));

        let bind_address = config.metrics.bind_address.clone();
        let metrics_shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = metrics.serve(bind_address, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        });
    }

    let health = HealthServer::new(
        Arc::new(HealthState::new(Arc::clone(&service), Some(Arc::clone(&repo)))),
        config.metrics.health_port,
    );
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    let api = ApiServer::new(
        ApiState::new(Arc::clone(&service), config.ledger.asset_decimals),
        config.api.bind_address.clone(),
    );
    let api_shutdown = shutdown_tx.subscribe();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api.run(api_shutdown).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All tasks spawned, ledger is running");

    // ── 7. Wait for SIGINT ──────────────────────────────────
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for SIGINT");
    }
    info!("SIGINT received, initiating graceful shutdown");

    let _ = shutdown_tx.send(());

    // API first so no new mutations land after the final snapshot.
    let _ = tokio::time::timeout(Duration::from_secs(10), api_handle).await;
    if tokio::time::timeout(Duration::from_secs(30), recorder_handle)
        .await
        .is_err()
    {
        warn!("Recorder did not finish in time; last snapshot may be stale");
    }
    health_handle.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Restore the latest snapshot, or build a fresh ledger from config.
async fn restore_or_create(config: &AppConfig, repo: &dyn LedgerRepository) -> Result<Ledger> {
    if config.persistence.restore {
        if let Some(snapshot) = repo.load_snapshot().await? {
            let problems = snapshot.ledger.invariant_violations();
            anyhow::ensure!(
                problems.is_empty(),
                "Snapshot at sequence {} is inconsistent: {}",
                snapshot.sequence,
                problems.join("; ")
            );

            let tail = repo.load_journal_since(snapshot.sequence).await?;
            if !tail.is_empty() {
                warn!(
                    events = tail.len(),
                    snapshot_sequence = snapshot.sequence,
                    "Journal has events past the snapshot; they are not replayed"
                );
            }
            info!(sequence = snapshot.sequence, "Ledger restored from snapshot");
            return Ok(snapshot.ledger);
        }
    }

    let owner = config.ledger.owner();
    let mut ledger = Ledger::new(owner.clone(), config.ledger.params()?);
    for resolver in &config.ledger.resolvers {
        ledger.grant_resolver(&owner, AccountId::new(resolver.trim()))?;
    }
    info!(owner = %owner, resolvers = config.ledger.resolvers.len(), "Fresh ledger created");
    Ok(ledger)
}

fn bot_registry(config: &AppConfig) -> BotRegistry {
    let mut registry = BotRegistry::new();
    for bot in &config.bots {
        registry.register(AccountId::new(bot.account.trim()), bot.own_option);
    }
    info!(bots = registry.len(), "Bot registry loaded");
    registry
}

/// ERC-20 `balanceOf` when a chain is configured and this is not a dry
/// run; otherwise the static holding table.
async fn eligibility_oracle(config: &AppConfig) -> Result<Arc<dyn EligibilityOracle>> {
    match &config.chain {
        Some(chain) if !config.service.dry_run => {
            let provider = Arc::new(EvmProvider::connect(chain).await?);
            info!(chain_id = provider.chain_id(), "Using ERC-20 balanceOf eligibility");
            Ok(Arc::new(Erc20Holdings::new(provider)))
        }
        _ => {
            let mut holdings = StaticHoldings::new();
            for row in &config.holdings {
                holdings.set_balance(
                    AccountId::new(row.account.trim()),
                    AssetRef::new(row.asset.trim()),
                    config.ledger.amount(&row.balance)?,
                );
            }
            info!(rows = config.holdings.len(), "Using static holding table");
            Ok(Arc::new(holdings))
        }
    }
}
