//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;
use crate::domain::types::{MAX_FEE_BPS, MAX_OPTIONS};
use crate::domain::units::MAX_DECIMALS;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    service = %config.service.name,
    owner = %config.ledger.owner,
    resolvers = config.ledger.resolvers.len(),
    bots = config.bots.len(),
    fee_bps = config.ledger.fee_bps,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.trim().is_empty(),
    "service.name must not be empty"
  );

  // Ledger validation
  let ledger = &config.ledger;
  anyhow::ensure!(!ledger.owner.trim().is_empty(), "ledger.owner must not be empty");
  anyhow::ensure!(
    ledger.fee_bps <= MAX_FEE_BPS,
    "ledger.fee_bps must be <= {MAX_FEE_BPS}, got {}",
    ledger.fee_bps
  );
  anyhow::ensure!(
    ledger.asset_decimals <= MAX_DECIMALS,
    "ledger.asset_decimals must be <= {MAX_DECIMALS}, got {}",
    ledger.asset_decimals
  );

  let params = ledger.params()?;
  anyhow::ensure!(params.min_stake > 0, "ledger.min_stake must be positive");
  anyhow::ensure!(
    params.min_stake <= params.max_stake,
    "ledger.min_stake ({}) must not exceed ledger.max_stake ({})",
    ledger.min_stake,
    ledger.max_stake
  );

  for (i, resolver) in ledger.resolvers.iter().enumerate() {
    anyhow::ensure!(!resolver.trim().is_empty(), "ledger.resolvers[{i}] is empty");
  }

  // Bot registry validation
  for (i, bot) in config.bots.iter().enumerate() {
    anyhow::ensure!(!bot.account.trim().is_empty(), "bots[{i}] has empty account");
    if let Some(option) = bot.own_option {
      anyhow::ensure!(
        (1..=MAX_OPTIONS).contains(&usize::from(option)),
        "bots[{i}] ({}) own_option must be in [1, {MAX_OPTIONS}], got {option}",
        bot.account
      );
    }
  }

  for (i, holding) in config.holdings.iter().enumerate() {
    anyhow::ensure!(
      !holding.account.trim().is_empty() && !holding.asset.trim().is_empty(),
      "holdings[{i}] needs both account and asset"
    );
    ledger
      .amount(&holding.balance)
      .with_context(|| format!("holdings[{i}].balance"))?;
  }

  if let Some(chain) = &config.chain {
    anyhow::ensure!(!chain.rpc_url.is_empty(), "chain.rpc_url must not be empty");
  }

  anyhow::ensure!(
    !config.api.bind_address.is_empty(),
    "api.bind_address must not be empty"
  );
  anyhow::ensure!(
    config.persistence.snapshot_interval_seconds > 0,
    "persistence.snapshot_interval_seconds must be positive"
  );

  Ok(())
}
