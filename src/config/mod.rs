//! Configuration Module - TOML-based Ledger Configuration
//!
//! Loads and validates `config.toml`. Ledger parameters, the bot
//! registry, and every endpoint live here; nothing is hardcoded in the
//! domain layer.

pub mod loader;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::ledger::LedgerParams;
use crate::domain::payout::FeeSchedule;
use crate::domain::types::{AccountId, Amount, OptionId};
use crate::domain::units::parse_units;

pub use loader::load_config;

/// Top-level daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// Ledger parameters and authorities.
  pub ledger: LedgerConfig,
  /// Registered bots (eligibility-exempt identities).
  #[serde(default)]
  pub bots: Vec<BotConfig>,
  /// Static holding table, used when no chain is configured.
  #[serde(default)]
  pub holdings: Vec<HoldingConfig>,
  /// JSON-RPC endpoint for ERC-20 holding checks.
  pub chain: Option<ChainConfig>,
  /// HTTP API.
  #[serde(default)]
  pub api: ApiConfig,
  /// Metrics and health probes.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Snapshot and journal storage.
  #[serde(default)]
  pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  pub name: String,
  /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Use the static holding table even when `[chain]` is set.
  #[serde(default)]
  pub dry_run: bool,
}

/// Ledger parameters. Amounts are decimal strings in whole asset units
/// (`"0.01"`), converted with `asset_decimals`.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
  /// Owning authority: admin calls and fee withdrawals.
  pub owner: String,
  /// Accounts granted resolver authority at startup.
  #[serde(default)]
  pub resolvers: Vec<String>,
  #[serde(default = "default_fee_bps")]
  pub fee_bps: u16,
  #[serde(default = "default_min_stake")]
  pub min_stake: String,
  #[serde(default = "default_max_stake")]
  pub max_stake: String,
  #[serde(default = "default_min_holding")]
  pub min_holding: String,
  #[serde(default = "default_asset_decimals")]
  pub asset_decimals: u32,
}

impl LedgerConfig {
  pub fn owner(&self) -> AccountId {
    AccountId::new(self.owner.trim())
  }

  /// Convert to base-unit ledger parameters.
  pub fn params(&self) -> Result<LedgerParams> {
    Ok(LedgerParams {
      min_stake: self.amount(&self.min_stake).context("ledger.min_stake")?,
      max_stake: self.amount(&self.max_stake).context("ledger.max_stake")?,
      min_holding: self.amount(&self.min_holding).context("ledger.min_holding")?,
      fee: FeeSchedule::new(self.fee_bps)?,
    })
  }

  pub fn amount(&self, text: &str) -> Result<Amount> {
    parse_units(text, self.asset_decimals)
  }
}

/// A registered bot.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  pub account: String,
  /// Option the bot may not back in `BOT_ROI` markets.
  pub own_option: Option<OptionId>,
}

/// One row of the static holding table.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldingConfig {
  pub account: String,
  pub asset: String,
  /// Decimal string, same units as `[ledger]` amounts.
  pub balance: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  pub rpc_url: String,
  #[serde(default = "default_chain_id")]
  pub chain_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_api_addr")]
  pub bind_address: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      bind_address: default_api_addr(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for the snapshot and journal.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
  /// Snapshot interval (seconds).
  #[serde(default = "default_snapshot_interval")]
  pub snapshot_interval_seconds: u64,
  /// Restore the latest snapshot at startup.
  #[serde(default = "default_true")]
  pub restore: bool,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      snapshot_interval_seconds: default_snapshot_interval(),
      restore: true,
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_fee_bps() -> u16 {
  250
}

fn default_min_stake() -> String {
  "0.001".to_string()
}

fn default_max_stake() -> String {
  "100".to_string()
}

fn default_min_holding() -> String {
  "1".to_string()
}

fn default_asset_decimals() -> u32 {
  18
}

fn default_chain_id() -> u64 {
  1
}

fn default_api_addr() -> String {
  "0.0.0.0:8000".to_string()
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_snapshot_interval() -> u64 {
  60
}
