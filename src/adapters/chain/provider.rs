//! EVM RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Connects to the configured JSON-RPC endpoint and validates the chain id
//! at startup. Stored as a type-erased `dyn Provider`: alloy 0.9's
//! `ProviderBuilder::new().on_http()` returns a deeply nested filler type.

use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::ChainConfig;

/// Shared RPC provider for every chain adapter.
pub struct EvmProvider {
    provider: Arc<dyn Provider + Send + Sync>,
    chain_id: u64,
}

impl EvmProvider {
    /// Connect and check that the node serves `config.chain_id`.
    #[instrument(skip_all)]
    pub async fn connect(config: &ChainConfig) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .on_http(config.rpc_url.parse().context("Invalid RPC URL")?)
            .boxed();
        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        anyhow::ensure!(
            chain_id == config.chain_id,
            "Expected chain_id={}, node reports {chain_id}",
            config.chain_id
        );

        info!(chain_id, "Connected to RPC");

        Ok(Self { provider, chain_id })
    }

    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }
}
