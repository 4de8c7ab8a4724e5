//! Chain Adapters - EVM JSON-RPC via alloy-rs
//!
//! Provides on-chain reference-asset holding checks:
//! - RPC provider management with chain-id validation
//! - ERC-20 `balanceOf` eligibility oracle

pub mod holdings;
pub mod provider;

pub use holdings::Erc20Holdings;
pub use provider::EvmProvider;
