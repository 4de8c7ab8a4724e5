//! ERC-20 Holdings - Eligibility Oracle over `balanceOf`
//!
//! The market's reference asset is an ERC-20 contract address and the
//! bettor identity is a wallet address. Anything that is not (bad hex,
//! no contract, short return data) surfaces as an error, which the
//! ledger service treats as "not eligible".

use std::sync::Arc;

use alloy::primitives::{keccak256, Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::provider::EvmProvider;
use crate::domain::types::{AccountId, Amount, AssetRef};
use crate::ports::eligibility::EligibilityOracle;

pub struct Erc20Holdings {
    provider: Arc<EvmProvider>,
}

impl Erc20Holdings {
    pub fn new(provider: Arc<EvmProvider>) -> Self {
        Self { provider }
    }

    /// Raw `balanceOf(holder)` on `token`.
    pub async fn balance_of(&self, token: Address, holder: Address) -> Result<U256> {
        let tx = TransactionRequest::default()
            .to(token)
            .input(Bytes::from(balance_of_calldata(holder)).into());

        let result = self
            .provider
            .inner()
            .call(&tx)
            .await
            .context("balanceOf call failed")?;

        anyhow::ensure!(
            result.len() >= 32,
            "balanceOf returned {} bytes, expected 32",
            result.len()
        );
        Ok(U256::from_be_slice(&result[..32]))
    }
}

/// `balanceOf(address)` selector followed by the left-padded holder.
fn balance_of_calldata(holder: Address) -> Vec<u8> {
    let mut calldata = Vec::with_capacity(36);
    calldata.extend_from_slice(&keccak256(b"balanceOf(address)")[..4]);
    let mut padded = [0u8; 32];
    padded[12..].copy_from_slice(holder.as_slice());
    calldata.extend_from_slice(&padded);
    calldata
}

#[async_trait]
impl EligibilityOracle for Erc20Holdings {
    #[instrument(skip(self), fields(account = %account, asset = %asset))]
    async fn holds(&self, account: &AccountId, asset: &AssetRef, min_holding: Amount) -> Result<bool> {
        let token: Address = asset
            .as_str()
            .parse()
            .with_context(|| format!("reference asset {asset} is not an address"))?;
        let holder: Address = account
            .as_str()
            .parse()
            .with_context(|| format!("account {account} is not an address"))?;

        let balance = self.balance_of(token, holder).await?;
        debug!(%balance, min_holding = %min_holding, "Holding checked");
        Ok(balance >= U256::from(min_holding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_of_calldata_layout() {
        let holder: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        let calldata = balance_of_calldata(holder);
        assert_eq!(calldata.len(), 36);
        assert_eq!(&calldata[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert!(calldata[4..35].iter().all(|b| *b == 0));
        assert_eq!(calldata[35], 0xff);
    }
}
