//! Credit Book - Value Transfer into an in-memory balance sheet
//!
//! Every successful `send` credits the recipient. Recipients can be
//! marked as rejecting, which makes `send` fail the way a contract
//! without a payable fallback would.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::domain::types::{AccountId, Amount};
use crate::ports::transfer::{TransferReceipt, ValueTransfer};

#[derive(Debug, Default)]
struct Book {
    credits: HashMap<AccountId, Amount>,
    rejecting: HashSet<AccountId>,
    transfers: u64,
}

#[derive(Debug, Default)]
pub struct CreditBook {
    book: Mutex<Book>,
}

impl CreditBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes transfers to `account` fail until [`Self::accept`] is called.
    pub fn reject(&self, account: AccountId) {
        self.lock().rejecting.insert(account);
    }

    pub fn accept(&self, account: &AccountId) {
        self.lock().rejecting.remove(account);
    }

    /// Total value received by `account`.
    pub fn credited(&self, account: &AccountId) -> Amount {
        self.lock().credits.get(account).copied().unwrap_or(0)
    }

    /// Number of successful transfers.
    pub fn transfer_count(&self) -> u64 {
        self.lock().transfers
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ValueTransfer for CreditBook {
    async fn send(&self, recipient: &AccountId, amount: Amount) -> anyhow::Result<TransferReceipt> {
        let mut book = self.lock();
        anyhow::ensure!(
            !book.rejecting.contains(recipient),
            "recipient {recipient} rejected the transfer"
        );
        let balance = book.credits.entry(recipient.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| anyhow::anyhow!("credit overflow for {recipient}"))?;
        book.transfers += 1;

        let reference = Uuid::new_v4().to_string();
        debug!(%recipient, amount = %amount, %reference, "Credited");
        Ok(TransferReceipt {
            reference,
            recipient: recipient.clone(),
            amount,
        })
    }
}
