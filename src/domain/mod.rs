//! Domain layer - the pari-mutuel ledger.
//!
//! Pure, synchronous state and arithmetic. No I/O, no clock reads, no
//! async: time and admission decisions arrive as arguments, and the
//! usecases layer wires the external collaborators around it.

pub mod access;
pub mod error;
pub mod events;
pub mod ledger;
pub mod market;
pub mod payout;
pub mod types;
pub mod units;

pub use access::AccessControl;
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use events::{LedgerEnvelope, LedgerEvent};
pub use ledger::{
    BetAdmission, Ledger, LedgerParams, LedgerStats, NewMarket, PendingPayout, ResolveRequest,
};
pub use market::{Bet, Market, MarketOption, MarketStatus, Outcome, Resolution};
pub use payout::FeeSchedule;
pub use types::{AccountId, Amount, AssetRef, MarketId, MarketKind, OptionId};
