//! Ledger error taxonomy.
//!
//! Every rejected operation leaves the ledger untouched. Each variant maps
//! to one coarse [`ErrorKind`] so callers (HTTP API, metrics) can react
//! without matching on every case.

use thiserror::Error;

use super::types::{AccountId, Amount, MarketId, OptionId};

/// Ledger result type.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown market or option.
    NotFound,
    /// Malformed parameters or out-of-range values.
    InvalidInput,
    /// Operation not allowed in the market's current state.
    StateConflict,
    /// Holding requirement not met, or bot self-bet.
    EligibilityDenied,
    /// Caller lacks resolver or owner authority.
    AuthorizationDenied,
    /// External value transfer rejected.
    TransferFailure,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::StateConflict => "state_conflict",
            Self::EligibilityDenied => "eligibility_denied",
            Self::AuthorizationDenied => "authorization_denied",
            Self::TransferFailure => "transfer_failure",
        }
    }
}

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("market {0} not found")]
    MarketNotFound(MarketId),

    #[error("invalid market: {0}")]
    InvalidMarket(String),

    #[error("option {option} is out of range for market {market_id}")]
    InvalidOption { market_id: MarketId, option: OptionId },

    #[error("stake {stake} below minimum {min}")]
    StakeTooSmall { stake: Amount, min: Amount },

    #[error("stake {stake} above maximum {max}")]
    StakeTooLarge { stake: Amount, max: Amount },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid stake bounds: min {min}, max {max}")]
    InvalidStakeBounds { min: Amount, max: Amount },

    #[error("fee {bps} bps exceeds cap of {max} bps")]
    FeeTooHigh { bps: u16, max: u16 },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("market {0} is already resolved")]
    AlreadyResolved(MarketId),

    #[error("market {0} is cancelled")]
    MarketCancelled(MarketId),

    #[error("betting on market {0} is closed")]
    BettingClosed(MarketId),

    #[error("betting on market {0} is still open")]
    BettingStillOpen(MarketId),

    #[error("market {0} is not resolved")]
    NotResolved(MarketId),

    #[error("market {0} is not cancelled")]
    NotCancelled(MarketId),

    #[error("{account} has no stake in market {market_id}")]
    NoStake { market_id: MarketId, account: AccountId },

    #[error("{account} already claimed from market {market_id}")]
    AlreadyClaimed { market_id: MarketId, account: AccountId },

    #[error("option {option} did not win market {market_id}")]
    NotWinner { market_id: MarketId, option: OptionId },

    #[error("position is on option {recorded}; cannot stake on option {requested}")]
    SameOptionRequired { recorded: OptionId, requested: OptionId },

    #[error("no fees to withdraw")]
    NothingToWithdraw,

    #[error("bot {account} cannot stake on its own option {option}")]
    SelfBetForbidden { account: AccountId, option: OptionId },

    #[error("{account} does not meet the holding requirement")]
    NotEligible { account: AccountId },

    #[error("{account} is not authorized to {action}")]
    Unauthorized { account: AccountId, action: &'static str },

    #[error("transfer of {amount} to {recipient} failed: {reason}")]
    TransferFailed {
        recipient: AccountId,
        amount: Amount,
        reason: String,
    },
}

impl LedgerError {
    /// Taxonomy bucket of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MarketNotFound(_) => ErrorKind::NotFound,
            Self::InvalidMarket(_)
            | Self::InvalidOption { .. }
            | Self::StakeTooSmall { .. }
            | Self::StakeTooLarge { .. }
            | Self::InvalidAmount(_)
            | Self::InvalidStakeBounds { .. }
            | Self::FeeTooHigh { .. }
            | Self::Overflow => ErrorKind::InvalidInput,
            Self::AlreadyResolved(_)
            | Self::MarketCancelled(_)
            | Self::BettingClosed(_)
            | Self::BettingStillOpen(_)
            | Self::NotResolved(_)
            | Self::NotCancelled(_)
            | Self::NoStake { .. }
            | Self::AlreadyClaimed { .. }
            | Self::NotWinner { .. }
            | Self::SameOptionRequired { .. }
            | Self::NothingToWithdraw => ErrorKind::StateConflict,
            Self::SelfBetForbidden { .. } | Self::NotEligible { .. } => {
                ErrorKind::EligibilityDenied
            }
            Self::Unauthorized { .. } => ErrorKind::AuthorizationDenied,
            Self::TransferFailed { .. } => ErrorKind::TransferFailure,
        }
    }
}
