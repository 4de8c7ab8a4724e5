//! Core ledger identity and value types.
//!
//! Identities are opaque strings (wallet addresses, user handles) so the
//! domain never depends on a particular chain's address format. Values are
//! integer base units; every split and payout truncates.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Scalar aliases
// ────────────────────────────────────────────

/// Value in the smallest indivisible unit of the staked asset.
pub type Amount = u128;

/// Market identifier. Allocated from 1; 0 is never a valid market.
pub type MarketId = u64;

/// One-based option index within a market. 0 is the "all options" sentinel
/// for seeding and the "unset" value elsewhere.
pub type OptionId = u8;

/// Sentinel option used by seeding to spread value across every option.
pub const ALL_OPTIONS: OptionId = 0;

/// Basis-point denominator (100 bps = 1%).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Fee rate ceiling: 10%.
pub const MAX_FEE_BPS: u16 = 1_000;

/// Minimum and maximum option count per market.
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

/// Betting window bounds, in seconds.
pub const MIN_DURATION_SECS: i64 = 60 * 60;
pub const MAX_DURATION_SECS: i64 = 30 * 24 * 60 * 60;

// ────────────────────────────────────────────
// Newtypes
// ────────────────────────────────────────────

/// Identity of a bettor, resolver, creator or owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque handle to the external fungible asset a market is gated on.
///
/// Irrelevant to ledger math; only the eligibility oracle interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An absent handle is an empty or whitespace-only string.
    pub fn is_absent(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ────────────────────────────────────────────
// Enums
// ────────────────────────────────────────────

/// What a market's question is about.
///
/// Only one ledger rule depends on the kind: bots may not stake on their
/// own option in `BotRoi` markets. Keep that rule in
/// [`MarketKind::restricts_self_bet`] so it stays in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketKind {
    Price,
    BotRoi,
    Volume,
    Custom,
}

impl MarketKind {
    /// Whether a registered bot is barred from staking on its own option.
    pub const fn restricts_self_bet(self) -> bool {
        matches!(self, Self::BotRoi)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "PRICE",
            Self::BotRoi => "BOT_ROI",
            Self::Volume => "VOLUME",
            Self::Custom => "CUSTOM",
        }
    }
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_bot_roi_restricts_self_bet() {
        assert!(MarketKind::BotRoi.restricts_self_bet());
        assert!(!MarketKind::Price.restricts_self_bet());
        assert!(!MarketKind::Volume.restricts_self_bet());
        assert!(!MarketKind::Custom.restricts_self_bet());
    }

    #[test]
    fn test_asset_ref_absent() {
        assert!(AssetRef::new("").is_absent());
        assert!(AssetRef::new("   ").is_absent());
        assert!(!AssetRef::new("0xabc").is_absent());
    }

    #[test]
    fn test_market_kind_serde_names() {
        let json = serde_json::to_string(&MarketKind::BotRoi).unwrap();
        assert_eq!(json, "\"BOT_ROI\"");
        let kind: MarketKind = serde_json::from_str("\"PRICE\"").unwrap();
        assert_eq!(kind, MarketKind::Price);
    }

    #[test]
    fn test_account_display() {
        assert_eq!(format!("{}", AccountId::from("alice")), "alice");
    }
}
