//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Traits for every collaborator the ledger talks to but does not own.
//! Adapters implement these traits.
//!
//! Port categories:
//! - `IdentityGate`: bot registry (eligibility exemption, self-bet option)
//! - `EligibilityOracle`: reference-asset holding checks
//! - `ValueTransfer`: outbound payouts, refunds and fee withdrawals
//! - `Clock`: the single authoritative time source
//! - `LedgerRepository`: snapshot and event journal persistence

pub mod clock;
pub mod eligibility;
pub mod identity;
pub mod repository;
pub mod transfer;

pub use clock::Clock;
pub use eligibility::EligibilityOracle;
pub use identity::IdentityGate;
pub use repository::{JournalRecord, LedgerRepository, LedgerSnapshot};
pub use transfer::{TransferReceipt, ValueTransfer};
