//! In-Memory Adapters
//!
//! Table-backed implementations of the identity, eligibility and
//! transfer ports. Loaded from config for dry runs and used directly by
//! tests.

pub mod bots;
pub mod credit_book;
pub mod holdings;

pub use bots::BotRegistry;
pub use credit_book::CreditBook;
pub use holdings::StaticHoldings;
