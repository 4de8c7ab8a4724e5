//! Persistence Adapters - JSON File Storage
//!
//! Implements the `LedgerRepository` port with an atomic JSON snapshot
//! and an append-only JSONL event journal. No database dependency.

pub mod journal;
pub mod repository_impl;
pub mod state;

pub use journal::EventJournal;
pub use repository_impl::FileRepository;
pub use state::SnapshotStore;
