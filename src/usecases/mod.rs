//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates the domain ledger with the port interfaces.
//!
//! Use cases:
//! - `LedgerService`: serial transactional façade over the ledger
//! - `EventRecorder`: journals every committed event and takes snapshots

pub mod ledger_service;
pub mod recorder;

pub use ledger_service::{LedgerPorts, LedgerService};
pub use recorder::EventRecorder;
