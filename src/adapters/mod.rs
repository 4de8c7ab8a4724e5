//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure, and exposes the ledger over HTTP.
//!
//! Adapter categories:
//! - `api`: JSON HTTP API over axum
//! - `chain`: ERC-20 holding checks via alloy-rs
//! - `clock`: system and manual clocks
//! - `memory`: table-backed bot registry, holdings and credit book
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSON snapshots and JSONL event journal

pub mod api;
pub mod chain;
pub mod clock;
pub mod memory;
pub mod metrics;
pub mod persistence;
