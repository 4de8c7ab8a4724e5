//! Ledger HTTP API Adapter
//!
//! JSON over axum 0.7. Caller identity arrives in the `x-account` header;
//! authenticating that header is the job of the gateway in front.
//!
//! Sub-modules:
//! - `error`: error taxonomy to HTTP status mapping
//! - `routes`: router, handlers and server
//! - `types`: request/response payloads

pub mod error;
pub mod routes;
pub mod types;

pub use error::ApiError;
pub use routes::{ApiServer, ApiState, CALLER_HEADER};
