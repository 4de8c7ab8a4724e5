//! Clock Port - Authoritative Time Source

use chrono::{DateTime, Utc};

/// Read once per ledger call; every time gate in that call uses the value.
pub trait Clock: Send + Sync + 'static {
  fn now(&self) -> DateTime<Utc>;
}
