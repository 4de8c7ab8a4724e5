//! API error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::types::ErrorBody;
use crate::domain::error::{ErrorKind, LedgerError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error(transparent)]
  Ledger(#[from] LedgerError),

  #[error("{0}")]
  BadRequest(String),

  #[error("missing or empty x-account header")]
  MissingCaller,
}

/// HTTP status for each error kind.
pub const fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
    ErrorKind::StateConflict => StatusCode::CONFLICT,
    ErrorKind::EligibilityDenied => StatusCode::FORBIDDEN,
    ErrorKind::AuthorizationDenied => StatusCode::UNAUTHORIZED,
    ErrorKind::TransferFailure => StatusCode::BAD_GATEWAY,
  }
}

impl ApiError {
  pub const fn kind(&self) -> ErrorKind {
    match self {
      Self::Ledger(e) => e.kind(),
      Self::BadRequest(_) => ErrorKind::InvalidInput,
      Self::MissingCaller => ErrorKind::AuthorizationDenied,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let body = ErrorBody {
      kind: kind.as_str().to_string(),
      error: self.to_string(),
    };
    (status_for(kind), Json(body)).into_response()
  }
}
