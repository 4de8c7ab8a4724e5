//! Ledger API Router and Server
//!
//! Thin handlers: parse, call `LedgerService`, map errors. Every amount
//! conversion uses the configured asset decimals.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tokio::sync::broadcast;
use tracing::{info, instrument};

use super::error::ApiError;
use super::types::{
  CreateMarketRequest, FeeRequest, MinHoldingRequest, PayoutResponse, PlaceBetRequest, SeedRequest,
  StakeBoundsRequest,
};
use crate::domain::events::LedgerEnvelope;
use crate::domain::ledger::{LedgerStats, NewMarket, ResolveRequest};
use crate::domain::market::{Bet, Market, MarketOption};
use crate::domain::types::{AccountId, Amount, AssetRef, MarketId, OptionId};
use crate::domain::units::{format_units, parse_units};
use crate::usecases::ledger_service::LedgerService;

/// Header carrying the caller's account.
pub const CALLER_HEADER: &str = "x-account";

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
  pub service: Arc<LedgerService>,
  pub asset_decimals: u32,
}

impl ApiState {
  pub fn new(service: Arc<LedgerService>, asset_decimals: u32) -> Self {
    Self {
      service,
      asset_decimals,
    }
  }

  fn amount(&self, text: &str) -> Result<Amount, ApiError> {
    parse_units(text, self.asset_decimals).map_err(|e| ApiError::BadRequest(format!("{e:#}")))
  }
}

/// Account taken from the `x-account` header.
pub struct Caller(pub AccountId);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .headers
      .get(CALLER_HEADER)
      .and_then(|value| value.to_str().ok())
      .map(str::trim)
      .filter(|value| !value.is_empty())
      .map(|value| Self(AccountId::new(value)))
      .ok_or(ApiError::MissingCaller)
  }
}

/// Build the ledger router.
pub fn router(state: ApiState) -> Router {
  Router::new()
    .route("/markets", post(create_market))
    .route("/markets/:market_id", get(market))
    .route("/markets/:market_id/options/:option", get(option))
    .route("/markets/:market_id/bettors", get(bettors))
    .route("/markets/:market_id/tied", get(tied_options))
    .route("/markets/:market_id/bets", post(place_bet))
    .route("/markets/:market_id/bets/:account", get(bet))
    .route("/markets/:market_id/payout/:account", get(potential_payout))
    .route("/markets/:market_id/resolve", post(resolve))
    .route("/markets/:market_id/cancel", post(cancel))
    .route("/markets/:market_id/seed", post(seed))
    .route("/markets/:market_id/claim", post(claim))
    .route("/markets/:market_id/refund", post(refund))
    .route("/admin/fees/withdraw", post(withdraw_fees))
    .route("/admin/stake-bounds", put(set_stake_bounds))
    .route("/admin/min-holding", put(set_min_holding))
    .route("/admin/fee", put(set_fee))
    .route(
      "/admin/resolvers/:account",
      post(grant_resolver).delete(revoke_resolver),
    )
    .route("/stats", get(stats))
    .with_state(state)
}

/// HTTP server for the ledger API.
pub struct ApiServer {
  state: ApiState,
  bind_address: String,
}

impl ApiServer {
  pub fn new(state: ApiState, bind_address: String) -> Self {
    Self {
      state,
      bind_address,
    }
  }

  #[instrument(skip(self, shutdown_rx), fields(address = %self.bind_address))]
  pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
    info!(address = %self.bind_address, "Ledger API started");

    axum::serve(listener, router(self.state))
      .with_graceful_shutdown(async move {
        let _ = shutdown_rx.recv().await;
      })
      .await?;

    Ok(())
  }
}

// ── Markets ─────────────────────────────────────────────

async fn create_market(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Json(body): Json<CreateMarketRequest>,
) -> Result<(StatusCode, Json<LedgerEnvelope>), ApiError> {
  let seed = match body.seed.as_deref() {
    Some(text) => state.amount(text)?,
    None => 0,
  };
  let request = NewMarket {
    asset: AssetRef::new(body.asset),
    question: body.question,
    kind: body.kind,
    duration_secs: body.duration_secs,
    options: body.options,
  };
  let envelope = state.service.create_market(caller, request, seed).await?;
  Ok((StatusCode::CREATED, Json(envelope)))
}

async fn market(State(state): State<ApiState>, Path(market_id): Path<MarketId>) -> ApiResult<Market> {
  Ok(Json(state.service.market(market_id).await?))
}

async fn option(
  State(state): State<ApiState>,
  Path((market_id, option)): Path<(MarketId, OptionId)>,
) -> ApiResult<MarketOption> {
  Ok(Json(state.service.option(market_id, option).await?))
}

async fn bettors(
  State(state): State<ApiState>,
  Path(market_id): Path<MarketId>,
) -> ApiResult<Vec<AccountId>> {
  Ok(Json(state.service.bettors(market_id).await?))
}

async fn tied_options(
  State(state): State<ApiState>,
  Path(market_id): Path<MarketId>,
) -> ApiResult<Vec<OptionId>> {
  Ok(Json(state.service.tied_options(market_id).await?))
}

async fn bet(
  State(state): State<ApiState>,
  Path((market_id, account)): Path<(MarketId, String)>,
) -> ApiResult<Option<Bet>> {
  Ok(Json(state.service.bet(market_id, &AccountId::new(account)).await?))
}

async fn potential_payout(
  State(state): State<ApiState>,
  Path((market_id, account)): Path<(MarketId, String)>,
) -> ApiResult<PayoutResponse> {
  let account = AccountId::new(account);
  let amount = state.service.potential_payout(market_id, &account).await?;
  Ok(Json(PayoutResponse {
    market_id,
    account,
    amount,
    formatted: format_units(amount, state.asset_decimals),
  }))
}

async fn place_bet(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Path(market_id): Path<MarketId>,
  Json(body): Json<PlaceBetRequest>,
) -> ApiResult<LedgerEnvelope> {
  let stake = state.amount(&body.amount)?;
  Ok(Json(
    state
      .service
      .place_bet(caller, market_id, body.option, stake)
      .await?,
  ))
}

async fn resolve(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Path(market_id): Path<MarketId>,
  Json(body): Json<ResolveRequest>,
) -> ApiResult<LedgerEnvelope> {
  Ok(Json(state.service.resolve(&caller, market_id, body).await?))
}

async fn cancel(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Path(market_id): Path<MarketId>,
) -> ApiResult<LedgerEnvelope> {
  Ok(Json(state.service.cancel(&caller, market_id).await?))
}

async fn seed(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Path(market_id): Path<MarketId>,
  Json(body): Json<SeedRequest>,
) -> ApiResult<LedgerEnvelope> {
  let value = state.amount(&body.amount)?;
  Ok(Json(
    state
      .service
      .seed(&caller, market_id, body.option, value)
      .await?,
  ))
}

async fn claim(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Path(market_id): Path<MarketId>,
) -> ApiResult<LedgerEnvelope> {
  Ok(Json(state.service.claim(&caller, market_id).await?))
}

async fn refund(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Path(market_id): Path<MarketId>,
) -> ApiResult<LedgerEnvelope> {
  Ok(Json(state.service.refund(&caller, market_id).await?))
}

// ── Administration ──────────────────────────────────────

async fn withdraw_fees(State(state): State<ApiState>, Caller(caller): Caller) -> ApiResult<LedgerEnvelope> {
  Ok(Json(state.service.withdraw_fees(&caller).await?))
}

async fn set_stake_bounds(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Json(body): Json<StakeBoundsRequest>,
) -> ApiResult<LedgerEnvelope> {
  let min_stake = state.amount(&body.min_stake)?;
  let max_stake = state.amount(&body.max_stake)?;
  Ok(Json(
    state
      .service
      .set_stake_bounds(&caller, min_stake, max_stake)
      .await?,
  ))
}

async fn set_min_holding(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Json(body): Json<MinHoldingRequest>,
) -> ApiResult<LedgerEnvelope> {
  let min_holding = state.amount(&body.min_holding)?;
  Ok(Json(state.service.set_min_holding(&caller, min_holding).await?))
}

async fn set_fee(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Json(body): Json<FeeRequest>,
) -> ApiResult<LedgerEnvelope> {
  Ok(Json(state.service.set_fee_bps(&caller, body.fee_bps).await?))
}

async fn grant_resolver(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Path(account): Path<String>,
) -> ApiResult<LedgerEnvelope> {
  Ok(Json(
    state
      .service
      .grant_resolver(&caller, AccountId::new(account))
      .await?,
  ))
}

async fn revoke_resolver(
  State(state): State<ApiState>,
  Caller(caller): Caller,
  Path(account): Path<String>,
) -> ApiResult<LedgerEnvelope> {
  Ok(Json(
    state
      .service
      .revoke_resolver(&caller, AccountId::new(account))
      .await?,
  ))
}

async fn stats(State(state): State<ApiState>) -> Json<LedgerStats> {
  Json(state.service.stats().await)
}
