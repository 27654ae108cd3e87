use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cosmex_balances::DelegationView;
use cosmex_pagination::{Page, PageQuery};
use cosmex_types::{BlockSummary, ExplorerError, MissedBlockRecord};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::facade::{BalanceView, QueryFacade, UptimeView, ValidatorView};
use crate::status::ChainStatus;

type AppState = Arc<QueryFacade>;

pub fn build_router(facade: QueryFacade) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(chain_status))
        .route("/api/blocks", get(blocks))
        .route("/api/validator/:id", get(validator))
        .route("/api/validator/:id/uptime", get(validator_uptime))
        .route("/api/validator/:id/missed", get(validator_missed_blocks))
        .route("/api/account/:address/balance", get(account_balance))
        .route("/api/account/:address/delegations", get(account_delegations))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(facade))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "cosmex-explorer",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn chain_status(State(facade): State<AppState>) -> Json<ChainStatus> {
    Json(facade.chain_status().as_ref().clone())
}

async fn blocks(
    State(facade): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<BlockSummary>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(facade.blocks(query)?))
}

async fn validator(
    State(facade): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ValidatorView>, ApiError> {
    Ok(Json(facade.validator(&id)?))
}

async fn validator_uptime(
    State(facade): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UptimeView>, ApiError> {
    Ok(Json(facade.uptime(&id)?))
}

async fn validator_missed_blocks(
    State(facade): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<MissedBlockRecord>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(facade.missed_blocks(&id, query)?))
}

async fn account_balance(
    State(facade): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceView>, ApiError> {
    Ok(Json(facade.balance(&address).await?))
}

async fn account_delegations(
    State(facade): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Vec<DelegationView>>, ApiError> {
    Ok(Json(facade.delegations(&address).await?))
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ExplorerError> for ApiError {
    fn from(err: ExplorerError) -> Self {
        match &err {
            ExplorerError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            ExplorerError::InvalidInput(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            ExplorerError::UpstreamUnavailable(reason) => {
                warn!(%reason, "upstream unavailable");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable")
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}
