//! Fund routes: registration, listing, and rollups.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::middleware::AuthUser;
use fiscus_core::fund::{Fund, FundRollup};
use fiscus_db::repositories::fund::{CreateFundInput, FundError, FundRepository};
use fiscus_db::repositories::ledger::LedgerRepository;

/// Creates the fund routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/funds", get(list_funds))
        .route("/funds", post(create_fund))
        .route("/funds/{id}/rollup", get(get_fund_rollup))
}

/// Request body for registering a fund.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFundRequest {
    /// Owning fund, absent for a top-level fund.
    pub parent_fund_id: Option<Uuid>,
    /// Short accounting code, unique.
    pub code: String,
    /// Display name.
    pub name: String,
    /// The budget line fund transfers debit or credit for this fund.
    pub default_line_id: Option<Uuid>,
}

/// Response for a fund.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundResponse {
    /// Fund ID.
    pub id: Uuid,
    /// Owning fund, absent for a top-level fund.
    pub parent_fund_id: Option<Uuid>,
    /// Short accounting code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// The budget line fund transfers debit or credit for this fund.
    pub default_line_id: Option<Uuid>,
}

impl FundResponse {
    fn from_fund(fund: &Fund) -> Self {
        Self {
            id: fund.id.into_inner(),
            parent_fund_id: fund.parent_fund_id.map(fiscus_shared::types::FundId::into_inner),
            code: fund.code.clone(),
            name: fund.name.clone(),
            default_line_id: fund
                .default_line_id
                .map(fiscus_shared::types::BudgetLineId::into_inner),
        }
    }
}

/// Response for a fund rollup, figures rendered as strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRollupResponse {
    /// The fund the rollup describes.
    pub fund_id: Uuid,
    /// Adjusted appropriation across the fund and its sub-funds.
    pub allocated: String,
    /// Charges across the fund and its sub-funds.
    pub utilized: String,
    /// Appropriation balance across the fund and its sub-funds.
    pub balance: String,
    /// Utilized over allocated, percent.
    pub utilization_pct: String,
    /// Number of lines in scope.
    pub line_count: usize,
}

impl FundRollupResponse {
    fn from_rollup(rollup: &FundRollup) -> Self {
        Self {
            fund_id: rollup.fund_id.into_inner(),
            allocated: rollup.allocated.to_string(),
            utilized: rollup.utilized.to_string(),
            balance: rollup.balance.to_string(),
            utilization_pct: rollup.utilization_pct.to_string(),
            line_count: rollup.line_count,
        }
    }
}

/// GET `/funds` - List every fund.
async fn list_funds(State(state): State<AppState>, _auth: AuthUser) -> impl IntoResponse {
    let repo = FundRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(funds) => {
            let response: Vec<FundResponse> = funds.iter().map(FundResponse::from_fund).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => map_fund_error(&e),
    }
}

/// POST `/funds` - Register a fund.
async fn create_fund(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateFundRequest>,
) -> impl IntoResponse {
    let repo = FundRepository::new((*state.db).clone());
    let input = CreateFundInput {
        parent_fund_id: request.parent_fund_id.map(Into::into),
        code: request.code,
        name: request.name,
        default_line_id: request.default_line_id.map(Into::into),
    };
    match repo.create(input).await {
        Ok(fund) => {
            info!(fund_id = %fund.id, user_id = %auth.user_id(), "fund registered");
            (StatusCode::CREATED, Json(FundResponse::from_fund(&fund))).into_response()
        }
        Err(e) => map_fund_error(&e),
    }
}

/// GET `/funds/{id}/rollup` - Derived figures for a fund and its sub-funds.
async fn get_fund_rollup(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = FundRepository::new((*state.db).clone());
    let ledger = LedgerRepository::new((*state.db).clone(), state.write_retries());
    match repo.rollup(id.into(), &ledger).await {
        Ok(rollup) => {
            (StatusCode::OK, Json(FundRollupResponse::from_rollup(&rollup))).into_response()
        }
        Err(e) => map_fund_error(&e),
    }
}

pub(crate) fn map_fund_error(e: &FundError) -> axum::response::Response {
    if matches!(e, FundError::Database(_)) {
        error!(error = %e, "fund store failure");
    }
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string()
        })),
    )
        .into_response()
}
