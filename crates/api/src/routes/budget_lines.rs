//! Budget line routes: listing, opening, and monthly trends.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::middleware::AuthUser;
use fiscus_core::ledger::{BudgetLine, LineKey};
use fiscus_core::query::{LineFilter, summary::monthly_trend};
use fiscus_db::repositories::ledger::{CreateLineInput, LedgerRepository, LedgerStoreError};

/// Creates the budget line routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgetLines", get(list_budget_lines))
        .route("/budgetLines", post(create_budget_line))
        .route("/budgetLines/{id}", get(get_budget_line))
        .route("/budgetLines/{id}/monthlyTrend", get(get_monthly_trend))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters filtering budget lines by fiscal dimensions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineFilterParams {
    /// Fiscal year dimension.
    pub fiscal_year: Option<Uuid>,
    /// Fund dimension.
    pub fund: Option<Uuid>,
    /// Department dimension.
    pub department: Option<Uuid>,
    /// Sub-department dimension.
    pub sub_department: Option<Uuid>,
    /// Chart of accounts dimension.
    pub chart_of_accounts: Option<Uuid>,
    /// Project dimension.
    pub project: Option<Uuid>,
}

impl From<LineFilterParams> for LineFilter {
    fn from(params: LineFilterParams) -> Self {
        Self {
            fiscal_year_id: params.fiscal_year.map(Into::into),
            fund_id: params.fund.map(Into::into),
            department_id: params.department.map(Into::into),
            sub_department_id: params.sub_department.map(Into::into),
            chart_of_account_id: params.chart_of_accounts.map(Into::into),
            project_id: params.project.map(Into::into),
        }
    }
}

/// Request body for opening a budget line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetLineRequest {
    /// Fiscal year dimension.
    pub fiscal_year: Uuid,
    /// Fund dimension.
    pub fund: Uuid,
    /// Department dimension.
    pub department: Uuid,
    /// Sub-department dimension.
    pub sub_department: Uuid,
    /// Chart of accounts dimension.
    pub chart_of_accounts: Uuid,
    /// Project dimension.
    pub project: Uuid,
    /// Appropriation set at creation.
    pub original_appropriation: Decimal,
}

/// Response for a budget line, figures rendered as strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLineResponse {
    /// Line ID.
    pub id: Uuid,
    /// Fiscal year dimension.
    pub fiscal_year: Uuid,
    /// Fund dimension.
    pub fund: Uuid,
    /// Department dimension.
    pub department: Uuid,
    /// Sub-department dimension.
    pub sub_department: Uuid,
    /// Chart of accounts dimension.
    pub chart_of_accounts: Uuid,
    /// Project dimension.
    pub project: Uuid,
    /// Appropriation set at creation.
    pub original_appropriation: String,
    /// Cumulative approved adjustments.
    pub adjustments: String,
    /// Original appropriation plus adjustments.
    pub adjusted_appropriation: String,
    /// Released allotment.
    pub released_allotment: String,
    /// Cumulative charges.
    pub charges: String,
    /// Appropriation not yet released.
    pub appropriation_balance: String,
    /// Allotment not yet consumed.
    pub allotment_balance: String,
    /// Charges over released allotment, percent.
    pub utilization_pct: String,
    /// Whether an override pushed the line past its balance.
    pub overdrawn: bool,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl BudgetLineResponse {
    pub(crate) fn from_line(line: &BudgetLine) -> Self {
        Self {
            id: line.id.into_inner(),
            fiscal_year: line.key.fiscal_year_id.into_inner(),
            fund: line.key.fund_id.into_inner(),
            department: line.key.department_id.into_inner(),
            sub_department: line.key.sub_department_id.into_inner(),
            chart_of_accounts: line.key.chart_of_account_id.into_inner(),
            project: line.key.project_id.into_inner(),
            original_appropriation: line.original_appropriation.to_string(),
            adjustments: line.adjustments.to_string(),
            adjusted_appropriation: line.adjusted_appropriation().to_string(),
            released_allotment: line.released_allotment.to_string(),
            charges: line.charges.to_string(),
            appropriation_balance: line.appropriation_balance().to_string(),
            allotment_balance: line.allotment_balance().to_string(),
            utilization_pct: line.utilization_pct().to_string(),
            overdrawn: line.overdrawn,
            version: line.version,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/budgetLines` - List budget lines filtered by dimensions.
async fn list_budget_lines(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<LineFilterParams>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone(), state.write_retries());
    match repo.list_lines(&params.into()).await {
        Ok(lines) => {
            let response: Vec<BudgetLineResponse> =
                lines.iter().map(BudgetLineResponse::from_line).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => map_ledger_error(&e),
    }
}

/// POST `/budgetLines` - Open a budget line for a fiscal year.
async fn create_budget_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateBudgetLineRequest>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone(), state.write_retries());
    let input = CreateLineInput {
        key: LineKey {
            fiscal_year_id: request.fiscal_year.into(),
            fund_id: request.fund.into(),
            department_id: request.department.into(),
            sub_department_id: request.sub_department.into(),
            chart_of_account_id: request.chart_of_accounts.into(),
            project_id: request.project.into(),
        },
        original_appropriation: request.original_appropriation,
    };

    match repo.create_line(input).await {
        Ok(line) => {
            info!(line_id = %line.id, user_id = %auth.user_id(), "budget line opened");
            (StatusCode::CREATED, Json(BudgetLineResponse::from_line(&line))).into_response()
        }
        Err(e) => map_ledger_error(&e),
    }
}

/// GET `/budgetLines/{id}` - Fetch a single budget line.
async fn get_budget_line(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone(), state.write_retries());
    match repo.get_line(id.into()).await {
        Ok(line) => (StatusCode::OK, Json(BudgetLineResponse::from_line(&line))).into_response(),
        Err(e) => map_ledger_error(&e),
    }
}

/// GET `/budgetLines/{id}/monthlyTrend` - The line's twelve monthly allocations.
async fn get_monthly_trend(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone(), state.write_retries());
    match repo.get_line(id.into()).await {
        Ok(line) => {
            let months: Vec<String> =
                monthly_trend(&line).iter().map(Decimal::to_string).collect();
            (StatusCode::OK, Json(json!({ "months": months }))).into_response()
        }
        Err(e) => map_ledger_error(&e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

pub(crate) fn map_ledger_error(e: &LedgerStoreError) -> axum::response::Response {
    if matches!(e, LedgerStoreError::Database(_)) {
        error!(error = %e, "ledger store failure");
    }
    let status = StatusCode::from_u16(e.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string()
        })),
    )
        .into_response()
}
