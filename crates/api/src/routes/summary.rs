//! Reporting routes: aggregate summaries and statements.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::middleware::AuthUser;
use crate::routes::budget_lines::{LineFilterParams, map_ledger_error};
use fiscus_core::query::{BudgetSummary, LineFilter, StatementRow};
use fiscus_db::repositories::ledger::LedgerRepository;

/// Creates the reporting routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgetSummary", get(get_budget_summary))
        .route("/statementOfAppropriations/view", post(view_statement))
}

/// Request body selecting the statement's scope.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRequest {
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

impl From<StatementRequest> for LineFilter {
    fn from(request: StatementRequest) -> Self {
        Self {
            fiscal_year_id: request.fiscal_year.map(Into::into),
            fund_id: request.fund.map(Into::into),
            department_id: request.department.map(Into::into),
            sub_department_id: request.sub_department.map(Into::into),
            chart_of_account_id: request.chart_of_accounts.map(Into::into),
            project_id: request.project.map(Into::into),
        }
    }
}

/// GET `/budgetSummary` - Aggregate figures over the filtered lines.
async fn get_budget_summary(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<LineFilterParams>,
) -> impl IntoResponse {
    let filter: LineFilter = params.into();
    let repo = LedgerRepository::new((*state.db).clone(), state.write_retries());
    match repo.list_lines(&filter).await {
        Ok(lines) => {
            let summary = BudgetSummary::summarize(&lines, &LineFilter::new());
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(e) => map_ledger_error(&e),
    }
}

/// POST `/statementOfAppropriations/view` - Per-line statement rows.
async fn view_statement(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(request): Json<StatementRequest>,
) -> impl IntoResponse {
    let filter: LineFilter = request.into();
    let repo = LedgerRepository::new((*state.db).clone(), state.write_retries());
    match repo.list_lines(&filter).await {
        Ok(lines) => {
            let rows = StatementRow::statement(&lines, &LineFilter::new());
            (StatusCode::OK, Json(rows)).into_response()
        }
        Err(e) => map_ledger_error(&e),
    }
}
