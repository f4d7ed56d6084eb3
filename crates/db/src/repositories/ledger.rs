//! Ledger repository: the persistent budget line store.
//!
//! All figure mutations go through [`LedgerRepository::apply_delta`],
//! which writes with an expected-version predicate and retries a bounded
//! number of times before surfacing a conflict.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, warn};

use fiscus_core::ledger::{BudgetLine, LedgerError, LineDelta, LineKey, MonthlySchedule};
use fiscus_core::query::LineFilter;
use fiscus_shared::types::BudgetLineId;

use crate::entities::budget_lines;

/// Errors raised by the ledger store.
#[derive(Debug, thiserror::Error)]
pub enum LedgerStoreError {
    /// A domain invariant or balance check failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerStoreError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Ledger(err) => err.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for opening a budget line.
#[derive(Debug, Clone)]
pub struct CreateLineInput {
    /// The line's fiscal dimensions.
    pub key: LineKey,
    /// Appropriation set at creation.
    pub original_appropriation: Decimal,
}

/// Repository for budget line reads and optimistic writes.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
    write_retries: u32,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, write_retries: u32) -> Self {
        Self { db, write_retries }
    }

    /// Opens a new budget line.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateLine` if a line already exists for the fiscal
    /// dimension tuple, or a database error.
    pub async fn create_line(
        &self,
        input: CreateLineInput,
    ) -> Result<BudgetLine, LedgerStoreError> {
        let existing = budget_lines::Entity::find()
            .filter(budget_lines::Column::FiscalYearId.eq(input.key.fiscal_year_id.into_inner()))
            .filter(budget_lines::Column::FundId.eq(input.key.fund_id.into_inner()))
            .filter(budget_lines::Column::DepartmentId.eq(input.key.department_id.into_inner()))
            .filter(
                budget_lines::Column::SubDepartmentId
                    .eq(input.key.sub_department_id.into_inner()),
            )
            .filter(
                budget_lines::Column::ChartOfAccountId
                    .eq(input.key.chart_of_account_id.into_inner()),
            )
            .filter(budget_lines::Column::ProjectId.eq(input.key.project_id.into_inner()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(LedgerError::DuplicateLine.into());
        }

        let line = BudgetLine::open(input.key, input.original_appropriation)
            .map_err(LedgerStoreError::Ledger)?;
        let model = to_active_model(&line)?;
        model.insert(&self.db).await?;
        debug!(line_id = %line.id, "budget line opened");
        Ok(line)
    }

    /// Fetches a line by id.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` or a database error.
    pub async fn get_line(&self, id: BudgetLineId) -> Result<BudgetLine, LedgerStoreError> {
        let model = budget_lines::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::LineNotFound(id))?;
        Ok(to_core(model)?)
    }

    /// Lists lines matching the filter, AND-combining set dimensions.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_lines(
        &self,
        filter: &LineFilter,
    ) -> Result<Vec<BudgetLine>, LedgerStoreError> {
        let mut query = budget_lines::Entity::find();
        if let Some(id) = filter.fiscal_year_id {
            query = query.filter(budget_lines::Column::FiscalYearId.eq(id.into_inner()));
        }
        if let Some(id) = filter.fund_id {
            query = query.filter(budget_lines::Column::FundId.eq(id.into_inner()));
        }
        if let Some(id) = filter.department_id {
            query = query.filter(budget_lines::Column::DepartmentId.eq(id.into_inner()));
        }
        if let Some(id) = filter.sub_department_id {
            query = query.filter(budget_lines::Column::SubDepartmentId.eq(id.into_inner()));
        }
        if let Some(id) = filter.chart_of_account_id {
            query = query.filter(budget_lines::Column::ChartOfAccountId.eq(id.into_inner()));
        }
        if let Some(id) = filter.project_id {
            query = query.filter(budget_lines::Column::ProjectId.eq(id.into_inner()));
        }

        let models = query.all(&self.db).await?;
        let mut lines = Vec::with_capacity(models.len());
        for model in models {
            lines.push(to_core(model)?);
        }
        Ok(lines)
    }

    /// Applies a delta to a line with bounded optimistic retries.
    ///
    /// Each attempt re-reads the line, validates the delta against its
    /// current figures, and writes with an expected-version predicate; a
    /// lost race re-reads and retries until the budget is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the domain validation error, `Conflict` after the retry
    /// budget is exhausted, or a database error.
    pub async fn apply_delta(
        &self,
        id: BudgetLineId,
        delta: &LineDelta,
    ) -> Result<BudgetLine, LedgerStoreError> {
        for attempt in 0..self.write_retries {
            let txn = self.db.begin().await?;
            match apply_delta_on(&txn, id, delta).await {
                Ok(line) => {
                    txn.commit().await?;
                    return Ok(line);
                }
                Err(LedgerStoreError::Ledger(err)) if err.is_retryable() => {
                    txn.rollback().await?;
                    warn!(line_id = %id, attempt, "version conflict, retrying");
                }
                Err(err) => {
                    txn.rollback().await?;
                    return Err(err);
                }
            }
        }
        Err(LedgerError::Conflict(id).into())
    }
}

/// Applies a delta on an open connection or transaction.
///
/// Performs exactly one optimistic attempt; retry policy belongs to the
/// caller. Used by the approval path so document and ledger writes share
/// one transaction.
///
/// # Errors
///
/// Returns `VersionConflict` when a concurrent writer got there first,
/// any domain validation error, or a database error.
pub async fn apply_delta_on<C: ConnectionTrait>(
    conn: &C,
    id: BudgetLineId,
    delta: &LineDelta,
) -> Result<BudgetLine, LedgerStoreError> {
    let model = budget_lines::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(LedgerError::LineNotFound(id))?;
    let expected_version = model.version;

    let mut line = to_core(model)?;
    line.apply(delta).map_err(LedgerStoreError::Ledger)?;

    let allocations = serde_json::to_value(line.monthly_allocations.values().as_slice())
        .map_err(|e| LedgerError::Database(e.to_string()))?;

    let result = budget_lines::Entity::update_many()
        .col_expr(budget_lines::Column::Adjustments, Expr::value(line.adjustments))
        .col_expr(
            budget_lines::Column::ReleasedAllotment,
            Expr::value(line.released_allotment),
        )
        .col_expr(budget_lines::Column::Charges, Expr::value(line.charges))
        .col_expr(
            budget_lines::Column::PreEncumbrance,
            Expr::value(line.pre_encumbrance),
        )
        .col_expr(budget_lines::Column::Encumbrance, Expr::value(line.encumbrance))
        .col_expr(
            budget_lines::Column::MonthlyAllocations,
            Expr::value(allocations),
        )
        .col_expr(budget_lines::Column::Overdrawn, Expr::value(line.overdrawn))
        .col_expr(budget_lines::Column::Version, Expr::value(line.version))
        .col_expr(
            budget_lines::Column::UpdatedAt,
            Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
        )
        .filter(budget_lines::Column::Id.eq(id.into_inner()))
        .filter(budget_lines::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(LedgerError::VersionConflict(id).into());
    }
    Ok(line)
}

// ============================================================
// Model conversion
// ============================================================

pub(crate) fn to_core(model: budget_lines::Model) -> Result<BudgetLine, LedgerError> {
    let values: Vec<Decimal> = serde_json::from_value(model.monthly_allocations)
        .map_err(|e| LedgerError::Database(e.to_string()))?;
    let monthly_allocations = MonthlySchedule::from_values(&values)?;

    Ok(BudgetLine {
        id: model.id.into(),
        key: LineKey {
            fiscal_year_id: model.fiscal_year_id.into(),
            fund_id: model.fund_id.into(),
            department_id: model.department_id.into(),
            sub_department_id: model.sub_department_id.into(),
            chart_of_account_id: model.chart_of_account_id.into(),
            project_id: model.project_id.into(),
        },
        original_appropriation: model.original_appropriation,
        adjustments: model.adjustments,
        released_allotment: model.released_allotment,
        charges: model.charges,
        pre_encumbrance: model.pre_encumbrance,
        encumbrance: model.encumbrance,
        monthly_allocations,
        overdrawn: model.overdrawn,
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn to_active_model(
    line: &BudgetLine,
) -> Result<budget_lines::ActiveModel, LedgerError> {
    let allocations = serde_json::to_value(line.monthly_allocations.values().as_slice())
        .map_err(|e| LedgerError::Database(e.to_string()))?;

    Ok(budget_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        fiscal_year_id: Set(line.key.fiscal_year_id.into_inner()),
        fund_id: Set(line.key.fund_id.into_inner()),
        department_id: Set(line.key.department_id.into_inner()),
        sub_department_id: Set(line.key.sub_department_id.into_inner()),
        chart_of_account_id: Set(line.key.chart_of_account_id.into_inner()),
        project_id: Set(line.key.project_id.into_inner()),
        original_appropriation: Set(line.original_appropriation),
        adjustments: Set(line.adjustments),
        released_allotment: Set(line.released_allotment),
        charges: Set(line.charges),
        pre_encumbrance: Set(line.pre_encumbrance),
        encumbrance: Set(line.encumbrance),
        monthly_allocations: Set(allocations),
        overdrawn: Set(line.overdrawn),
        version: Set(line.version),
        created_at: Set(line.created_at.into()),
        updated_at: Set(line.updated_at.into()),
    })
}
