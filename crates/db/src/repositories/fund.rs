//! Fund repository: hierarchy reads and derived rollups.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};

use fiscus_core::fund::{Fund, FundRollup};
use fiscus_core::query::LineFilter;
use fiscus_shared::types::{BudgetLineId, FundId};

use crate::entities::funds;
use crate::repositories::ledger::{LedgerRepository, LedgerStoreError};

/// Errors raised by the fund store.
#[derive(Debug, thiserror::Error)]
pub enum FundError {
    /// Fund not found.
    #[error("Fund {0} not found")]
    NotFound(FundId),

    /// The fund has no default budget line for fund transfers.
    #[error("Fund {0} has no default budget line")]
    NoDefaultLine(FundId),

    /// The ledger store failed while computing a rollup.
    #[error(transparent)]
    Ledger(#[from] LedgerStoreError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl FundError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::NoDefaultLine(_) => 422,
            Self::Ledger(err) => err.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "FUND_NOT_FOUND",
            Self::NoDefaultLine(_) => "NO_DEFAULT_LINE",
            Self::Ledger(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for registering a fund.
#[derive(Debug, Clone)]
pub struct CreateFundInput {
    /// Owning fund, None for a top-level fund.
    pub parent_fund_id: Option<FundId>,
    /// Short accounting code, unique.
    pub code: String,
    /// Display name.
    pub name: String,
    /// The budget line fund transfers debit or credit for this fund.
    pub default_line_id: Option<BudgetLineId>,
}

/// Repository for funds and their derived figures.
#[derive(Debug, Clone)]
pub struct FundRepository {
    db: DatabaseConnection,
}

impl FundRepository {
    /// Creates a new fund repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a fund.
    ///
    /// # Errors
    ///
    /// Returns a database error (including a unique violation on the
    /// fund code).
    pub async fn create(&self, input: CreateFundInput) -> Result<Fund, FundError> {
        let now = Utc::now();
        let fund = Fund {
            id: FundId::new(),
            parent_fund_id: input.parent_fund_id,
            code: input.code,
            name: input.name,
            default_line_id: input.default_line_id,
        };

        funds::ActiveModel {
            id: Set(fund.id.into_inner()),
            parent_fund_id: Set(fund.parent_fund_id.map(FundId::into_inner)),
            code: Set(fund.code.clone()),
            name: Set(fund.name.clone()),
            default_line_id: Set(fund.default_line_id.map(BudgetLineId::into_inner)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        Ok(fund)
    }

    /// Fetches a fund by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn get(&self, id: FundId) -> Result<Fund, FundError> {
        let model = funds::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(FundError::NotFound(id))?;
        Ok(to_core(model))
    }

    /// Lists every fund.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(&self) -> Result<Vec<Fund>, FundError> {
        let models = funds::Entity::find().all(&self.db).await?;
        Ok(models.into_iter().map(to_core).collect())
    }

    /// The default budget line a fund transfer uses for this fund.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `NoDefaultLine`.
    pub async fn default_line(&self, id: FundId) -> Result<BudgetLineId, FundError> {
        let fund = self.get(id).await?;
        fund.default_line_id.ok_or(FundError::NoDefaultLine(id))
    }

    /// Computes the derived rollup for a fund and its sub-funds.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn rollup(
        &self,
        id: FundId,
        ledger: &LedgerRepository,
    ) -> Result<FundRollup, FundError> {
        // Existence check first so an unknown fund is a 404, not an
        // empty rollup.
        self.get(id).await?;
        let funds = self.list().await?;
        let lines = ledger.list_lines(&LineFilter::new()).await?;
        Ok(FundRollup::compute(id, &funds, &lines))
    }
}

fn to_core(model: funds::Model) -> Fund {
    Fund {
        id: model.id.into(),
        parent_fund_id: model.parent_fund_id.map(Into::into),
        code: model.code,
        name: model.name,
        default_line_id: model.default_line_id.map(Into::into),
    }
}
