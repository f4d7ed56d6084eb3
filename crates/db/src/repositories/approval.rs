//! Approval repository: couples workflow transitions to ledger writes.
//!
//! Approving a document validates the transition, runs the transfer
//! engine against the lines as they stand inside the transaction, writes
//! every delta under its expected version, and flips the document to
//! Approved with `applied` set, all in one transaction. A lost version
//! race rolls the whole transaction back and retries from the top.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::{info, warn};

use fiscus_core::document::Document;
use fiscus_core::engine::TransferEngine;
use fiscus_core::ledger::{BudgetLine, LedgerError};
use fiscus_core::workflow::{WorkflowError, WorkflowService};
use fiscus_shared::types::{BudgetLineId, DocumentId, UserId};

use crate::entities::{budget_lines, documents, sea_orm_active_enums};
use crate::repositories::document::{self, DocumentStoreError};
use crate::repositories::ledger::{self, LedgerStoreError};

/// Errors raised during approval and rejection.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The workflow refused the transition.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The ledger refused the mutation; the document stays pending.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Document not found.
    #[error("Document {0} not found")]
    NotFound(DocumentId),

    /// Concurrent writers exhausted the retry budget.
    #[error("Concurrent update on document {0}, please retry")]
    Conflict(DocumentId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Workflow(err) => err.status_code(),
            Self::Ledger(err) => err.status_code(),
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Workflow(err) => err.error_code(),
            Self::Ledger(err) => err.error_code(),
            Self::NotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<DocumentStoreError> for ApprovalError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::Workflow(e) => Self::Workflow(e),
            DocumentStoreError::NotFound(id) => Self::NotFound(id),
            DocumentStoreError::Conflict(id) => Self::Conflict(id),
            DocumentStoreError::Database(e) => Self::Database(e),
            DocumentStoreError::Document(e) => Self::Database(DbErr::Custom(e.to_string())),
            // Approval never allocates invoice numbers.
            e @ DocumentStoreError::SequenceConflict { .. } => {
                Self::Database(DbErr::Custom(e.to_string()))
            }
        }
    }
}

impl From<LedgerStoreError> for ApprovalError {
    fn from(err: LedgerStoreError) -> Self {
        match err {
            LedgerStoreError::Ledger(e) => Self::Ledger(e),
            LedgerStoreError::Database(e) => Self::Database(e),
        }
    }
}

/// The outcome of an approval: the updated document and every line it
/// touched.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    /// The approved document.
    pub document: Document,
    /// The budget lines after the mutation.
    pub lines: Vec<BudgetLine>,
}

/// Repository serializing approver actions against the ledger.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
    write_retries: u32,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, write_retries: u32) -> Self {
        Self { db, write_retries }
    }

    /// Approves a pending document and applies its ledger effect.
    ///
    /// All-or-nothing: if any delta fails validation or loses its
    /// version race beyond the retry budget, the document remains
    /// pending and no line changes. A repeated approval fails the
    /// transition check, so the ledger effect cannot run twice.
    ///
    /// # Errors
    ///
    /// * `Workflow` errors for invalid transitions and self-approval
    /// * `Ledger` errors when the engine refuses the mutation
    /// * `Conflict` when retries are exhausted
    pub async fn approve(
        &self,
        id: DocumentId,
        approved_by: UserId,
        approval_notes: Option<String>,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        for attempt in 0..self.write_retries {
            let txn = self.db.begin().await?;
            match Self::approve_once(&txn, id, approved_by, approval_notes.clone()).await {
                Ok(outcome) => {
                    txn.commit().await?;
                    info!(
                        document_id = %id,
                        approver = %approved_by,
                        "document approved and applied"
                    );
                    return Ok(outcome);
                }
                Err(ApprovalError::Ledger(err)) if err.is_retryable() => {
                    txn.rollback().await?;
                    warn!(document_id = %id, attempt, "version conflict, retrying approval");
                }
                Err(ApprovalError::Conflict(_)) if attempt + 1 < self.write_retries => {
                    txn.rollback().await?;
                    warn!(document_id = %id, attempt, "document version conflict, retrying");
                }
                Err(err) => {
                    txn.rollback().await?;
                    return Err(err);
                }
            }
        }
        Err(ApprovalError::Conflict(id))
    }

    /// One approval attempt inside an open transaction.
    async fn approve_once(
        txn: &DatabaseTransaction,
        id: DocumentId,
        approved_by: UserId,
        approval_notes: Option<String>,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        let mut doc = document::load(txn, id).await?;
        let expected_version = doc.version;

        let action = WorkflowService::approve(
            doc.status,
            approved_by,
            doc.requested_by,
            approval_notes,
        )?;

        // Load the referenced lines so the engine validates against the
        // state this transaction will write.
        let mut lines: HashMap<BudgetLineId, BudgetLine> = HashMap::new();
        for line_id in doc.payload.line_ids() {
            let model = budget_lines::Entity::find_by_id(line_id.into_inner())
                .one(txn)
                .await?
                .ok_or(LedgerError::LineNotFound(line_id))?;
            lines.insert(line_id, ledger::to_core(model)?);
        }

        let deltas = TransferEngine::document_deltas(&doc, |id| lines.get(&id))?;

        let mut updated_lines = Vec::with_capacity(deltas.len());
        for (line_id, delta) in &deltas {
            let line = ledger::apply_delta_on(txn, *line_id, delta).await?;
            updated_lines.push(line);
        }

        doc.status = action.new_status();
        doc.approved_by = Some(approved_by);
        doc.approved_date = Some(Utc::now());
        doc.applied = !deltas.is_empty();
        doc.version += 1;
        doc.updated_at = Utc::now();

        let db_status = sea_orm_active_enums::DocumentStatus::from(doc.status);
        let result = documents::Entity::update_many()
            .col_expr(documents::Column::Status, Expr::value(db_status))
            .col_expr(
                documents::Column::ApprovedBy,
                Expr::value(approved_by.into_inner()),
            )
            .col_expr(
                documents::Column::ApprovedDate,
                Expr::value(doc.approved_date.map(chrono::DateTime::<chrono::FixedOffset>::from)),
            )
            .col_expr(documents::Column::Applied, Expr::value(doc.applied))
            .col_expr(documents::Column::Version, Expr::value(doc.version))
            .col_expr(
                documents::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(doc.updated_at)),
            )
            .filter(documents::Column::Id.eq(id.into_inner()))
            .filter(documents::Column::Version.eq(expected_version))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ApprovalError::Conflict(id));
        }

        Ok(ApprovalOutcome {
            document: doc,
            lines: updated_lines,
        })
    }

    /// Rejects a pending document; no ledger effect.
    ///
    /// # Errors
    ///
    /// Returns a workflow error, `Conflict` on a lost version race, or a
    /// database error.
    pub async fn reject(
        &self,
        id: DocumentId,
        rejected_by: UserId,
        reason: String,
    ) -> Result<Document, ApprovalError> {
        let txn = self.db.begin().await?;
        let mut doc = document::load(&txn, id).await?;
        let expected_version = doc.version;

        let action = WorkflowService::reject(doc.status, rejected_by, reason.clone())?;
        doc.status = action.new_status();
        doc.rejection_reason = Some(reason);
        doc.version += 1;
        doc.updated_at = Utc::now();

        let db_status = sea_orm_active_enums::DocumentStatus::from(doc.status);
        let result = documents::Entity::update_many()
            .col_expr(documents::Column::Status, Expr::value(db_status))
            .col_expr(
                documents::Column::RejectionReason,
                Expr::value(doc.rejection_reason.clone()),
            )
            .col_expr(documents::Column::Version, Expr::value(doc.version))
            .col_expr(
                documents::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(doc.updated_at)),
            )
            .filter(documents::Column::Id.eq(id.into_inner()))
            .filter(documents::Column::Version.eq(expected_version))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ApprovalError::Conflict(id));
        }
        txn.commit().await?;

        info!(document_id = %id, "document rejected");
        Ok(doc)
    }
}
