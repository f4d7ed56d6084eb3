//! Document repository: creation, editing, and non-ledger transitions.
//!
//! Approval, which couples a status change to ledger writes, lives in
//! the approval repository; everything else about a document's
//! lifecycle is handled here.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};

use fiscus_core::document::{
    Document, DocumentError, DocumentKind, DocumentPayload, InvoiceNumber, LineItem,
};
use fiscus_core::workflow::{DocumentStatus, WorkflowError, WorkflowService};
use fiscus_shared::types::{DocumentId, UserId};

use crate::entities::{document_line_items, documents, sea_orm_active_enums};

/// Retry budget for invoice sequence races at creation.
const CREATE_RETRIES: u32 = 3;

/// Errors raised by the document store.
#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    /// Variant validation failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The workflow refused the transition.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Document not found.
    #[error("Document {0} not found")]
    NotFound(DocumentId),

    /// Concurrent approver actions lost the race.
    #[error("Concurrent update on document {0}, please retry")]
    Conflict(DocumentId),

    /// Concurrent creates exhausted the invoice sequence retries.
    #[error("Concurrent {kind} creations for {year} exhausted retries, please retry")]
    SequenceConflict {
        /// Document kind whose sequence was contended.
        kind: DocumentKind,
        /// Invoice year of the contended sequence.
        year: i32,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl DocumentStoreError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Document(err) => err.status_code(),
            Self::Workflow(err) => err.status_code(),
            Self::NotFound(_) => 404,
            Self::Conflict(_) | Self::SequenceConflict { .. } => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Document(err) => err.error_code(),
            Self::Workflow(err) => err.error_code(),
            Self::NotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::Conflict(_) | Self::SequenceConflict { .. } => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for creating a document.
#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    /// Variant payload with line references.
    pub payload: DocumentPayload,
    /// Document amount.
    pub amount: Decimal,
    /// The requesting user.
    pub requested_by: UserId,
    /// Free-text remarks.
    pub remarks: Option<String>,
}

/// Input for editing a pending or rejected document.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentInput {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New remarks.
    pub remarks: Option<Option<String>>,
    /// Replacement payload (same kind as the original).
    pub payload: Option<DocumentPayload>,
}

/// Repository for document CRUD and non-ledger transitions.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
}

impl DocumentRepository {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a document in Pending status with the next invoice
    /// number for its kind and year.
    ///
    /// Sequence allocation is optimistic: two concurrent creates can
    /// read the same max sequence, the unique index on
    /// (kind, invoice_year, invoice_seq) fails the loser, and the loser
    /// re-reads with a fresh transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `SequenceConflict` after the retry
    /// budget is exhausted, or a database error.
    pub async fn create(
        &self,
        input: CreateDocumentInput,
    ) -> Result<Document, DocumentStoreError> {
        Document::validate(&input.payload, input.amount)?;
        let kind = input.payload.kind();
        let year = Utc::now().year();

        for attempt in 0..CREATE_RETRIES {
            match self.try_create(&input, kind, year).await {
                Err(DocumentStoreError::Database(err)) if is_unique_violation(&err) => {
                    warn!(%kind, year, attempt, "invoice sequence race, retrying");
                }
                result => return result,
            }
        }
        Err(DocumentStoreError::SequenceConflict { kind, year })
    }

    /// One creation attempt; the dropped transaction rolls back on error.
    async fn try_create(
        &self,
        input: &CreateDocumentInput,
        kind: DocumentKind,
        year: i32,
    ) -> Result<Document, DocumentStoreError> {
        let txn = self.db.begin().await?;
        let sequence = next_sequence(&txn, kind, year).await?;

        let document = Document::new(
            InvoiceNumber::new(kind, sequence, year),
            input.payload.clone(),
            input.amount,
            input.requested_by,
            input.remarks.clone(),
        )?;

        to_active_model(&document)?.insert(&txn).await?;
        if let DocumentPayload::ObligationRequest { items, .. } = &document.payload {
            insert_line_items(&txn, document.id, items).await?;
        }
        txn.commit().await?;

        info!(
            document_id = %document.id,
            invoice = %document.invoice_number,
            "document created"
        );
        Ok(document)
    }

    /// Fetches a document by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn get(&self, id: DocumentId) -> Result<Document, DocumentStoreError> {
        let model = documents::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(DocumentStoreError::NotFound(id))?;
        to_core(model)
    }

    /// Lists documents, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(
        &self,
        status: Option<DocumentStatus>,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let mut query = documents::Entity::find().order_by_desc(documents::Column::CreatedAt);
        if let Some(status) = status {
            let db_status = sea_orm_active_enums::DocumentStatus::from(status);
            query = query.filter(documents::Column::Status.eq(db_status));
        }
        let models = query.all(&self.db).await?;
        models.into_iter().map(to_core).collect()
    }

    /// Edits a pending or rejected document.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable` outside Pending/Rejected, a validation
    /// error, `Conflict` on a lost version race, or a database error.
    pub async fn update(
        &self,
        id: DocumentId,
        input: UpdateDocumentInput,
    ) -> Result<Document, DocumentStoreError> {
        let txn = self.db.begin().await?;
        let mut document = load(&txn, id).await?;
        WorkflowService::ensure_editable(document.status)?;
        let expected_version = document.version;

        if let Some(amount) = input.amount {
            document.amount = amount;
        }
        if let Some(remarks) = input.remarks {
            document.remarks = remarks;
        }
        if let Some(payload) = input.payload {
            document.payload = payload;
        }
        Document::validate(&document.payload, document.amount)?;
        document.version += 1;
        document.updated_at = Utc::now();

        let payload_json = payload_json(&document.payload)?;
        let result = documents::Entity::update_many()
            .col_expr(documents::Column::Amount, Expr::value(document.amount))
            .col_expr(
                documents::Column::Remarks,
                Expr::value(document.remarks.clone()),
            )
            .col_expr(documents::Column::Payload, Expr::value(payload_json))
            .col_expr(documents::Column::Version, Expr::value(document.version))
            .col_expr(
                documents::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(
                    document.updated_at,
                )),
            )
            .filter(documents::Column::Id.eq(id.into_inner()))
            .filter(documents::Column::Version.eq(expected_version))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DocumentStoreError::Conflict(id));
        }

        // Itemized charges are mirrored in their own table for reporting.
        if let DocumentPayload::ObligationRequest { items, .. } = &document.payload {
            document_line_items::Entity::delete_many()
                .filter(document_line_items::Column::DocumentId.eq(id.into_inner()))
                .exec(&txn)
                .await?;
            insert_line_items(&txn, id, items).await?;
        }

        txn.commit().await?;
        Ok(document)
    }

    /// Cancels a pending or rejected document.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidTransition`, `Conflict`, or database error.
    pub async fn cancel(
        &self,
        id: DocumentId,
        cancelled_by: UserId,
    ) -> Result<Document, DocumentStoreError> {
        self.transition(id, move |status| {
            WorkflowService::cancel(status, cancelled_by)
        })
        .await
    }

    /// Resubmits a rejected document.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidTransition`, `Conflict`, or database error.
    pub async fn resubmit(
        &self,
        id: DocumentId,
        resubmitted_by: UserId,
    ) -> Result<Document, DocumentStoreError> {
        self.transition(id, move |status| {
            WorkflowService::resubmit(status, resubmitted_by)
        })
        .await
    }

    /// Posts an approved document.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidTransition`, `Conflict`, or database error.
    pub async fn post(
        &self,
        id: DocumentId,
        posted_by: UserId,
    ) -> Result<Document, DocumentStoreError> {
        self.transition(id, move |status| WorkflowService::post(status, posted_by))
            .await
    }

    /// Runs a status-only transition under the document's version.
    async fn transition<F>(&self, id: DocumentId, action: F) -> Result<Document, DocumentStoreError>
    where
        F: FnOnce(
            DocumentStatus,
        ) -> Result<fiscus_core::workflow::WorkflowAction, WorkflowError>,
    {
        let txn = self.db.begin().await?;
        let mut document = load(&txn, id).await?;
        let expected_version = document.version;

        let workflow_action = action(document.status)?;
        document.status = workflow_action.new_status();
        document.version += 1;
        document.updated_at = Utc::now();

        let db_status = sea_orm_active_enums::DocumentStatus::from(document.status);
        let result = documents::Entity::update_many()
            .col_expr(documents::Column::Status, Expr::value(db_status))
            .col_expr(documents::Column::Version, Expr::value(document.version))
            .col_expr(
                documents::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(
                    document.updated_at,
                )),
            )
            .filter(documents::Column::Id.eq(id.into_inner()))
            .filter(documents::Column::Version.eq(expected_version))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DocumentStoreError::Conflict(id));
        }
        txn.commit().await?;

        info!(document_id = %id, status = %document.status, "document transitioned");
        Ok(document)
    }
}

/// Allocates the next invoice sequence for a kind and year.
async fn next_sequence(
    txn: &DatabaseTransaction,
    kind: DocumentKind,
    year: i32,
) -> Result<u32, DbErr> {
    let db_kind = sea_orm_active_enums::DocumentKind::from(kind);
    let max: Option<i32> = documents::Entity::find()
        .filter(documents::Column::Kind.eq(db_kind))
        .filter(documents::Column::InvoiceYear.eq(year))
        .select_only()
        .column_as(documents::Column::InvoiceSeq.max(), "max_seq")
        .into_tuple()
        .one(txn)
        .await?
        .flatten();
    Ok(u32::try_from(max.unwrap_or(0)).unwrap_or(0) + 1)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

async fn insert_line_items(
    txn: &DatabaseTransaction,
    document_id: DocumentId,
    items: &[LineItem],
) -> Result<(), DbErr> {
    for item in items {
        document_line_items::ActiveModel {
            id: Set(uuid::Uuid::now_v7()),
            document_id: Set(document_id.into_inner()),
            account_code: Set(item.account_code.clone()),
            description: Set(item.description.clone()),
            amount: Set(item.amount),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

pub(crate) async fn load<C: sea_orm::ConnectionTrait>(
    conn: &C,
    id: DocumentId,
) -> Result<Document, DocumentStoreError> {
    let model = documents::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(DocumentStoreError::NotFound(id))?;
    to_core(model)
}

// ============================================================
// Model conversion
// ============================================================

pub(crate) fn payload_json(payload: &DocumentPayload) -> Result<serde_json::Value, DbErr> {
    serde_json::to_value(payload).map_err(|e| DbErr::Custom(e.to_string()))
}

pub(crate) fn to_core(model: documents::Model) -> Result<Document, DocumentStoreError> {
    let payload: DocumentPayload = serde_json::from_value(model.payload)
        .map_err(|e| DbErr::Custom(e.to_string()))?;
    let invoice_number: InvoiceNumber = model.invoice_number.parse()?;

    Ok(Document {
        id: model.id.into(),
        invoice_number,
        payload,
        status: model.status.into(),
        amount: model.amount,
        requested_by: model.requested_by.into(),
        request_date: model.request_date.with_timezone(&Utc),
        remarks: model.remarks,
        approved_by: model.approved_by.map(Into::into),
        approved_date: model.approved_date.map(|d| d.with_timezone(&Utc)),
        rejection_reason: model.rejection_reason,
        applied: model.applied,
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn to_active_model(
    document: &Document,
) -> Result<documents::ActiveModel, DocumentStoreError> {
    let payload = payload_json(&document.payload)?;
    let sequence = i32::try_from(document.invoice_number.sequence())
        .map_err(|e| DbErr::Custom(e.to_string()))?;

    Ok(documents::ActiveModel {
        id: Set(document.id.into_inner()),
        invoice_number: Set(document.invoice_number.to_string()),
        invoice_seq: Set(sequence),
        invoice_year: Set(document.invoice_number.year()),
        kind: Set(document.kind().into()),
        status: Set(document.status.into()),
        amount: Set(document.amount),
        payload: Set(payload),
        requested_by: Set(document.requested_by.into_inner()),
        request_date: Set(document.request_date.into()),
        remarks: Set(document.remarks.clone()),
        approved_by: Set(document.approved_by.map(fiscus_shared::types::UserId::into_inner)),
        approved_date: Set(document.approved_date.map(Into::into)),
        rejection_reason: Set(document.rejection_reason.clone()),
        applied: Set(document.applied),
        version: Set(document.version),
        created_at: Set(document.created_at.into()),
        updated_at: Set(document.updated_at.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_conflict_maps_to_conflict() {
        let err = DocumentStoreError::SequenceConflict {
            kind: DocumentKind::Transfer,
            year: 2026,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "CONFLICT");
        assert!(err.to_string().contains("2026"));
    }
}
