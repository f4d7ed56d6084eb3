//! Document routes: creation per kind and workflow transitions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::middleware::AuthUser;
use crate::routes::budget_lines::BudgetLineResponse;
use crate::routes::funds::map_fund_error;
use fiscus_core::document::{Document, DocumentPayload, LineItem};
use fiscus_core::workflow::DocumentStatus;
use fiscus_db::repositories::approval::{ApprovalError, ApprovalRepository};
use fiscus_db::repositories::document::{
    CreateDocumentInput, DocumentRepository, DocumentStoreError, UpdateDocumentInput,
};
use fiscus_db::repositories::fund::FundRepository;

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgetAllotment", post(create_allotment))
        .route("/budgetSupplemental/save", post(create_supplemental))
        .route("/budgetTransfer", post(create_transfer))
        .route("/fundTransfer", post(create_fund_transfer))
        .route("/obligationRequest", post(create_obligation_request))
        .route("/chequeRequest", post(create_cheque_request))
        .route("/documents", get(list_documents))
        .route("/documents/{id}", get(get_document))
        .route("/documents/{id}", put(update_document))
        .route("/documents/{id}/approve", post(approve_document))
        .route("/documents/{id}/reject", post(reject_document))
        .route("/documents/{id}/post", post(post_document))
        .route("/documents/{id}/cancel", post(cancel_document))
        .route("/documents/{id}/resubmit", post(resubmit_document))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for an allotment release.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllotmentRequest {
    /// The line receiving the release.
    pub line_id: Uuid,
    /// Release amount.
    pub amount: Decimal,
    /// Admin override past the appropriation balance.
    #[serde(default)]
    pub override_balance: bool,
    /// Free-text remarks.
    pub remarks: Option<String>,
    /// Attachment metadata, stored by the external attachment service.
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Request body for a supplemental budget.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplementalRequest {
    /// The line being supplemented.
    pub line_id: Uuid,
    /// Supplemental amount.
    pub amount: Decimal,
    /// Free-text remarks.
    pub remarks: Option<String>,
}

/// Request body for an intra-fund transfer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    /// Line the appropriation leaves.
    pub source_line_id: Uuid,
    /// Line the appropriation enters.
    pub target_line_id: Uuid,
    /// Transfer amount.
    pub amount: Decimal,
    /// Admin override past the source balance.
    #[serde(default)]
    pub override_balance: bool,
    /// Free-text remarks.
    pub remarks: Option<String>,
}

/// Request body for an inter-fund transfer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFundTransferRequest {
    /// Fund the appropriation leaves.
    pub source_fund_id: Uuid,
    /// Fund the appropriation enters.
    pub target_fund_id: Uuid,
    /// Transfer amount.
    pub amount: Decimal,
    /// Admin override past the source balance.
    #[serde(default)]
    pub override_balance: bool,
    /// Free-text remarks.
    pub remarks: Option<String>,
}

/// One itemized charge in an obligation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    /// Chart of accounts code.
    pub account_code: String,
    /// Free-text description.
    pub description: String,
    /// Item amount.
    pub amount: Decimal,
}

/// Request body for an obligation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateObligationRequest {
    /// The line being charged.
    pub line_id: Uuid,
    /// Document amount; must equal the item sum.
    pub amount: Decimal,
    /// Itemized charges.
    pub items: Vec<LineItemRequest>,
    /// Free-text remarks.
    pub remarks: Option<String>,
}

/// Request body for a cheque request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChequeRequest {
    /// The obligation request being paid.
    pub obligation_id: Uuid,
    /// Payee name.
    pub payee: String,
    /// Cheque amount.
    pub amount: Decimal,
    /// Free-text remarks.
    pub remarks: Option<String>,
}

/// Request body for editing a pending or rejected document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New remarks.
    pub remarks: Option<String>,
}

/// Query parameters for listing documents.
#[derive(Debug, Default, Deserialize)]
pub struct ListDocumentsParams {
    /// Restrict to one workflow status.
    pub status: Option<String>,
}

/// Request body for an approval.
#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    /// Optional notes from the approver.
    pub notes: Option<String>,
}

/// Request body for a rejection.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// The reason for rejection.
    pub reason: String,
}

/// Response for a document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    /// Document ID.
    pub id: Uuid,
    /// Unique invoice number.
    pub invoice_number: String,
    /// Document kind.
    pub kind: String,
    /// Workflow status.
    pub status: String,
    /// Document amount.
    pub amount: String,
    /// Variant payload with line references.
    pub payload: DocumentPayload,
    /// The requesting user.
    pub requested_by: Uuid,
    /// When the document was requested.
    pub request_date: String,
    /// Free-text remarks.
    pub remarks: Option<String>,
    /// The approver, once approved.
    pub approved_by: Option<Uuid>,
    /// When the document was approved.
    pub approved_date: Option<String>,
    /// Reason attached at rejection time.
    pub rejection_reason: Option<String>,
    /// Whether the ledger effect has been applied.
    pub applied: bool,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl DocumentResponse {
    fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.into_inner(),
            invoice_number: doc.invoice_number.to_string(),
            kind: doc.kind().to_string(),
            status: doc.status.to_string(),
            amount: doc.amount.to_string(),
            payload: doc.payload.clone(),
            requested_by: doc.requested_by.into_inner(),
            request_date: doc.request_date.to_rfc3339(),
            remarks: doc.remarks.clone(),
            approved_by: doc.approved_by.map(fiscus_shared::types::UserId::into_inner),
            approved_date: doc.approved_date.map(|d| d.to_rfc3339()),
            rejection_reason: doc.rejection_reason.clone(),
            applied: doc.applied,
            version: doc.version,
        }
    }
}

/// Response for an approval: the document plus every affected line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    /// The approved document.
    pub document: DocumentResponse,
    /// The budget lines after the mutation.
    pub lines: Vec<BudgetLineResponse>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/budgetAllotment` - Create an allotment release in `pending`.
async fn create_allotment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateAllotmentRequest>,
) -> impl IntoResponse {
    if !request.attachments.is_empty() {
        info!(count = request.attachments.len(), "attachment metadata received");
    }
    let payload = DocumentPayload::AllotmentRelease {
        line_id: request.line_id.into(),
        override_balance: request.override_balance,
    };
    create_document(&state, auth, payload, request.amount, request.remarks).await
}

/// POST `/budgetSupplemental/save` - Create a supplemental in `pending`.
async fn create_supplemental(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateSupplementalRequest>,
) -> impl IntoResponse {
    let payload = DocumentPayload::Supplemental {
        line_id: request.line_id.into(),
    };
    create_document(&state, auth, payload, request.amount, request.remarks).await
}

/// POST `/budgetTransfer` - Create an intra-fund transfer in `pending`.
async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    let payload = DocumentPayload::Transfer {
        source_line_id: request.source_line_id.into(),
        target_line_id: request.target_line_id.into(),
        override_balance: request.override_balance,
    };
    create_document(&state, auth, payload, request.amount, request.remarks).await
}

/// POST `/fundTransfer` - Create an inter-fund transfer in `pending`.
///
/// The funds' default budget lines are resolved at creation time, so the
/// approval path sees an ordinary two-line transfer.
async fn create_fund_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateFundTransferRequest>,
) -> impl IntoResponse {
    let funds = FundRepository::new((*state.db).clone());

    let source_line_id = match funds.default_line(request.source_fund_id.into()).await {
        Ok(id) => id,
        Err(e) => return map_fund_error(&e),
    };
    let target_line_id = match funds.default_line(request.target_fund_id.into()).await {
        Ok(id) => id,
        Err(e) => return map_fund_error(&e),
    };

    let payload = DocumentPayload::FundTransfer {
        source_fund_id: request.source_fund_id.into(),
        target_fund_id: request.target_fund_id.into(),
        source_line_id,
        target_line_id,
        override_balance: request.override_balance,
    };
    create_document(&state, auth, payload, request.amount, request.remarks).await
}

/// POST `/obligationRequest` - Create an obligation request in `pending`.
async fn create_obligation_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateObligationRequest>,
) -> impl IntoResponse {
    let items = request
        .items
        .into_iter()
        .map(|item| LineItem {
            account_code: item.account_code,
            description: item.description,
            amount: item.amount,
        })
        .collect();
    let payload = DocumentPayload::ObligationRequest {
        line_id: request.line_id.into(),
        items,
    };
    create_document(&state, auth, payload, request.amount, request.remarks).await
}

/// POST `/chequeRequest` - Create a cheque request in `pending`.
async fn create_cheque_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateChequeRequest>,
) -> impl IntoResponse {
    let payload = DocumentPayload::ChequeRequest {
        obligation_id: request.obligation_id.into(),
        payee: request.payee,
    };
    create_document(&state, auth, payload, request.amount, request.remarks).await
}

/// Shared creation path for every document kind.
async fn create_document(
    state: &AppState,
    auth: AuthUser,
    payload: DocumentPayload,
    amount: Decimal,
    remarks: Option<String>,
) -> axum::response::Response {
    let repo = DocumentRepository::new((*state.db).clone());
    let input = CreateDocumentInput {
        payload,
        amount,
        requested_by: auth.user_id(),
        remarks,
    };
    match repo.create(input).await {
        Ok(doc) => {
            info!(
                document_id = %doc.id,
                invoice = %doc.invoice_number,
                user_id = %auth.user_id(),
                "document created"
            );
            (StatusCode::CREATED, Json(DocumentResponse::from_document(&doc))).into_response()
        }
        Err(e) => map_document_error(&e),
    }
}

/// GET `/documents` - List documents, optionally by status.
async fn list_documents(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ListDocumentsParams>,
) -> impl IntoResponse {
    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => match DocumentStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "VALIDATION_ERROR",
                        "message": format!("Unknown document status: {raw}")
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = DocumentRepository::new((*state.db).clone());
    match repo.list(status).await {
        Ok(docs) => {
            let response: Vec<DocumentResponse> =
                docs.iter().map(DocumentResponse::from_document).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => map_document_error(&e),
    }
}

/// GET `/documents/{id}` - Fetch a single document.
async fn get_document(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = DocumentRepository::new((*state.db).clone());
    match repo.get(id.into()).await {
        Ok(doc) => {
            (StatusCode::OK, Json(DocumentResponse::from_document(&doc))).into_response()
        }
        Err(e) => map_document_error(&e),
    }
}

/// PUT `/documents/{id}` - Edit a pending or rejected document.
async fn update_document(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDocumentRequest>,
) -> impl IntoResponse {
    let repo = DocumentRepository::new((*state.db).clone());
    let input = UpdateDocumentInput {
        amount: request.amount,
        remarks: request.remarks.map(Some),
        payload: None,
    };
    match repo.update(id.into(), input).await {
        Ok(doc) => {
            (StatusCode::OK, Json(DocumentResponse::from_document(&doc))).into_response()
        }
        Err(e) => map_document_error(&e),
    }
}

/// POST `/documents/{id}/approve` - Approve and apply the ledger effect.
async fn approve_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    request: Option<Json<ApproveRequest>>,
) -> impl IntoResponse {
    let notes = request.and_then(|Json(r)| r.notes);
    let repo = ApprovalRepository::new((*state.db).clone(), state.write_retries());
    match repo.approve(id.into(), auth.user_id(), notes).await {
        Ok(outcome) => {
            let response = ApprovalResponse {
                document: DocumentResponse::from_document(&outcome.document),
                lines: outcome.lines.iter().map(BudgetLineResponse::from_line).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => map_approval_error(&e),
    }
}

/// POST `/documents/{id}/reject` - Reject a pending document.
async fn reject_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> impl IntoResponse {
    let repo = ApprovalRepository::new((*state.db).clone(), state.write_retries());
    match repo.reject(id.into(), auth.user_id(), request.reason).await {
        Ok(doc) => {
            (StatusCode::OK, Json(DocumentResponse::from_document(&doc))).into_response()
        }
        Err(e) => map_approval_error(&e),
    }
}

/// POST `/documents/{id}/post` - Seal an approved document.
async fn post_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = DocumentRepository::new((*state.db).clone());
    match repo.post(id.into(), auth.user_id()).await {
        Ok(doc) => {
            (StatusCode::OK, Json(DocumentResponse::from_document(&doc))).into_response()
        }
        Err(e) => map_document_error(&e),
    }
}

/// POST `/documents/{id}/cancel` - Cancel before approval.
async fn cancel_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = DocumentRepository::new((*state.db).clone());
    match repo.cancel(id.into(), auth.user_id()).await {
        Ok(doc) => {
            (StatusCode::OK, Json(DocumentResponse::from_document(&doc))).into_response()
        }
        Err(e) => map_document_error(&e),
    }
}

/// POST `/documents/{id}/resubmit` - Resubmit a rejected document.
async fn resubmit_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = DocumentRepository::new((*state.db).clone());
    match repo.resubmit(id.into(), auth.user_id()).await {
        Ok(doc) => {
            (StatusCode::OK, Json(DocumentResponse::from_document(&doc))).into_response()
        }
        Err(e) => map_document_error(&e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn map_document_error(e: &DocumentStoreError) -> axum::response::Response {
    if matches!(e, DocumentStoreError::Database(_)) {
        error!(error = %e, "document store failure");
    }
    error_response(e.status_code(), e.error_code(), &e.to_string())
}

fn map_approval_error(e: &ApprovalError) -> axum::response::Response {
    if matches!(e, ApprovalError::Database(_)) {
        error!(error = %e, "approval failure");
    }
    error_response(e.status_code(), e.error_code(), &e.to_string())
}

fn error_response(status: u16, code: &str, message: &str) -> axum::response::Response {
    let status =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}
