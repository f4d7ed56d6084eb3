//! Database enum mappings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Workflow status of a document, mirrored from the domain enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_status")]
pub enum DocumentStatus {
    /// Document is being drafted.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Document is awaiting approval.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Document has been approved and applied.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Document was rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Document has been posted.
    #[sea_orm(string_value = "posted")]
    Posted,
    /// Document was cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Document kind, mirrored from the domain enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_kind")]
pub enum DocumentKind {
    /// Allotment release (BA).
    #[sea_orm(string_value = "allotment_release")]
    AllotmentRelease,
    /// Supplemental budget (BS).
    #[sea_orm(string_value = "supplemental")]
    Supplemental,
    /// Intra-fund transfer (BT).
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// Inter-fund transfer (FT).
    #[sea_orm(string_value = "fund_transfer")]
    FundTransfer,
    /// Obligation request (OBR).
    #[sea_orm(string_value = "obligation_request")]
    ObligationRequest,
    /// Cheque request (CHQ).
    #[sea_orm(string_value = "cheque_request")]
    ChequeRequest,
}

impl From<fiscus_core::workflow::DocumentStatus> for DocumentStatus {
    fn from(status: fiscus_core::workflow::DocumentStatus) -> Self {
        use fiscus_core::workflow::DocumentStatus as Core;
        match status {
            Core::Draft => Self::Draft,
            Core::Pending => Self::Pending,
            Core::Approved => Self::Approved,
            Core::Rejected => Self::Rejected,
            Core::Posted => Self::Posted,
            Core::Cancelled => Self::Cancelled,
        }
    }
}

impl From<DocumentStatus> for fiscus_core::workflow::DocumentStatus {
    fn from(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Draft => Self::Draft,
            DocumentStatus::Pending => Self::Pending,
            DocumentStatus::Approved => Self::Approved,
            DocumentStatus::Rejected => Self::Rejected,
            DocumentStatus::Posted => Self::Posted,
            DocumentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<fiscus_core::document::DocumentKind> for DocumentKind {
    fn from(kind: fiscus_core::document::DocumentKind) -> Self {
        use fiscus_core::document::DocumentKind as Core;
        match kind {
            Core::AllotmentRelease => Self::AllotmentRelease,
            Core::Supplemental => Self::Supplemental,
            Core::Transfer => Self::Transfer,
            Core::FundTransfer => Self::FundTransfer,
            Core::ObligationRequest => Self::ObligationRequest,
            Core::ChequeRequest => Self::ChequeRequest,
        }
    }
}

impl From<DocumentKind> for fiscus_core::document::DocumentKind {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::AllotmentRelease => Self::AllotmentRelease,
            DocumentKind::Supplemental => Self::Supplemental,
            DocumentKind::Transfer => Self::Transfer,
            DocumentKind::FundTransfer => Self::FundTransfer,
            DocumentKind::ObligationRequest => Self::ObligationRequest,
            DocumentKind::ChequeRequest => Self::ChequeRequest,
        }
    }
}
