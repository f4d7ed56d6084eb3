//! Round-trip tests between domain types and database models.

use rust_decimal_macros::dec;
use uuid::Uuid;

use fiscus_core::document::{Document, DocumentKind, DocumentPayload, InvoiceNumber};
use fiscus_core::ledger::{BudgetLine, LineKey};
use fiscus_shared::types::{
    BudgetLineId, ChartOfAccountId, DepartmentId, FiscalYearId, FundId, ProjectId,
    SubDepartmentId, UserId,
};

use crate::entities::sea_orm_active_enums;
use crate::repositories::{document, ledger};

fn line_key() -> LineKey {
    LineKey {
        fiscal_year_id: FiscalYearId::new(),
        fund_id: FundId::new(),
        department_id: DepartmentId::new(),
        sub_department_id: SubDepartmentId::new(),
        chart_of_account_id: ChartOfAccountId::new(),
        project_id: ProjectId::new(),
    }
}

#[test]
fn test_budget_line_model_roundtrip() {
    let line = BudgetLine::open(line_key(), dec!(21_111_200)).unwrap();
    let model = ledger::to_active_model(&line).unwrap();
    let model = sea_orm::TryIntoModel::try_into_model(model).unwrap();
    let back = ledger::to_core(model).unwrap();

    assert_eq!(back.id, line.id);
    assert_eq!(back.key, line.key);
    assert_eq!(back.original_appropriation, line.original_appropriation);
    assert_eq!(back.monthly_allocations, line.monthly_allocations);
    assert_eq!(back.version, line.version);
}

#[test]
fn test_document_model_roundtrip() {
    let doc = Document::new(
        InvoiceNumber::new(DocumentKind::Transfer, 12, 2026),
        DocumentPayload::Transfer {
            source_line_id: BudgetLineId::new(),
            target_line_id: BudgetLineId::new(),
            override_balance: false,
        },
        dec!(250_000),
        UserId::new(),
        Some("quarterly realignment".to_string()),
    )
    .unwrap();

    let model = document::to_active_model(&doc).unwrap();
    let model = sea_orm::TryIntoModel::try_into_model(model).unwrap();
    assert_eq!(model.invoice_number, "BT-0012-2026");
    assert_eq!(model.invoice_seq, 12);
    assert_eq!(model.invoice_year, 2026);

    let back = document::to_core(model).unwrap();
    assert_eq!(back.id, doc.id);
    assert_eq!(back.invoice_number, doc.invoice_number);
    assert_eq!(back.payload, doc.payload);
    assert_eq!(back.status, doc.status);
    assert_eq!(back.amount, doc.amount);
    assert!(!back.applied);
}

#[test]
fn test_status_enum_mapping_roundtrip() {
    use fiscus_core::workflow::DocumentStatus as Core;
    for status in [
        Core::Draft,
        Core::Pending,
        Core::Approved,
        Core::Rejected,
        Core::Posted,
        Core::Cancelled,
    ] {
        let db = sea_orm_active_enums::DocumentStatus::from(status);
        assert_eq!(Core::from(db), status);
    }
}

#[test]
fn test_kind_enum_mapping_roundtrip() {
    use fiscus_core::document::DocumentKind as Core;
    for kind in [
        Core::AllotmentRelease,
        Core::Supplemental,
        Core::Transfer,
        Core::FundTransfer,
        Core::ObligationRequest,
        Core::ChequeRequest,
    ] {
        let db = sea_orm_active_enums::DocumentKind::from(kind);
        assert_eq!(Core::from(db), kind);
    }
}

#[test]
fn test_payload_json_roundtrip() {
    let payload = DocumentPayload::FundTransfer {
        source_fund_id: FundId::from(Uuid::now_v7()),
        target_fund_id: FundId::from(Uuid::now_v7()),
        source_line_id: BudgetLineId::new(),
        target_line_id: BudgetLineId::new(),
        override_balance: true,
    };
    let json = document::payload_json(&payload).unwrap();
    let back: DocumentPayload = serde_json::from_value(json).unwrap();
    assert_eq!(back, payload);
}
