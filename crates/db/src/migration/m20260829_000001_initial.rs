//! Initial database migration.
//!
//! Creates the ledger, document, and fund tables plus their enums and
//! indexes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: LEDGER
        // ============================================================
        db.execute_unprepared(BUDGET_LINES_SQL).await?;

        // ============================================================
        // PART 3: DOCUMENTS
        // ============================================================
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        db.execute_unprepared(DOCUMENT_LINE_ITEMS_SQL).await?;

        // ============================================================
        // PART 4: FUNDS
        // ============================================================
        db.execute_unprepared(FUNDS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Document workflow status
CREATE TYPE document_status AS ENUM (
    'draft',
    'pending',
    'approved',
    'rejected',
    'posted',
    'cancelled'
);

-- Document kind
CREATE TYPE document_kind AS ENUM (
    'allotment_release',
    'supplemental',
    'transfer',
    'fund_transfer',
    'obligation_request',
    'cheque_request'
);
";

const BUDGET_LINES_SQL: &str = r"
CREATE TABLE budget_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    fiscal_year_id UUID NOT NULL,
    fund_id UUID NOT NULL,
    department_id UUID NOT NULL,
    sub_department_id UUID NOT NULL,
    chart_of_account_id UUID NOT NULL,
    project_id UUID NOT NULL,
    original_appropriation NUMERIC(19, 2) NOT NULL,
    adjustments NUMERIC(19, 2) NOT NULL DEFAULT 0,
    released_allotment NUMERIC(19, 2) NOT NULL DEFAULT 0,
    charges NUMERIC(19, 2) NOT NULL DEFAULT 0,
    pre_encumbrance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    encumbrance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    monthly_allocations JSONB NOT NULL,
    overdrawn BOOLEAN NOT NULL DEFAULT false,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (
        fiscal_year_id,
        fund_id,
        department_id,
        sub_department_id,
        chart_of_account_id,
        project_id
    )
);

CREATE INDEX idx_budget_lines_fiscal_year ON budget_lines(fiscal_year_id);
CREATE INDEX idx_budget_lines_fund ON budget_lines(fund_id);
CREATE INDEX idx_budget_lines_department ON budget_lines(department_id);
";

const DOCUMENTS_SQL: &str = r"
CREATE TABLE documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    invoice_number VARCHAR(32) NOT NULL UNIQUE,
    invoice_seq INTEGER NOT NULL,
    invoice_year INTEGER NOT NULL,
    kind document_kind NOT NULL,
    status document_status NOT NULL DEFAULT 'pending',
    amount NUMERIC(19, 2) NOT NULL,
    payload JSONB NOT NULL,
    requested_by UUID NOT NULL,
    request_date TIMESTAMPTZ NOT NULL DEFAULT now(),
    remarks TEXT,
    approved_by UUID,
    approved_date TIMESTAMPTZ,
    rejection_reason TEXT,
    applied BOOLEAN NOT NULL DEFAULT false,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (kind, invoice_year, invoice_seq)
);

CREATE INDEX idx_documents_status ON documents(status);
CREATE INDEX idx_documents_requested_by ON documents(requested_by);
";

const DOCUMENT_LINE_ITEMS_SQL: &str = r"
CREATE TABLE document_line_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    document_id UUID NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    account_code VARCHAR(64) NOT NULL,
    description TEXT NOT NULL,
    amount NUMERIC(19, 2) NOT NULL CHECK (amount > 0)
);

CREATE INDEX idx_document_line_items_document ON document_line_items(document_id);
";

const FUNDS_SQL: &str = r"
CREATE TABLE funds (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    parent_fund_id UUID REFERENCES funds(id),
    code VARCHAR(32) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    default_line_id UUID REFERENCES budget_lines(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_funds_parent ON funds(parent_fund_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS funds CASCADE;
DROP TABLE IF EXISTS document_line_items CASCADE;
DROP TABLE IF EXISTS documents CASCADE;
DROP TABLE IF EXISTS budget_lines CASCADE;
DROP TYPE IF EXISTS document_kind;
DROP TYPE IF EXISTS document_status;
";
