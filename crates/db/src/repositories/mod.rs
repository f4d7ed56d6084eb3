//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod approval;
pub mod document;
pub mod fund;
pub mod ledger;

#[cfg(test)]
mod conversion_tests;
#[cfg(test)]
mod ledger_integration_tests;

pub use approval::{ApprovalError, ApprovalOutcome, ApprovalRepository};
pub use document::{
    CreateDocumentInput, DocumentRepository, DocumentStoreError, UpdateDocumentInput,
};
pub use fund::{CreateFundInput, FundError, FundRepository};
pub use ledger::{CreateLineInput, LedgerRepository, LedgerStoreError};
