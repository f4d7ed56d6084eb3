//! Document validation error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while creating or editing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document amount must be strictly positive.
    #[error("Invalid amount {0}: amount must be greater than zero")]
    InvalidAmount(Decimal),

    /// Transfer source and target must differ.
    #[error("Transfer source and target refer to the same budget line")]
    SameLine,

    /// An obligation request needs at least one line item.
    #[error("Obligation request requires at least one line item")]
    NoLineItems,

    /// Line items must sum to the document amount.
    #[error("Line items sum {items_total} does not match document amount {amount}")]
    LineItemMismatch {
        /// Sum of the itemized amounts.
        items_total: Decimal,
        /// The document's declared amount.
        amount: Decimal,
    },

    /// A single line item amount must be strictly positive.
    #[error("Line item '{description}' has non-positive amount {amount}")]
    InvalidLineItem {
        /// The offending item's description.
        description: String,
        /// The offending amount.
        amount: Decimal,
    },

    /// Invoice number did not match `<PREFIX>-<seq>-<year>`.
    #[error("Malformed invoice number: {0}")]
    MalformedInvoiceNumber(String),
}

impl DocumentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "VALIDATION_ERROR",
            Self::SameLine => "SAME_LINE",
            Self::NoLineItems => "NO_LINE_ITEMS",
            Self::LineItemMismatch { .. } => "LINE_ITEM_MISMATCH",
            Self::InvalidLineItem { .. } => "INVALID_LINE_ITEM",
            Self::MalformedInvoiceNumber(_) => "MALFORMED_INVOICE_NUMBER",
        }
    }
}
