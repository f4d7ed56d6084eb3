//! Financial documents: the tagged variants behind every budget screen.

pub mod error;
pub mod types;

pub use error::DocumentError;
pub use types::{Document, DocumentKind, DocumentPayload, InvoiceNumber, LineItem};
