//! Shared approval workflow for budget documents.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{DocumentStatus, WorkflowAction};
