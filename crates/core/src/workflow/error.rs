//! Workflow error types for the document lifecycle.

use thiserror::Error;

use fiscus_shared::types::{DocumentId, UserId};

use crate::workflow::types::DocumentStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: DocumentStatus,
        /// The attempted target status.
        to: DocumentStatus,
    },

    /// Attempted to edit a document outside an editable status.
    #[error("Document in status {0} cannot be edited")]
    NotEditable(DocumentStatus),

    /// A user may not approve a document they submitted.
    #[error("User {user_id} cannot approve their own document")]
    SelfApproval {
        /// The user who both submitted and attempted to approve.
        user_id: UserId,
    },

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Document not found.
    #[error("Document {0} not found")]
    DocumentNotFound(DocumentId),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::NotEditable(_)
            | Self::RejectionReasonRequired => 400,
            Self::SelfApproval { .. } => 403,
            Self::DocumentNotFound(_) => 404,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            // Both are "the document is in the wrong state"; the portal
            // matches on one code and the message carries the detail.
            Self::InvalidTransition { .. } | Self::NotEditable(_) => "INVALID_STATE",
            Self::SelfApproval { .. } => "SELF_APPROVAL",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = WorkflowError::InvalidTransition {
            from: DocumentStatus::Posted,
            to: DocumentStatus::Pending,
        };
        assert_eq!(err.to_string(), "Invalid status transition from posted to pending");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[test]
    fn test_state_errors_share_one_code() {
        // Clients match on INVALID_STATE for any wrong-state refusal;
        // only the message distinguishes a bad transition from an edit.
        let not_editable = WorkflowError::NotEditable(DocumentStatus::Posted);
        assert_eq!(not_editable.error_code(), "INVALID_STATE");
        assert_eq!(not_editable.status_code(), 400);
        assert_eq!(
            not_editable.to_string(),
            "Document in status posted cannot be edited"
        );
    }

    #[test]
    fn test_self_approval_is_forbidden() {
        let err = WorkflowError::SelfApproval {
            user_id: UserId::new(),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "SELF_APPROVAL");
    }
}
