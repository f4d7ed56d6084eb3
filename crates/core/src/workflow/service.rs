//! Workflow service for document state transitions.
//!
//! This module implements the state machine shared by every document
//! kind. It validates transitions and produces audit actions; applying
//! the ledger effect of an approval is the caller's responsibility and
//! happens in the same database transaction as the status change.

use chrono::Utc;

use fiscus_shared::types::UserId;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{DocumentStatus, WorkflowAction};

/// Stateless service for managing document workflow transitions.
///
/// All methods are associated functions that validate and execute
/// state transitions, returning the appropriate `WorkflowAction`
/// with audit trail information.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft document for approval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the document is in Draft status.
    pub fn submit(
        current_status: DocumentStatus,
        submitted_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            DocumentStatus::Draft => Ok(WorkflowAction::Submit {
                new_status: DocumentStatus::Pending,
                submitted_by,
                submitted_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Pending,
            }),
        }
    }

    /// Approve a pending document.
    ///
    /// The approver must differ from the submitter. On success the caller
    /// applies the document's ledger deltas atomically with the status
    /// change; a repeated approve lands here with status Approved and
    /// fails, so the ledger effect cannot run twice.
    ///
    /// # Errors
    ///
    /// * `InvalidTransition` unless the document is in Pending status
    /// * `SelfApproval` if the approver submitted the document
    pub fn approve(
        current_status: DocumentStatus,
        approved_by: UserId,
        submitted_by: UserId,
        approval_notes: Option<String>,
    ) -> Result<WorkflowAction, WorkflowError> {
        if approved_by == submitted_by {
            return Err(WorkflowError::SelfApproval {
                user_id: approved_by,
            });
        }

        match current_status {
            DocumentStatus::Pending => Ok(WorkflowAction::Approve {
                new_status: DocumentStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
                approval_notes,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Approved,
            }),
        }
    }

    /// Reject a pending document back to its author.
    ///
    /// # Errors
    ///
    /// * `InvalidTransition` unless the document is in Pending status
    /// * `RejectionReasonRequired` if the reason is empty
    pub fn reject(
        current_status: DocumentStatus,
        rejected_by: UserId,
        rejection_reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if rejection_reason.trim().is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }

        match current_status {
            DocumentStatus::Pending => Ok(WorkflowAction::Reject {
                new_status: DocumentStatus::Rejected,
                rejected_by,
                rejected_at: Utc::now(),
                rejection_reason,
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Rejected,
            }),
        }
    }

    /// Resubmit a rejected document for another round of approval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the document is in Rejected status.
    pub fn resubmit(
        current_status: DocumentStatus,
        resubmitted_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            DocumentStatus::Rejected => Ok(WorkflowAction::Resubmit {
                new_status: DocumentStatus::Pending,
                resubmitted_by,
                resubmitted_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Pending,
            }),
        }
    }

    /// Post an approved document, sealing it.
    ///
    /// Posting changes no ledger figure; the effect was applied at
    /// approval time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the document is in Approved status.
    pub fn post(
        current_status: DocumentStatus,
        posted_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            DocumentStatus::Approved => Ok(WorkflowAction::Post {
                new_status: DocumentStatus::Posted,
                posted_by,
                posted_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Posted,
            }),
        }
    }

    /// Cancel a document that has not been approved yet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the document is in Pending or
    /// Rejected status.
    pub fn cancel(
        current_status: DocumentStatus,
        cancelled_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            DocumentStatus::Pending | DocumentStatus::Rejected => Ok(WorkflowAction::Cancel {
                new_status: DocumentStatus::Cancelled,
                cancelled_by,
                cancelled_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Cancelled,
            }),
        }
    }

    /// Validate that editing is allowed in the current status.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable` unless the document is Pending or Rejected.
    pub fn ensure_editable(current_status: DocumentStatus) -> Result<(), WorkflowError> {
        if current_status.is_editable() {
            Ok(())
        } else {
            Err(WorkflowError::NotEditable(current_status))
        }
    }

    /// Returns true when the transition between the two statuses is valid.
    #[must_use]
    pub fn is_valid_transition(from: DocumentStatus, to: DocumentStatus) -> bool {
        matches!(
            (from, to),
            (DocumentStatus::Draft, DocumentStatus::Pending)
                | (DocumentStatus::Pending, DocumentStatus::Approved)
                | (DocumentStatus::Pending, DocumentStatus::Rejected)
                | (DocumentStatus::Rejected, DocumentStatus::Pending)
                | (DocumentStatus::Approved, DocumentStatus::Posted)
                | (DocumentStatus::Pending, DocumentStatus::Cancelled)
                | (DocumentStatus::Rejected, DocumentStatus::Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> (UserId, UserId) {
        (UserId::new(), UserId::new())
    }

    #[test]
    fn test_submit_from_draft() {
        let (author, _) = users();
        let action = WorkflowService::submit(DocumentStatus::Draft, author).unwrap();
        assert_eq!(action.new_status(), DocumentStatus::Pending);
    }

    #[test]
    fn test_submit_from_pending_fails() {
        let (author, _) = users();
        let result = WorkflowService::submit(DocumentStatus::Pending, author);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidTransition {
                from: DocumentStatus::Pending,
                to: DocumentStatus::Pending,
            })
        ));
    }

    #[test]
    fn test_approve_pending() {
        let (author, approver) = users();
        let action = WorkflowService::approve(
            DocumentStatus::Pending,
            approver,
            author,
            Some("looks right".to_string()),
        )
        .unwrap();
        assert_eq!(action.new_status(), DocumentStatus::Approved);
    }

    #[test]
    fn test_approve_twice_fails() {
        let (author, approver) = users();
        let result = WorkflowService::approve(DocumentStatus::Approved, approver, author, None);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidTransition {
                from: DocumentStatus::Approved,
                ..
            })
        ));
    }

    #[test]
    fn test_self_approval_rejected() {
        let (author, _) = users();
        let result = WorkflowService::approve(DocumentStatus::Pending, author, author, None);
        assert!(matches!(result, Err(WorkflowError::SelfApproval { .. })));
    }

    #[test]
    fn test_reject_requires_reason() {
        let (_, reviewer) = users();
        let result =
            WorkflowService::reject(DocumentStatus::Pending, reviewer, "   ".to_string());
        assert!(matches!(result, Err(WorkflowError::RejectionReasonRequired)));
    }

    #[test]
    fn test_reject_then_resubmit() {
        let (author, reviewer) = users();
        let action = WorkflowService::reject(
            DocumentStatus::Pending,
            reviewer,
            "wrong account".to_string(),
        )
        .unwrap();
        assert_eq!(action.new_status(), DocumentStatus::Rejected);

        let action = WorkflowService::resubmit(DocumentStatus::Rejected, author).unwrap();
        assert_eq!(action.new_status(), DocumentStatus::Pending);
    }

    #[test]
    fn test_post_requires_approved() {
        let (_, poster) = users();
        let action = WorkflowService::post(DocumentStatus::Approved, poster).unwrap();
        assert_eq!(action.new_status(), DocumentStatus::Posted);

        assert!(WorkflowService::post(DocumentStatus::Pending, poster).is_err());
        assert!(WorkflowService::post(DocumentStatus::Posted, poster).is_err());
    }

    #[test]
    fn test_cancel_from_pending_and_rejected() {
        let (author, _) = users();
        assert!(WorkflowService::cancel(DocumentStatus::Pending, author).is_ok());
        assert!(WorkflowService::cancel(DocumentStatus::Rejected, author).is_ok());
        assert!(WorkflowService::cancel(DocumentStatus::Approved, author).is_err());
        assert!(WorkflowService::cancel(DocumentStatus::Posted, author).is_err());
    }

    #[test]
    fn test_ensure_editable() {
        assert!(WorkflowService::ensure_editable(DocumentStatus::Pending).is_ok());
        assert!(WorkflowService::ensure_editable(DocumentStatus::Rejected).is_ok());
        assert!(matches!(
            WorkflowService::ensure_editable(DocumentStatus::Posted),
            Err(WorkflowError::NotEditable(DocumentStatus::Posted))
        ));
    }
}
