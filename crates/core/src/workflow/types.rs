//! Workflow domain types for the document lifecycle.
//!
//! Every budget document moves through the same approval state machine,
//! regardless of its kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use fiscus_shared::types::UserId;

/// Document status in the approval workflow.
///
/// Documents progress through these states from creation to posting.
/// The valid transitions are:
/// - Draft → Pending (submit)
/// - Pending → Approved (approve, runs the ledger engine)
/// - Pending → Rejected (reject)
/// - Rejected → Pending (resubmit)
/// - Approved → Posted (post)
/// - Pending/Rejected → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Document is being drafted and has not entered the workflow.
    Draft,
    /// Document is awaiting approval.
    Pending,
    /// Document has been approved and its ledger effect applied.
    Approved,
    /// Document was rejected and returned to its author.
    Rejected,
    /// Document has been posted (terminal, immutable).
    Posted,
    /// Document was cancelled before approval (terminal).
    Cancelled,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Posted => "posted",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "posted" => Some(Self::Posted),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the document's amounts and line items can be edited.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Pending | Self::Rejected)
    }

    /// Returns true if the document can no longer change at all.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Posted | Self::Cancelled)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow action representing a state transition with audit data.
///
/// Each variant captures the action performed, the resulting status,
/// and the audit trail information (who, when, why).
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Submit a draft document for approval.
    Submit {
        /// The new status after submission.
        new_status: DocumentStatus,
        /// The user who submitted the document.
        submitted_by: UserId,
        /// When the document was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Approve a pending document and apply its ledger effect.
    Approve {
        /// The new status after approval.
        new_status: DocumentStatus,
        /// The user who approved the document.
        approved_by: UserId,
        /// When the document was approved.
        approved_at: DateTime<Utc>,
        /// Optional notes from the approver.
        approval_notes: Option<String>,
    },
    /// Reject a pending document back to its author.
    Reject {
        /// The new status after rejection.
        new_status: DocumentStatus,
        /// The user who rejected the document.
        rejected_by: UserId,
        /// When the document was rejected.
        rejected_at: DateTime<Utc>,
        /// The reason for rejection.
        rejection_reason: String,
    },
    /// Resubmit a rejected document for another round of approval.
    Resubmit {
        /// The new status after resubmission.
        new_status: DocumentStatus,
        /// The user who resubmitted the document.
        resubmitted_by: UserId,
        /// When the document was resubmitted.
        resubmitted_at: DateTime<Utc>,
    },
    /// Post an approved document, sealing it.
    Post {
        /// The new status after posting.
        new_status: DocumentStatus,
        /// The user who posted the document.
        posted_by: UserId,
        /// When the document was posted.
        posted_at: DateTime<Utc>,
    },
    /// Cancel a document before approval.
    Cancel {
        /// The new status after cancellation.
        new_status: DocumentStatus,
        /// The user who cancelled the document.
        cancelled_by: UserId,
        /// When the document was cancelled.
        cancelled_at: DateTime<Utc>,
    },
}

impl WorkflowAction {
    /// Returns the status the document moves to under this action.
    #[must_use]
    pub const fn new_status(&self) -> DocumentStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Resubmit { new_status, .. }
            | Self::Post { new_status, .. }
            | Self::Cancel { new_status, .. } => *new_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            DocumentStatus::Draft,
            DocumentStatus::Pending,
            DocumentStatus::Approved,
            DocumentStatus::Rejected,
            DocumentStatus::Posted,
            DocumentStatus::Cancelled,
        ] {
            assert_eq!(DocumentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(DocumentStatus::parse("unknown"), None);
    }

    #[test]
    fn test_editable_statuses() {
        assert!(DocumentStatus::Pending.is_editable());
        assert!(DocumentStatus::Rejected.is_editable());
        assert!(!DocumentStatus::Approved.is_editable());
        assert!(!DocumentStatus::Posted.is_editable());
        assert!(!DocumentStatus::Cancelled.is_editable());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(DocumentStatus::Posted.is_terminal());
        assert!(DocumentStatus::Cancelled.is_terminal());
        assert!(!DocumentStatus::Approved.is_terminal());
    }
}
