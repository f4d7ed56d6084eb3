//! Property-based tests for WorkflowService.
//!
//! Validates that the state machine admits exactly the documented
//! transitions and nothing else, for randomized statuses and users.

use proptest::prelude::*;

use fiscus_shared::types::UserId;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::DocumentStatus;

/// Strategy for generating random DocumentStatus values.
fn arb_status() -> impl Strategy<Value = DocumentStatus> {
    prop_oneof![
        Just(DocumentStatus::Draft),
        Just(DocumentStatus::Pending),
        Just(DocumentStatus::Approved),
        Just(DocumentStatus::Rejected),
        Just(DocumentStatus::Posted),
        Just(DocumentStatus::Cancelled),
    ]
}

/// Strategy for generating random user IDs.
fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|v| UserId::from(Uuid::from_u128(v)))
}

/// Strategy for generating non-empty rejection reasons.
fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1}[a-zA-Z0-9 ]{0,99}".prop_map(|s| s.trim().to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* status other than Draft, submit SHALL fail.
    #[test]
    fn prop_submit_only_from_draft(status in arb_status(), user in arb_user()) {
        let result = WorkflowService::submit(status, user);
        prop_assert_eq!(result.is_ok(), status == DocumentStatus::Draft);
    }

    /// *For any* status other than Pending, approve SHALL fail, so a
    /// second approval of the same document is always rejected.
    #[test]
    fn prop_approve_only_from_pending(
        status in arb_status(),
        approver in arb_user(),
        author in arb_user(),
    ) {
        prop_assume!(approver != author);
        let result = WorkflowService::approve(status, approver, author, None);
        prop_assert_eq!(result.is_ok(), status == DocumentStatus::Pending);
    }

    /// *For any* status, self-approval SHALL fail before the transition
    /// is even considered.
    #[test]
    fn prop_self_approval_always_fails(status in arb_status(), user in arb_user()) {
        let result = WorkflowService::approve(status, user, user, None);
        prop_assert!(
            matches!(result, Err(WorkflowError::SelfApproval { .. })),
            "expected Err(WorkflowError::SelfApproval), got {:?}",
            result
        );
    }

    /// *For any* non-empty reason, reject succeeds exactly from Pending.
    #[test]
    fn prop_reject_only_from_pending(
        status in arb_status(),
        reviewer in arb_user(),
        reason in arb_reason(),
    ) {
        let result = WorkflowService::reject(status, reviewer, reason);
        prop_assert_eq!(result.is_ok(), status == DocumentStatus::Pending);
    }

    /// *For any* status, resubmit succeeds exactly from Rejected.
    #[test]
    fn prop_resubmit_only_from_rejected(status in arb_status(), user in arb_user()) {
        let result = WorkflowService::resubmit(status, user);
        prop_assert_eq!(result.is_ok(), status == DocumentStatus::Rejected);
    }

    /// *For any* status, post succeeds exactly from Approved.
    #[test]
    fn prop_post_only_from_approved(status in arb_status(), user in arb_user()) {
        let result = WorkflowService::post(status, user);
        prop_assert_eq!(result.is_ok(), status == DocumentStatus::Approved);
    }

    /// *For any* status, cancel succeeds exactly from Pending or Rejected.
    #[test]
    fn prop_cancel_only_before_approval(status in arb_status(), user in arb_user()) {
        let result = WorkflowService::cancel(status, user);
        let expected = matches!(status, DocumentStatus::Pending | DocumentStatus::Rejected);
        prop_assert_eq!(result.is_ok(), expected);
    }

    /// *For any* pair of statuses, a successful service call implies the
    /// transition table agrees, and vice versa for the covered actions.
    #[test]
    fn prop_transition_table_matches_services(
        from in arb_status(),
        user in arb_user(),
        other in arb_user(),
    ) {
        prop_assume!(user != other);

        let submit_ok = WorkflowService::submit(from, user).is_ok();
        prop_assert_eq!(
            submit_ok,
            WorkflowService::is_valid_transition(from, DocumentStatus::Pending)
                && from == DocumentStatus::Draft
        );

        let approve_ok = WorkflowService::approve(from, user, other, None).is_ok();
        prop_assert_eq!(
            approve_ok,
            WorkflowService::is_valid_transition(from, DocumentStatus::Approved)
        );

        let post_ok = WorkflowService::post(from, user).is_ok();
        prop_assert_eq!(
            post_ok,
            WorkflowService::is_valid_transition(from, DocumentStatus::Posted)
        );

        let cancel_ok = WorkflowService::cancel(from, user).is_ok();
        prop_assert_eq!(
            cancel_ok,
            WorkflowService::is_valid_transition(from, DocumentStatus::Cancelled)
        );
    }
}
