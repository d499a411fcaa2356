//! Leave request lifecycle.
//!
//! ```text
//! pending --approve(manager)--> manager_approved --approve(hr)--> approved
//!    |                               |
//!    +--reject(manager)--> rejected <+--reject(hr)
//!    |                               |
//!    +--cancel(owner)--> cancelled <-+--cancel(owner)
//! ```

pub mod balance;
pub mod gate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{LeaveError, LeaveResult};
use crate::model::leave_request::LeaveRequest;
use crate::model::role::Role;
use gate::{ActionKind, Authority};

/// The authenticated party firing a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub employee_id: u64,
    pub role: Role,
}

/// Approval stage an approve/reject is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Manager,
    Hr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveAction {
    Approve(Stage),
    Reject { stage: Stage, reason: String },
    Cancel,
}

impl LeaveAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            LeaveAction::Approve(_) => ActionKind::Approve,
            LeaveAction::Reject { .. } => ActionKind::Reject,
            LeaveAction::Cancel => ActionKind::Cancel,
        }
    }

    pub fn authority(&self) -> Authority {
        match self {
            LeaveAction::Approve(stage) | LeaveAction::Reject { stage, .. } => match stage {
                Stage::Manager => Authority::Manager,
                Stage::Hr => Authority::Hr,
            },
            LeaveAction::Cancel => Authority::Owner,
        }
    }
}

/// Applies `action` to `record` and returns the replacement record.
///
/// Checks run in a fixed order: authority, then input, then the transition
/// table. On any error `record` is left as it was and nothing is returned
/// to persist.
pub fn apply(
    record: &LeaveRequest,
    actor: &Actor,
    action: &LeaveAction,
    at: DateTime<Utc>,
) -> LeaveResult<LeaveRequest> {
    let authority = action.authority();
    let owns = actor.employee_id == record.employee_id;
    match authority {
        Authority::Owner if !owns => {
            return Err(LeaveError::Authorization(
                "only the requesting employee can cancel a leave request".into(),
            ));
        }
        Authority::Owner => {}
        _ if !authority.permits(actor.role) => {
            return Err(LeaveError::Authorization(format!(
                "this action requires {}",
                authority.describe()
            )));
        }
        _ if owns => {
            return Err(LeaveError::Authorization(
                "approvers cannot decide on their own leave requests".into(),
            ));
        }
        _ => {}
    }

    if let LeaveAction::Reject { reason, .. } = action {
        if reason.trim().is_empty() {
            return Err(LeaveError::Validation("a rejection reason is required".into()));
        }
    }

    let rule = gate::rule_for(record.status, action.kind())
        .filter(|rule| rule.authority == authority)
        .ok_or_else(|| {
            LeaveError::InvalidState(format!(
                "cannot {} a request that is {}",
                action.kind(),
                record.status
            ))
        })?;

    let mut next = record.clone();
    next.status = rule.to;
    next.updated_at = at;
    match action {
        LeaveAction::Approve(Stage::Manager) => {
            next.approved_by_manager = Some(actor.employee_id);
            next.manager_approved_at = Some(at);
        }
        LeaveAction::Approve(Stage::Hr) => {
            next.approved_by_hr = Some(actor.employee_id);
            next.hr_approved_at = Some(at);
        }
        LeaveAction::Reject { reason, .. } => {
            next.rejection_reason = Some(reason.trim().to_string());
            next.rejected_by = Some(actor.employee_id);
            next.rejected_at = Some(at);
        }
        LeaveAction::Cancel => {
            next.cancelled_at = Some(at);
        }
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{LeaveStatus, LeaveType};
    use chrono::{NaiveDate, TimeZone};

    const OWNER: u64 = 1000;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, hour, 0, 0).unwrap()
    }

    fn request(status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            employee_id: OWNER,
            leave_type: LeaveType::Paid,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            reason: "family trip".into(),
            status,
            rejection_reason: None,
            approved_by_manager: None,
            manager_approved_at: None,
            approved_by_hr: None,
            hr_approved_at: None,
            rejected_by: None,
            rejected_at: None,
            cancelled_at: None,
            created_at: ts(8),
            updated_at: ts(8),
        }
    }

    fn actor(employee_id: u64, role: Role) -> Actor {
        Actor { employee_id, role }
    }

    fn reject(stage: Stage, reason: &str) -> LeaveAction {
        LeaveAction::Reject {
            stage,
            reason: reason.into(),
        }
    }

    #[test]
    fn manager_approval_moves_to_manager_approved() {
        let manager = actor(2000, Role::Manager);
        let next = apply(
            &request(LeaveStatus::Pending),
            &manager,
            &LeaveAction::Approve(Stage::Manager),
            ts(9),
        )
        .unwrap();
        assert_eq!(next.status, LeaveStatus::ManagerApproved);
        assert_eq!(next.approved_by_manager, Some(2000));
        assert_eq!(next.manager_approved_at, Some(ts(9)));
        assert_eq!(next.approved_by_hr, None);
        assert_eq!(next.updated_at, ts(9));
    }

    #[test]
    fn hr_rejection_records_reason() {
        let hr = actor(3000, Role::Hr);
        let next = apply(
            &request(LeaveStatus::ManagerApproved),
            &hr,
            &reject(Stage::Hr, "insufficient coverage"),
            ts(10),
        )
        .unwrap();
        assert_eq!(next.status, LeaveStatus::Rejected);
        assert_eq!(next.rejection_reason.as_deref(), Some("insufficient coverage"));
        assert_eq!(next.rejected_by, Some(3000));
        assert_eq!(next.approved_by_hr, None);
    }

    #[test]
    fn hr_approval_finalizes() {
        let hr = actor(3000, Role::Hr);
        let next = apply(
            &request(LeaveStatus::ManagerApproved),
            &hr,
            &LeaveAction::Approve(Stage::Hr),
            ts(10),
        )
        .unwrap();
        assert_eq!(next.status, LeaveStatus::Approved);
        assert_eq!(next.approved_by_hr, Some(3000));
        assert_eq!(next.hr_approved_at, Some(ts(10)));
    }

    #[test]
    fn owner_cannot_cancel_approved_request() {
        let record = request(LeaveStatus::Approved);
        let err = apply(&record, &actor(OWNER, Role::Employee), &LeaveAction::Cancel, ts(11))
            .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidState(_)));
        assert_eq!(record.status, LeaveStatus::Approved);
    }

    #[test]
    fn owner_cancels_before_final_decision() {
        for status in [LeaveStatus::Pending, LeaveStatus::ManagerApproved] {
            let next = apply(
                &request(status),
                &actor(OWNER, Role::Employee),
                &LeaveAction::Cancel,
                ts(11),
            )
            .unwrap();
            assert_eq!(next.status, LeaveStatus::Cancelled);
            assert_eq!(next.cancelled_at, Some(ts(11)));
        }
    }

    #[test]
    fn non_owner_cannot_cancel() {
        let err = apply(
            &request(LeaveStatus::Pending),
            &actor(2000, Role::Manager),
            &LeaveAction::Cancel,
            ts(11),
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::Authorization(_)));
    }

    #[test]
    fn non_manager_cannot_approve_as_manager() {
        for role in [Role::Employee, Role::Hr] {
            let err = apply(
                &request(LeaveStatus::Pending),
                &actor(4000, role),
                &LeaveAction::Approve(Stage::Manager),
                ts(9),
            )
            .unwrap_err();
            assert!(matches!(err, LeaveError::Authorization(_)), "{role}");
        }
    }

    #[test]
    fn approvers_cannot_decide_their_own_request() {
        let err = apply(
            &request(LeaveStatus::Pending),
            &actor(OWNER, Role::Manager),
            &LeaveAction::Approve(Stage::Manager),
            ts(9),
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::Authorization(_)));
    }

    #[test]
    fn reject_requires_reason() {
        for reason in ["", "   "] {
            let err = apply(
                &request(LeaveStatus::Pending),
                &actor(2000, Role::Manager),
                &reject(Stage::Manager, reason),
                ts(9),
            )
            .unwrap_err();
            assert!(matches!(err, LeaveError::Validation(_)));
        }
    }

    #[test]
    fn stage_must_match_current_status() {
        let admin = actor(5000, Role::Admin);
        let err = apply(
            &request(LeaveStatus::Pending),
            &admin,
            &LeaveAction::Approve(Stage::Hr),
            ts(9),
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidState(_)));

        let err = apply(
            &request(LeaveStatus::ManagerApproved),
            &admin,
            &reject(Stage::Manager, "no"),
            ts(9),
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidState(_)));
    }

    #[test]
    fn terminal_records_refuse_every_action() {
        let director = actor(6000, Role::Director);
        for status in [LeaveStatus::Approved, LeaveStatus::Rejected, LeaveStatus::Cancelled] {
            for action in [
                LeaveAction::Approve(Stage::Manager),
                LeaveAction::Approve(Stage::Hr),
                reject(Stage::Manager, "late"),
                reject(Stage::Hr, "late"),
            ] {
                let record = request(status);
                let err = apply(&record, &director, &action, ts(12)).unwrap_err();
                assert!(matches!(err, LeaveError::InvalidState(_)), "{status} {action:?}");
                assert_eq!(record, request(status));
            }
        }
    }

    #[test]
    fn admin_and_director_hold_both_stages() {
        for role in [Role::Admin, Role::Director] {
            let approver = actor(7000, role);
            let mid = apply(
                &request(LeaveStatus::Pending),
                &approver,
                &LeaveAction::Approve(Stage::Manager),
                ts(9),
            )
            .unwrap();
            let done = apply(&mid, &approver, &LeaveAction::Approve(Stage::Hr), ts(10)).unwrap();
            assert_eq!(done.status, LeaveStatus::Approved);
            assert_eq!(done.approved_by_manager, Some(7000));
            assert_eq!(done.approved_by_hr, Some(7000));
        }
    }
}
