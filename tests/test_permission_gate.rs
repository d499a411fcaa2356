use hrm_leave::model::leave_request::LeaveStatus;
use hrm_leave::model::role::Role;
use hrm_leave::workflow::gate::{ActionKind, can_transition};
use strum::IntoEnumIterator;

#[test]
fn test_manager_stage_roles() {
    // pending -> manager_approved / rejected: manager, admin, director
    for role in [Role::Manager, Role::Admin, Role::Director] {
        assert!(can_transition(role, LeaveStatus::Pending, ActionKind::Approve));
        assert!(can_transition(role, LeaveStatus::Pending, ActionKind::Reject));
    }
    for role in [Role::Employee, Role::Hr] {
        assert!(!can_transition(role, LeaveStatus::Pending, ActionKind::Approve));
        assert!(!can_transition(role, LeaveStatus::Pending, ActionKind::Reject));
    }
}

#[test]
fn test_hr_stage_roles() {
    // manager_approved -> approved / rejected: hr, admin, director
    for role in [Role::Hr, Role::Admin, Role::Director] {
        assert!(can_transition(role, LeaveStatus::ManagerApproved, ActionKind::Approve));
        assert!(can_transition(role, LeaveStatus::ManagerApproved, ActionKind::Reject));
    }
    for role in [Role::Employee, Role::Manager] {
        assert!(!can_transition(role, LeaveStatus::ManagerApproved, ActionKind::Approve));
        assert!(!can_transition(role, LeaveStatus::ManagerApproved, ActionKind::Reject));
    }
}

#[test]
fn test_cancel_open_to_any_role_before_final_decision() {
    for role in Role::iter() {
        assert!(can_transition(role, LeaveStatus::Pending, ActionKind::Cancel));
        assert!(can_transition(role, LeaveStatus::ManagerApproved, ActionKind::Cancel));
    }
}

#[test]
fn test_terminal_statuses_allow_nothing() {
    for status in [LeaveStatus::Approved, LeaveStatus::Rejected, LeaveStatus::Cancelled] {
        for role in Role::iter() {
            for action in ActionKind::iter() {
                assert!(
                    !can_transition(role, status, action),
                    "{} may not {} a {} request",
                    role,
                    action,
                    status
                );
            }
        }
    }
}
