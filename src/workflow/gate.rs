//! Table-driven permission gate for leave request transitions.
//!
//! The gate only decides which affordances to offer. The server runs the
//! same table through [`super::apply`] and that check is the one that counts.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::Actor;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Role;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Approve,
    Reject,
    Cancel,
}

/// Who may fire a transition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Authority {
    /// manager, admin or director
    Manager,
    /// hr, admin or director
    Hr,
    /// the employee who submitted the request
    Owner,
}

impl Authority {
    /// Role-level check. `Owner` accepts every role; ownership is per record.
    pub fn permits(self, role: Role) -> bool {
        match self {
            Authority::Manager => matches!(role, Role::Manager | Role::Admin | Role::Director),
            Authority::Hr => matches!(role, Role::Hr | Role::Admin | Role::Director),
            Authority::Owner => true,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Authority::Manager => "manager, admin or director",
            Authority::Hr => "hr, admin or director",
            Authority::Owner => "the requesting employee",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Rule {
    pub from: LeaveStatus,
    pub action: ActionKind,
    pub to: LeaveStatus,
    pub authority: Authority,
}

pub const RULES: [Rule; 6] = [
    Rule {
        from: LeaveStatus::Pending,
        action: ActionKind::Approve,
        to: LeaveStatus::ManagerApproved,
        authority: Authority::Manager,
    },
    Rule {
        from: LeaveStatus::Pending,
        action: ActionKind::Reject,
        to: LeaveStatus::Rejected,
        authority: Authority::Manager,
    },
    Rule {
        from: LeaveStatus::ManagerApproved,
        action: ActionKind::Approve,
        to: LeaveStatus::Approved,
        authority: Authority::Hr,
    },
    Rule {
        from: LeaveStatus::ManagerApproved,
        action: ActionKind::Reject,
        to: LeaveStatus::Rejected,
        authority: Authority::Hr,
    },
    Rule {
        from: LeaveStatus::Pending,
        action: ActionKind::Cancel,
        to: LeaveStatus::Cancelled,
        authority: Authority::Owner,
    },
    Rule {
        from: LeaveStatus::ManagerApproved,
        action: ActionKind::Cancel,
        to: LeaveStatus::Cancelled,
        authority: Authority::Owner,
    },
];

pub fn rule_for(from: LeaveStatus, action: ActionKind) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.from == from && r.action == action)
}

/// Whether `role` may fire `action` on a request currently in `from`.
pub fn can_transition(role: Role, from: LeaveStatus, action: ActionKind) -> bool {
    rule_for(from, action).is_some_and(|rule| rule.authority.permits(role))
}

/// [`can_transition`] plus the per-record checks: cancel belongs to the
/// owner, approvals never to the owner.
pub fn can_transition_record(actor: &Actor, record: &LeaveRequest, action: ActionKind) -> bool {
    let Some(rule) = rule_for(record.status, action) else {
        return false;
    };
    let owns = actor.employee_id == record.employee_id;
    match rule.authority {
        Authority::Owner => owns,
        authority => !owns && authority.permits(actor.role),
    }
}

pub fn available_actions(actor: &Actor, record: &LeaveRequest) -> Vec<ActionKind> {
    [ActionKind::Approve, ActionKind::Reject, ActionKind::Cancel]
        .into_iter()
        .filter(|action| can_transition_record(actor, record, *action))
        .collect()
}

/// Statuses that wait on a stage `role` holds authority for.
pub fn awaiting_statuses(role: Role) -> Vec<LeaveStatus> {
    let mut statuses: Vec<LeaveStatus> = RULES
        .iter()
        .filter(|r| r.action == ActionKind::Approve && r.authority.permits(role))
        .map(|r| r.from)
        .collect();
    statuses.dedup();
    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn terminal_statuses_allow_nothing() {
        for role in Role::iter() {
            for action in ActionKind::iter() {
                for from in [LeaveStatus::Approved, LeaveStatus::Rejected, LeaveStatus::Cancelled] {
                    assert!(!can_transition(role, from, action), "{role} {action} from {from}");
                }
            }
        }
    }

    #[test]
    fn manager_stage_belongs_to_manager_equivalents() {
        assert!(can_transition(Role::Manager, LeaveStatus::Pending, ActionKind::Approve));
        assert!(can_transition(Role::Admin, LeaveStatus::Pending, ActionKind::Reject));
        assert!(can_transition(Role::Director, LeaveStatus::Pending, ActionKind::Approve));
        assert!(!can_transition(Role::Hr, LeaveStatus::Pending, ActionKind::Approve));
        assert!(!can_transition(Role::Employee, LeaveStatus::Pending, ActionKind::Reject));
    }

    #[test]
    fn hr_stage_belongs_to_hr_equivalents() {
        assert!(can_transition(Role::Hr, LeaveStatus::ManagerApproved, ActionKind::Approve));
        assert!(can_transition(Role::Admin, LeaveStatus::ManagerApproved, ActionKind::Reject));
        assert!(can_transition(Role::Director, LeaveStatus::ManagerApproved, ActionKind::Approve));
        assert!(!can_transition(Role::Manager, LeaveStatus::ManagerApproved, ActionKind::Approve));
        assert!(!can_transition(Role::Employee, LeaveStatus::ManagerApproved, ActionKind::Approve));
    }

    #[test]
    fn cancel_is_open_to_every_role_before_a_final_decision() {
        for role in Role::iter() {
            assert!(can_transition(role, LeaveStatus::Pending, ActionKind::Cancel));
            assert!(can_transition(role, LeaveStatus::ManagerApproved, ActionKind::Cancel));
        }
    }

    #[test]
    fn awaiting_statuses_follow_the_table() {
        assert_eq!(awaiting_statuses(Role::Manager), vec![LeaveStatus::Pending]);
        assert_eq!(awaiting_statuses(Role::Hr), vec![LeaveStatus::ManagerApproved]);
        assert_eq!(
            awaiting_statuses(Role::Admin),
            vec![LeaveStatus::Pending, LeaveStatus::ManagerApproved]
        );
        assert!(awaiting_statuses(Role::Employee).is_empty());
    }
}
