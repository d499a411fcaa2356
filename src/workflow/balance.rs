use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::LeaveType;

/// Refuses a draft whose duration exceeds the balance on display.
///
/// Advisory only: the figure may be stale, the server decides at final
/// approval.
pub fn check_advisory(balance: &LeaveBalance, leave_type: LeaveType, days: i64) -> LeaveResult<()> {
    ensure_covers(balance, leave_type, days as f64)
}

pub fn ensure_covers(balance: &LeaveBalance, leave_type: LeaveType, days: f64) -> LeaveResult<()> {
    match balance.available(leave_type) {
        Some(available) if available < days => Err(LeaveError::Validation(format!(
            "insufficient {} balance: available {}, required {}",
            leave_type, available, days
        ))),
        _ => Ok(()),
    }
}
