use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::leave_request::LeaveType;

/// Remaining leave days held on the employee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 1000,
        "paid_leave_balance": 12.0,
        "sick_leave_balance": 5.5
    })
)]
pub struct LeaveBalance {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 12.0)]
    pub paid_leave_balance: f64,
    #[schema(example = 5.5)]
    pub sick_leave_balance: f64,
}

impl LeaveBalance {
    /// Days available for a leave type; `None` means the type is not metered.
    pub fn available(&self, leave_type: LeaveType) -> Option<f64> {
        match leave_type {
            LeaveType::Paid => Some(self.paid_leave_balance),
            LeaveType::Sick => Some(self.sick_leave_balance),
            LeaveType::Unpaid => None,
        }
    }

    /// Returns a copy with `days` taken off the matching balance.
    pub fn debited(&self, leave_type: LeaveType, days: f64) -> Self {
        let mut next = self.clone();
        match leave_type {
            LeaveType::Paid => next.paid_leave_balance -= days,
            LeaveType::Sick => next.sick_leave_balance -= days,
            LeaveType::Unpaid => {}
        }
        next
    }
}
