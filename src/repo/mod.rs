//! Persistence seam for leave requests and balances.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::LeaveResult;
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{CreateLeave, LeaveRequest, LeaveStatus, LeaveType};

pub use memory::InMemoryLeaveRepository;
pub use mysql::MySqlLeaveRepository;

/// Row selection for [`LeaveRepository::list`]. An empty `statuses` matches any status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub exclude_employee_id: Option<u64>,
    pub statuses: Vec<LeaveStatus>,
    pub limit: u64,
    pub offset: u64,
}

impl LeaveFilter {
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| request.employee_id == id)
            && self.exclude_employee_id.is_none_or(|id| request.employee_id != id)
            && (self.statuses.is_empty() || self.statuses.contains(&request.status))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeavePage {
    pub data: Vec<LeaveRequest>,
    pub total: i64,
}

/// Balance debit applied in the same unit of work as a replace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debit {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub days: f64,
}

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    /// Stores a new `pending` request and returns it with its assigned id.
    async fn insert(
        &self,
        employee_id: u64,
        draft: &CreateLeave,
        at: DateTime<Utc>,
    ) -> LeaveResult<LeaveRequest>;

    async fn find(&self, id: u64) -> LeaveResult<Option<LeaveRequest>>;

    /// Newest first.
    async fn list(&self, filter: &LeaveFilter) -> LeaveResult<LeavePage>;

    /// Replaces the whole record if its stored status still equals `expected`,
    /// applying `debit` in the same step. Returns `false` when the status moved
    /// underneath the caller; a debit the balance cannot cover is a
    /// `Validation` error. Neither outcome changes anything.
    async fn replace(
        &self,
        expected: LeaveStatus,
        next: &LeaveRequest,
        debit: Option<Debit>,
    ) -> LeaveResult<bool>;

    async fn balance(&self, employee_id: u64) -> LeaveResult<Option<LeaveBalance>>;
}
