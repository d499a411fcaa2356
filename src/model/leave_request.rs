use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::error::{LeaveError, LeaveResult};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Paid,
    Sick,
    Unpaid,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    ManagerApproved,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled
        )
    }
}

/// Inclusive number of calendar days between two dates, zero when reversed.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }
    (end - start).num_days() + 1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    /// employee who owns the request
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2025-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-06-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Flu")]
    pub reason: String,
    #[schema(example = "pending")]
    pub status: LeaveStatus,
    pub rejection_reason: Option<String>,
    pub approved_by_manager: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub manager_approved_at: Option<DateTime<Utc>>,
    pub approved_by_hr: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub hr_approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[schema(example = "2025-05-20T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2025-05-20T09:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn duration_days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }
}

/// Leave request payload submitted by an employee.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2025-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-06-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Flu")]
    pub reason: String,
}

impl CreateLeave {
    pub fn validate(&self) -> LeaveResult<()> {
        if self.end_date < self.start_date {
            return Err(LeaveError::Validation(
                "end_date cannot be before start_date".into(),
            ));
        }
        if self.reason.trim().is_empty() {
            return Err(LeaveError::Validation("reason is required".into()));
        }
        Ok(())
    }

    pub fn duration_days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }
}

/// Body of the two reject endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RejectLeave {
    #[serde(default)]
    #[schema(example = "insufficient coverage")]
    pub reason: String,
}

/// A leave request as returned by the API, with its derived duration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveResponse {
    #[serde(flatten)]
    pub request: LeaveRequest,
    #[schema(example = 3)]
    pub duration_days: i64,
}

impl From<LeaveRequest> for LeaveResponse {
    fn from(request: LeaveRequest) -> Self {
        let duration_days = request.duration_days();
        Self {
            request,
            duration_days,
        }
    }
}

/// Which slice of leave requests a listing returns.
#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// requests submitted by the caller
    #[default]
    Mine,
    /// requests waiting on a stage the caller may decide, excluding their own
    PendingApproval,
    /// every request; hr, admin and director only
    All,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveQuery {
    #[schema(example = "pending_approval")]
    /// Listing scope, defaults to `mine`
    pub scope: Option<Scope>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}
