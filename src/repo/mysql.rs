use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{Debit, LeaveFilter, LeavePage, LeaveRepository};
use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{CreateLeave, LeaveRequest, LeaveStatus, LeaveType};
use crate::workflow::balance::ensure_covers;

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, leave_type, start_date, end_date, reason, status,
    rejection_reason, approved_by_manager, manager_approved_at,
    approved_by_hr, hr_approved_at, rejected_by, rejected_at,
    cancelled_at, created_at, updated_at
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    rejection_reason: Option<String>,
    approved_by_manager: Option<u64>,
    manager_approved_at: Option<DateTime<Utc>>,
    approved_by_hr: Option<u64>,
    hr_approved_at: Option<DateTime<Utc>>,
    rejected_by: Option<u64>,
    rejected_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let leave_type = row.leave_type.parse::<LeaveType>().map_err(|_| {
            LeaveError::Internal(format!("unknown leave_type '{}' on row {}", row.leave_type, row.id))
        })?;
        let status = row.status.parse::<LeaveStatus>().map_err(|_| {
            LeaveError::Internal(format!("unknown status '{}' on row {}", row.status, row.id))
        })?;
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status,
            rejection_reason: row.rejection_reason,
            approved_by_manager: row.approved_by_manager,
            manager_approved_at: row.manager_approved_at,
            approved_by_hr: row.approved_by_hr,
            hr_approved_at: row.hr_approved_at,
            rejected_by: row.rejected_by,
            rejected_at: row.rejected_at,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

/// `WHERE` clause and its bind values for a filter.
fn where_clause(filter: &LeaveFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(emp_id) = filter.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(emp_id) = filter.exclude_employee_id {
        where_sql.push_str(" AND employee_id <> ?");
        args.push(FilterValue::U64(emp_id));
    }

    if !filter.statuses.is_empty() {
        let marks = vec!["?"; filter.statuses.len()].join(", ");
        where_sql.push_str(&format!(" AND status IN ({})", marks));
        args.extend(filter.statuses.iter().map(|s| FilterValue::Str(s.to_string())));
    }

    (where_sql, args)
}

fn balance_column(leave_type: LeaveType) -> Option<&'static str> {
    match leave_type {
        LeaveType::Paid => Some("paid_leave_balance"),
        LeaveType::Sick => Some("sick_leave_balance"),
        LeaveType::Unpaid => None,
    }
}

pub struct MySqlLeaveRepository {
    pool: MySqlPool,
}

impl MySqlLeaveRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveRepository for MySqlLeaveRepository {
    async fn insert(
        &self,
        employee_id: u64,
        draft: &CreateLeave,
        at: DateTime<Utc>,
    ) -> LeaveResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, reason, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(draft.leave_type.to_string())
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.reason.trim())
        .bind(at)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to create leave request");
            LeaveError::from(e)
        })?;

        let id = result.last_insert_id();
        self.find(id)
            .await?
            .ok_or_else(|| LeaveError::Internal(format!("leave request {} vanished after insert", id)))
    }

    async fn find(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, leave_id = id, "Failed to fetch leave request");
                LeaveError::from(e)
            })?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn list(&self, filter: &LeaveFilter) -> LeaveResult<LeavePage> {
        let (where_sql, args) = where_clause(filter);

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to count leave requests");
            LeaveError::from(e)
        })?;

        let data_sql = format!(
            "SELECT {} FROM leave_requests{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            LEAVE_COLUMNS, where_sql
        );
        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in &args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(*v),
                FilterValue::Str(s) => data_q.bind(s.as_str()),
            };
        }
        let rows = data_q
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch leave list");
                LeaveError::from(e)
            })?;

        let data = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<LeaveResult<Vec<_>>>()?;
        Ok(LeavePage { data, total })
    }

    async fn replace(
        &self,
        expected: LeaveStatus,
        next: &LeaveRequest,
        debit: Option<Debit>,
    ) -> LeaveResult<bool> {
        let mut tx = self.pool.begin().await?;

        let debit = debit.and_then(|d| balance_column(d.leave_type).map(|column| (d, column)));
        if let Some((debit, _)) = &debit {
            let balance = sqlx::query_as::<_, LeaveBalance>(
                r#"
                SELECT id AS employee_id, paid_leave_balance, sick_leave_balance
                FROM employees
                WHERE id = ?
                FOR UPDATE
                "#,
            )
            .bind(debit.employee_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                LeaveError::Validation(format!(
                    "no leave balance on record for employee {}",
                    debit.employee_id
                ))
            })?;
            ensure_covers(&balance, debit.leave_type, debit.days)?;
        }

        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?,
                rejection_reason = ?,
                approved_by_manager = ?,
                manager_approved_at = ?,
                approved_by_hr = ?,
                hr_approved_at = ?,
                rejected_by = ?,
                rejected_at = ?,
                cancelled_at = ?,
                updated_at = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(next.status.to_string())
        .bind(next.rejection_reason.as_deref())
        .bind(next.approved_by_manager)
        .bind(next.manager_approved_at)
        .bind(next.approved_by_hr)
        .bind(next.hr_approved_at)
        .bind(next.rejected_by)
        .bind(next.rejected_at)
        .bind(next.cancelled_at)
        .bind(next.updated_at)
        .bind(next.id)
        .bind(expected.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id = next.id, "Leave transition update failed");
            LeaveError::from(e)
        })?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Some((debit, column)) = debit {
            let sql = format!("UPDATE employees SET {column} = {column} - ? WHERE id = ?");
            sqlx::query(&sql)
                .bind(debit.days)
                .bind(debit.employee_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, employee_id = debit.employee_id, "Leave balance debit failed");
                    LeaveError::from(e)
                })?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn balance(&self, employee_id: u64) -> LeaveResult<Option<LeaveBalance>> {
        sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT id AS employee_id, paid_leave_balance, sick_leave_balance
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch leave balance");
            LeaveError::from(e)
        })
    }
}
