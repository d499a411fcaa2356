use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Debit, LeaveFilter, LeavePage, LeaveRepository};
use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{CreateLeave, LeaveRequest, LeaveStatus};
use crate::workflow::balance::ensure_covers;

#[derive(Default)]
struct State {
    last_id: u64,
    requests: BTreeMap<u64, LeaveRequest>,
    balances: HashMap<u64, LeaveBalance>,
}

/// Process-local repository, used for tests and single-node demos.
#[derive(Default)]
pub struct InMemoryLeaveRepository {
    state: Mutex<State>,
}

impl InMemoryLeaveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances(balances: impl IntoIterator<Item = LeaveBalance>) -> Self {
        let repo = Self::new();
        {
            let mut state = repo.lock();
            for balance in balances {
                state.balances.insert(balance.employee_id, balance);
            }
        }
        repo
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LeaveRepository for InMemoryLeaveRepository {
    async fn insert(
        &self,
        employee_id: u64,
        draft: &CreateLeave,
        at: DateTime<Utc>,
    ) -> LeaveResult<LeaveRequest> {
        let mut state = self.lock();
        state.last_id += 1;
        let request = LeaveRequest {
            id: state.last_id,
            employee_id,
            leave_type: draft.leave_type,
            start_date: draft.start_date,
            end_date: draft.end_date,
            reason: draft.reason.trim().to_string(),
            status: LeaveStatus::Pending,
            rejection_reason: None,
            approved_by_manager: None,
            manager_approved_at: None,
            approved_by_hr: None,
            hr_approved_at: None,
            rejected_by: None,
            rejected_at: None,
            cancelled_at: None,
            created_at: at,
            updated_at: at,
        };
        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        Ok(self.lock().requests.get(&id).cloned())
    }

    async fn list(&self, filter: &LeaveFilter) -> LeaveResult<LeavePage> {
        let state = self.lock();
        let mut matching: Vec<&LeaveRequest> =
            state.requests.values().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let data = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok(LeavePage { data, total })
    }

    async fn replace(
        &self,
        expected: LeaveStatus,
        next: &LeaveRequest,
        debit: Option<Debit>,
    ) -> LeaveResult<bool> {
        let mut state = self.lock();
        match state.requests.get(&next.id) {
            Some(current) if current.status == expected => {}
            Some(_) => return Ok(false),
            None => return Err(LeaveError::NotFound(format!("leave request {}", next.id))),
        }

        let debited = match debit {
            Some(debit) => {
                let balance = state.balances.get(&debit.employee_id).ok_or_else(|| {
                    LeaveError::Validation(format!(
                        "no leave balance on record for employee {}",
                        debit.employee_id
                    ))
                })?;
                ensure_covers(balance, debit.leave_type, debit.days)?;
                Some(balance.debited(debit.leave_type, debit.days))
            }
            None => None,
        };

        if let Some(balance) = debited {
            state.balances.insert(balance.employee_id, balance);
        }
        state.requests.insert(next.id, next.clone());
        Ok(true)
    }

    async fn balance(&self, employee_id: u64) -> LeaveResult<Option<LeaveBalance>> {
        Ok(self.lock().balances.get(&employee_id).cloned())
    }
}
