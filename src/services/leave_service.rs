use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{
    CreateLeave, LeaveQuery, LeaveRequest, LeaveStatus, LeaveType, Scope,
};
use crate::repo::{Debit, LeaveFilter, LeavePage, LeaveRepository};
use crate::workflow::gate::{Authority, awaiting_statuses};
use crate::workflow::{self, Actor, LeaveAction, Stage};

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

/// One page of a listing plus the paging that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedPage {
    pub page: LeavePage,
    pub page_no: u64,
    pub per_page: u64,
}

/// Authoritative leave workflow: validates, applies transitions and persists them.
#[derive(Clone)]
pub struct LeaveService {
    repo: Arc<dyn LeaveRepository>,
}

impl LeaveService {
    pub fn new(repo: Arc<dyn LeaveRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, actor: &Actor, draft: &CreateLeave) -> LeaveResult<LeaveRequest> {
        draft.validate()?;
        let request = self.repo.insert(actor.employee_id, draft, Utc::now()).await?;
        info!(
            leave_id = request.id,
            employee_id = actor.employee_id,
            leave_type = %request.leave_type,
            days = request.duration_days(),
            "Leave request submitted"
        );
        Ok(request)
    }

    /// Owners see their own requests; approvers see everyone's.
    pub async fn get(&self, actor: &Actor, id: u64) -> LeaveResult<LeaveRequest> {
        let request = self.load(id).await?;
        let approver = Authority::Manager.permits(actor.role) || Authority::Hr.permits(actor.role);
        if request.employee_id != actor.employee_id && !approver {
            return Err(LeaveError::Authorization(
                "you can only view your own leave requests".into(),
            ));
        }
        Ok(request)
    }

    pub async fn list(&self, actor: &Actor, query: &LeaveQuery) -> LeaveResult<ListedPage> {
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let page_no = query.page.unwrap_or(1).max(1);
        let offset = (page_no - 1)
            .checked_mul(per_page)
            .ok_or_else(|| LeaveError::Validation(format!("page {} is out of range", page_no)))?;

        let mut filter = LeaveFilter {
            limit: per_page,
            offset,
            ..Default::default()
        };
        match query.scope.unwrap_or_default() {
            Scope::Mine => {
                filter.employee_id = Some(actor.employee_id);
            }
            Scope::PendingApproval => {
                let statuses = awaiting_statuses(actor.role);
                if statuses.is_empty() {
                    return Ok(ListedPage {
                        page: LeavePage {
                            data: Vec::new(),
                            total: 0,
                        },
                        page_no,
                        per_page,
                    });
                }
                filter.exclude_employee_id = Some(actor.employee_id);
                filter.statuses = statuses;
            }
            Scope::All => {
                if !Authority::Hr.permits(actor.role) {
                    return Err(LeaveError::Authorization(format!(
                        "listing all leave requests requires {}",
                        Authority::Hr.describe()
                    )));
                }
            }
        }

        if let Some(status) = query.status {
            if filter.statuses.is_empty() {
                filter.statuses = vec![status];
            } else {
                filter.statuses.retain(|s| *s == status);
                if filter.statuses.is_empty() {
                    return Ok(ListedPage {
                        page: LeavePage {
                            data: Vec::new(),
                            total: 0,
                        },
                        page_no,
                        per_page,
                    });
                }
            }
        }

        let page = self.repo.list(&filter).await?;
        Ok(ListedPage {
            page,
            page_no,
            per_page,
        })
    }

    pub async fn approve_as_manager(&self, actor: &Actor, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(actor, id, LeaveAction::Approve(Stage::Manager)).await
    }

    pub async fn reject_as_manager(
        &self,
        actor: &Actor,
        id: u64,
        reason: &str,
    ) -> LeaveResult<LeaveRequest> {
        let action = LeaveAction::Reject {
            stage: Stage::Manager,
            reason: reason.to_string(),
        };
        self.transition(actor, id, action).await
    }

    pub async fn approve_as_hr(&self, actor: &Actor, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(actor, id, LeaveAction::Approve(Stage::Hr)).await
    }

    pub async fn reject_as_hr(
        &self,
        actor: &Actor,
        id: u64,
        reason: &str,
    ) -> LeaveResult<LeaveRequest> {
        let action = LeaveAction::Reject {
            stage: Stage::Hr,
            reason: reason.to_string(),
        };
        self.transition(actor, id, action).await
    }

    pub async fn cancel(&self, actor: &Actor, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(actor, id, LeaveAction::Cancel).await
    }

    pub async fn balance(&self, actor: &Actor) -> LeaveResult<LeaveBalance> {
        self.repo
            .balance(actor.employee_id)
            .await?
            .ok_or_else(|| {
                LeaveError::NotFound(format!("leave balance for employee {}", actor.employee_id))
            })
    }

    /// Applies one transition and persists it as a single replace.
    ///
    /// The final HR approval debits the owner's balance in the same step.
    pub async fn transition(
        &self,
        actor: &Actor,
        id: u64,
        action: LeaveAction,
    ) -> LeaveResult<LeaveRequest> {
        let current = self.load(id).await?;
        let next = workflow::apply(&current, actor, &action, Utc::now()).map_err(|e| {
            warn!(
                leave_id = id,
                employee_id = actor.employee_id,
                role = %actor.role,
                action = %action.kind(),
                error = %e,
                "Leave transition refused"
            );
            e
        })?;

        let debit = (next.status == LeaveStatus::Approved && next.leave_type != LeaveType::Unpaid)
            .then(|| Debit {
                employee_id: next.employee_id,
                leave_type: next.leave_type,
                days: next.duration_days() as f64,
            });

        if !self.repo.replace(current.status, &next, debit).await? {
            let now = self.load(id).await?;
            warn!(
                leave_id = id,
                expected = %current.status,
                found = %now.status,
                "Leave request changed during transition"
            );
            return Err(LeaveError::InvalidState(format!(
                "request moved from {} to {} before this {} was applied",
                current.status,
                now.status,
                action.kind()
            )));
        }

        info!(
            leave_id = id,
            employee_id = actor.employee_id,
            from = %current.status,
            to = %next.status,
            "Leave transition applied"
        );
        Ok(next)
    }

    async fn load(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.repo
            .find(id)
            .await?
            .ok_or_else(|| LeaveError::NotFound(format!("leave request {}", id)))
    }
}
