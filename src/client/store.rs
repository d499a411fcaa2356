use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use super::{LeaveApi, dispatch};
use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{CreateLeave, LeaveQuery, LeaveRequest, LeaveStatus, Scope};
use crate::services::leave_service::MAX_PER_PAGE;
use crate::workflow::gate::{ActionKind, available_actions, awaiting_statuses};
use crate::workflow::{Actor, LeaveAction, Stage, balance};

#[derive(Default)]
struct StoreState {
    requests: BTreeMap<u64, LeaveRequest>,
    in_flight: HashSet<u64>,
    balance: Option<LeaveBalance>,
}

/// Client-side view of the leave requests one user can see.
///
/// Every mutation goes through a method here. A transition marks its request
/// in flight until the response lands; a second transition on the same id is
/// refused with [`LeaveError::Busy`]. Server answers replace whole records, so
/// readers never see a half-applied transition.
pub struct LeaveStore<A: LeaveApi> {
    api: A,
    viewer: Actor,
    state: RwLock<StoreState>,
}

fn progress(status: LeaveStatus) -> u8 {
    match status {
        LeaveStatus::Pending => 0,
        LeaveStatus::ManagerApproved => 1,
        _ => 2,
    }
}

/// Status only moves forward, so it breaks ties between equal timestamps.
fn is_newer(current: &LeaveRequest, incoming: &LeaveRequest) -> bool {
    (current.updated_at, progress(current.status)) > (incoming.updated_at, progress(incoming.status))
}

/// Clears the in-flight mark when a transition finishes, however it finishes.
struct InFlight<'a> {
    state: &'a RwLock<StoreState>,
    id: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .remove(&self.id);
    }
}

impl<A: LeaveApi> LeaveStore<A> {
    pub fn new(api: A, viewer: Actor) -> Self {
        Self {
            api,
            viewer,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn viewer(&self) -> Actor {
        self.viewer
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn select(&self, keep: impl Fn(&LeaveRequest) -> bool) -> Vec<LeaveRequest> {
        self.read()
            .requests
            .values()
            .filter(|r| keep(*r))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<LeaveRequest> {
        self.read().requests.get(&id).cloned()
    }

    pub fn all(&self) -> Vec<LeaveRequest> {
        self.select(|_| true)
    }

    /// Requests submitted by the viewer.
    pub fn mine(&self) -> Vec<LeaveRequest> {
        let me = self.viewer.employee_id;
        self.select(|r| r.employee_id == me)
    }

    /// Other employees' requests waiting on a manager decision.
    pub fn pending_manager(&self) -> Vec<LeaveRequest> {
        let me = self.viewer.employee_id;
        self.select(|r| r.status == LeaveStatus::Pending && r.employee_id != me)
    }

    /// Other employees' requests waiting on an HR decision.
    pub fn pending_hr(&self) -> Vec<LeaveRequest> {
        let me = self.viewer.employee_id;
        self.select(|r| r.status == LeaveStatus::ManagerApproved && r.employee_id != me)
    }

    pub fn balance(&self) -> Option<LeaveBalance> {
        self.read().balance.clone()
    }

    pub fn is_in_flight(&self, id: u64) -> bool {
        self.read().in_flight.contains(&id)
    }

    /// Actions to offer for a stored request. Empty while a transition on it
    /// is in flight, or when the request is unknown.
    pub fn available_actions(&self, id: u64) -> Vec<ActionKind> {
        let state = self.read();
        if state.in_flight.contains(&id) {
            return Vec::new();
        }
        state
            .requests
            .get(&id)
            .map(|r| available_actions(&self.viewer, r))
            .unwrap_or_default()
    }

    /// Reloads the viewer's own requests, plus the approval queue when the
    /// viewer's role decides any stage.
    ///
    /// The fetched set replaces the stored one, except that a stored record
    /// survives when a transition on it is in flight or when it is newer than
    /// the fetched copy (a transition answered while the listing was running).
    pub async fn refresh(&self) -> LeaveResult<()> {
        let mut fresh = BTreeMap::new();
        for request in self.fetch_scope(Scope::Mine).await? {
            fresh.insert(request.id, request);
        }
        if !awaiting_statuses(self.viewer.role).is_empty() {
            for request in self.fetch_scope(Scope::PendingApproval).await? {
                fresh.insert(request.id, request);
            }
        }

        let count = {
            let mut state = self.write();
            let previous = std::mem::take(&mut state.requests);
            for (id, current) in previous {
                let keep = state.in_flight.contains(&id)
                    || fresh.get(&id).is_some_and(|incoming| is_newer(&current, incoming));
                if keep {
                    fresh.insert(id, current);
                }
            }
            state.requests = fresh;
            state.requests.len()
        };
        debug!(employee_id = self.viewer.employee_id, count, "Leave store refreshed");
        Ok(())
    }

    /// Polling variant of [`refresh`](Self::refresh): failures are logged and
    /// the previous contents kept.
    pub async fn refresh_in_background(&self) {
        if let Err(e) = self.refresh().await {
            warn!(
                employee_id = self.viewer.employee_id,
                error = %e,
                "Background leave refresh failed"
            );
        }
    }

    pub async fn refresh_balance(&self) -> LeaveResult<LeaveBalance> {
        let balance = self.api.balance().await?;
        self.write().balance = Some(balance.clone());
        Ok(balance)
    }

    async fn fetch_scope(&self, scope: Scope) -> LeaveResult<Vec<LeaveRequest>> {
        let mut collected = Vec::new();
        let mut page = 1;
        loop {
            let query = LeaveQuery {
                scope: Some(scope),
                page: Some(page),
                per_page: Some(MAX_PER_PAGE),
                ..Default::default()
            };
            let listed = self.api.list(&query).await?;
            let received = listed.data.len();
            collected.extend(listed.data.into_iter().map(|r| r.request));
            if received == 0 || collected.len() as i64 >= listed.total {
                break;
            }
            page += 1;
        }
        Ok(collected)
    }

    /// Submits a new request. Dates and reason are checked locally, and when a
    /// balance has been loaded a request longer than it is refused up front.
    pub async fn create(&self, draft: &CreateLeave) -> LeaveResult<LeaveRequest> {
        draft.validate()?;
        if let Some(known) = self.balance() {
            balance::check_advisory(&known, draft.leave_type, draft.duration_days())?;
        }

        let created = self.api.create(draft).await?;
        self.write().requests.insert(created.id, created.clone());
        Ok(created)
    }

    pub async fn approve_as_manager(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(id, LeaveAction::Approve(Stage::Manager)).await
    }

    pub async fn reject_as_manager(&self, id: u64, reason: &str) -> LeaveResult<LeaveRequest> {
        self.transition(
            id,
            LeaveAction::Reject {
                stage: Stage::Manager,
                reason: reason.to_string(),
            },
        )
        .await
    }

    pub async fn approve_as_hr(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(id, LeaveAction::Approve(Stage::Hr)).await
    }

    pub async fn reject_as_hr(&self, id: u64, reason: &str) -> LeaveResult<LeaveRequest> {
        self.transition(
            id,
            LeaveAction::Reject {
                stage: Stage::Hr,
                reason: reason.to_string(),
            },
        )
        .await
    }

    pub async fn cancel(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(id, LeaveAction::Cancel).await
    }

    /// Sends one transition. Success replaces the stored record. An
    /// `InvalidState` answer means someone else moved the request first, so
    /// the record is re-fetched before the error is returned. Any other error
    /// leaves the store as it was.
    pub async fn transition(&self, id: u64, action: LeaveAction) -> LeaveResult<LeaveRequest> {
        if let LeaveAction::Reject { reason, .. } = &action {
            if reason.trim().is_empty() {
                return Err(LeaveError::Validation("rejection reason is required".into()));
            }
        }

        let _flight = {
            let mut state = self.write();
            if !state.in_flight.insert(id) {
                return Err(LeaveError::Busy(id));
            }
            InFlight {
                state: &self.state,
                id,
            }
        };

        match dispatch(&self.api, id, &action).await {
            Ok(updated) => {
                self.write().requests.insert(updated.id, updated.clone());
                Ok(updated)
            }
            Err(LeaveError::InvalidState(detail)) => {
                match self.api.get(id).await {
                    Ok(current) => {
                        self.write().requests.insert(current.id, current);
                    }
                    Err(e) => {
                        warn!(leave_id = id, error = %e, "Could not re-fetch leave request after conflict");
                    }
                }
                Err(LeaveError::InvalidState(detail))
            }
            Err(e) => Err(e),
        }
    }
}
