use async_trait::async_trait;

use super::LeaveApi;
use crate::error::LeaveResult;
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{
    CreateLeave, LeaveListResponse, LeaveQuery, LeaveRequest, LeaveResponse,
};
use crate::services::LeaveService;
use crate::workflow::Actor;

/// In-process [`LeaveApi`] bound to one actor, skipping HTTP entirely.
#[derive(Clone)]
pub struct LocalLeaveApi {
    service: LeaveService,
    actor: Actor,
}

impl LocalLeaveApi {
    pub fn new(service: LeaveService, actor: Actor) -> Self {
        Self { service, actor }
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }
}

#[async_trait]
impl LeaveApi for LocalLeaveApi {
    async fn create(&self, draft: &CreateLeave) -> LeaveResult<LeaveRequest> {
        self.service.create(&self.actor, draft).await
    }

    async fn get(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.service.get(&self.actor, id).await
    }

    async fn list(&self, query: &LeaveQuery) -> LeaveResult<LeaveListResponse> {
        let listed = self.service.list(&self.actor, query).await?;
        Ok(LeaveListResponse {
            data: listed.page.data.into_iter().map(LeaveResponse::from).collect(),
            page: listed.page_no,
            per_page: listed.per_page,
            total: listed.page.total,
        })
    }

    async fn approve_as_manager(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.service.approve_as_manager(&self.actor, id).await
    }

    async fn reject_as_manager(&self, id: u64, reason: &str) -> LeaveResult<LeaveRequest> {
        self.service.reject_as_manager(&self.actor, id, reason).await
    }

    async fn approve_as_hr(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.service.approve_as_hr(&self.actor, id).await
    }

    async fn reject_as_hr(&self, id: u64, reason: &str) -> LeaveResult<LeaveRequest> {
        self.service.reject_as_hr(&self.actor, id, reason).await
    }

    async fn cancel(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.service.cancel(&self.actor, id).await
    }

    async fn balance(&self) -> LeaveResult<LeaveBalance> {
        self.service.balance(&self.actor).await
    }
}
