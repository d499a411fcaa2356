//! Consumer side of the leave API: transport trait, implementations and the
//! state container a UI renders from.

pub mod http;
pub mod local;
pub mod store;

use async_trait::async_trait;

use crate::error::LeaveResult;
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{CreateLeave, LeaveListResponse, LeaveQuery, LeaveRequest};
use crate::workflow::{LeaveAction, Stage};

pub use http::HttpLeaveApi;
pub use local::LocalLeaveApi;
pub use store::LeaveStore;

/// Logical operations of the leave API. Every call is made on behalf of one
/// authenticated user and returns the full updated record on success.
#[async_trait]
pub trait LeaveApi: Send + Sync {
    async fn create(&self, draft: &CreateLeave) -> LeaveResult<LeaveRequest>;
    async fn get(&self, id: u64) -> LeaveResult<LeaveRequest>;
    async fn list(&self, query: &LeaveQuery) -> LeaveResult<LeaveListResponse>;
    async fn approve_as_manager(&self, id: u64) -> LeaveResult<LeaveRequest>;
    async fn reject_as_manager(&self, id: u64, reason: &str) -> LeaveResult<LeaveRequest>;
    async fn approve_as_hr(&self, id: u64) -> LeaveResult<LeaveRequest>;
    async fn reject_as_hr(&self, id: u64, reason: &str) -> LeaveResult<LeaveRequest>;
    async fn cancel(&self, id: u64) -> LeaveResult<LeaveRequest>;
    async fn balance(&self) -> LeaveResult<LeaveBalance>;
}

/// Routes a workflow action to the matching API operation.
pub async fn dispatch<A: LeaveApi + ?Sized>(
    api: &A,
    id: u64,
    action: &LeaveAction,
) -> LeaveResult<LeaveRequest> {
    match action {
        LeaveAction::Approve(Stage::Manager) => api.approve_as_manager(id).await,
        LeaveAction::Approve(Stage::Hr) => api.approve_as_hr(id).await,
        LeaveAction::Reject {
            stage: Stage::Manager,
            reason,
        } => api.reject_as_manager(id, reason).await,
        LeaveAction::Reject {
            stage: Stage::Hr,
            reason,
        } => api.reject_as_hr(id, reason).await,
        LeaveAction::Cancel => api.cancel(id).await,
    }
}
