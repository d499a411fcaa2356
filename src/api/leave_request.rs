use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};

use crate::auth::auth::AuthUser;
use crate::error::{ErrorPayload, LeaveError};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{
    CreateLeave, LeaveListResponse, LeaveQuery, LeaveRequest, LeaveResponse, RejectLeave,
};
use crate::services::LeaveService;

type ApiResult = Result<HttpResponse, LeaveError>;

fn record(request: LeaveRequest) -> HttpResponse {
    HttpResponse::Ok().json(LeaveResponse::from(request))
}

/* =========================
Extractor rejections answer with the same payload as every other error
========================= */
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    LeaveError::Validation(format!("invalid request body: {}", err)).into()
}

pub fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    LeaveError::Validation(format!("invalid path: {}", err)).into()
}

pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    LeaveError::Validation(format!("invalid query: {}", err)).into()
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveResponse),
        (status = 400, description = "Invalid dates or missing reason", body = ErrorPayload),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    payload: web::Json<CreateLeave>,
) -> ApiResult {
    let actor = auth.actor()?;
    let created = svc.create(&actor, &payload).await?;
    Ok(HttpResponse::Created().json(LeaveResponse::from(created)))
}

/// List leave requests in a scope
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Scope not allowed for this role", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    query: web::Query<LeaveQuery>,
) -> ApiResult {
    let actor = auth.actor()?;
    let listed = svc.list(&actor, &query).await?;

    let response = LeaveListResponse {
        data: listed.page.data.into_iter().map(LeaveResponse::from).collect(),
        page: listed.page_no,
        per_page: listed.per_page,
        total: listed.page.total,
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Leave application details
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = ErrorPayload),
        (status = 404, description = "Leave request not found", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> ApiResult {
    let actor = auth.actor()?;
    Ok(record(svc.get(&actor, path.into_inner()).await?))
}

/* =========================
Approve / reject, manager stage
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve_manager",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Request is manager_approved", body = LeaveResponse),
        (status = 403, description = "Requires manager, admin or director", body = ErrorPayload),
        (status = 404, description = "Leave request not found", body = ErrorPayload),
        (status = 409, description = "Request is not pending", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_manager(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> ApiResult {
    let actor = auth.actor()?;
    Ok(record(svc.approve_as_manager(&actor, path.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject_manager",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Request is rejected", body = LeaveResponse),
        (status = 400, description = "Missing rejection reason", body = ErrorPayload),
        (status = 403, description = "Requires manager, admin or director", body = ErrorPayload),
        (status = 409, description = "Request is not pending", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_manager(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
    body: web::Json<RejectLeave>,
) -> ApiResult {
    let actor = auth.actor()?;
    Ok(record(
        svc.reject_as_manager(&actor, path.into_inner(), &body.reason)
            .await?,
    ))
}

/* =========================
Approve / reject, HR stage
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve_hr",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Request is approved and the balance debited", body = LeaveResponse),
        (status = 400, description = "Insufficient leave balance", body = ErrorPayload),
        (status = 403, description = "Requires hr, admin or director", body = ErrorPayload),
        (status = 409, description = "Request is not manager_approved", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_hr(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> ApiResult {
    let actor = auth.actor()?;
    Ok(record(svc.approve_as_hr(&actor, path.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject_hr",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Request is rejected", body = LeaveResponse),
        (status = 400, description = "Missing rejection reason", body = ErrorPayload),
        (status = 403, description = "Requires hr, admin or director", body = ErrorPayload),
        (status = 409, description = "Request is not manager_approved", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_hr(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
    body: web::Json<RejectLeave>,
) -> ApiResult {
    let actor = auth.actor()?;
    Ok(record(
        svc.reject_as_hr(&actor, path.into_inner(), &body.reason).await?,
    ))
}

/* =========================
Cancel (owner)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Request is cancelled", body = LeaveResponse),
        (status = 403, description = "Not the requesting employee", body = ErrorPayload),
        (status = 409, description = "Request already decided", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    svc: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> ApiResult {
    let actor = auth.actor()?;
    Ok(record(svc.cancel(&actor, path.into_inner()).await?))
}

/// Caller's remaining leave days
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    responses(
        (status = 200, description = "Leave balance", body = LeaveBalance),
        (status = 404, description = "No balance on record", body = ErrorPayload)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_balance(auth: AuthUser, svc: web::Data<LeaveService>) -> ApiResult {
    let actor = auth.actor()?;
    Ok(HttpResponse::Ok().json(svc.balance(&actor).await?))
}
