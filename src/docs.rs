use crate::error::{ErrorKind, ErrorPayload};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{
    CreateLeave, LeaveListResponse, LeaveQuery, LeaveRequest, LeaveResponse, LeaveStatus,
    LeaveType, RejectLeave, Scope,
};
use crate::model::role::Role;
use crate::models::{LoginReqDto, TokenPair, UserReq};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave Management

Employees submit leave requests which pass through two approval stages:

`pending` → `manager_approved` → `approved`

Either stage may reject (a reason is required); the requester may cancel
while the request is still `pending` or `manager_approved`. HR approval
debits the employee's paid or sick balance.

### 🔐 Roles
- **Manager** stage: manager, admin, director
- **HR** stage: hr, admin, director
- Nobody decides on their own request.

### 📦 Errors
Every failure answers `{ "kind": ..., "detail": ... }` where `kind` is one of
`validation`, `authorization`, `invalid_state`, `not_found`, `network`,
`busy` or `internal`.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_manager,
        crate::api::leave_request::reject_manager,
        crate::api::leave_request::approve_hr,
        crate::api::leave_request::reject_hr,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::leave_balance,

        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout
    ),
    components(
        schemas(
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveResponse,
            LeaveListResponse,
            LeaveQuery,
            CreateLeave,
            RejectLeave,
            Scope,
            LeaveBalance,
            ErrorKind,
            ErrorPayload,
            Role,
            UserReq,
            LoginReqDto,
            TokenPair
        )
    ),
    tags(
        (name = "Leave", description = "Leave request workflow"),
        (name = "Auth", description = "Login, token rotation and account provisioning"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
