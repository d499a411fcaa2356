use std::sync::Arc;

use actix_web::middleware::from_fn;
use actix_web::web::{self, Data};
use actix_web::{App, http::StatusCode, test};
use serde_json::{Value, json};

use hrm_leave::auth::jwt::{TokenSubject, generate_access_token};
use hrm_leave::auth::middleware::auth_middleware;
use hrm_leave::config::Config;
use hrm_leave::model::employee::LeaveBalance;
use hrm_leave::model::role::Role;
use hrm_leave::repo::InMemoryLeaveRepository;
use hrm_leave::routes;
use hrm_leave::services::LeaveService;

const SECRET: &str = "test-secret";
const EMPLOYEE: u64 = 1000;
const MANAGER: u64 = 2000;
const HR: u64 = 3000;

fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 1000,
        rate_register_per_min: 1000,
        rate_refresh_per_min: 1000,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        log_level: tracing::Level::INFO,
    }
}

fn leave_service() -> LeaveService {
    LeaveService::new(Arc::new(InMemoryLeaveRepository::with_balances([
        LeaveBalance {
            employee_id: EMPLOYEE,
            paid_leave_balance: 10.0,
            sick_leave_balance: 2.0,
        },
    ])))
}

fn bearer(role: Role, employee_id: u64) -> (&'static str, String) {
    let subject = TokenSubject {
        user_id: employee_id,
        username: format!("{}-{}", role, employee_id),
        role,
        employee_id: Some(employee_id),
    };
    let token = generate_access_token(&subject, SECRET, 900).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

fn employee() -> (&'static str, String) {
    bearer(Role::Employee, EMPLOYEE)
}

fn manager() -> (&'static str, String) {
    bearer(Role::Manager, MANAGER)
}

fn hr() -> (&'static str, String) {
    bearer(Role::Hr, HR)
}

fn three_day_paid_leave() -> Value {
    json!({
        "leave_type": "paid",
        "start_date": "2025-06-01",
        "end_date": "2025-06-03",
        "reason": "Family trip"
    })
}

macro_rules! leave_app {
    ($svc:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new(test_config()))
                .app_data(Data::new($svc.clone()))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .configure(routes::configure_leave),
                ),
        )
        .await
    };
}

macro_rules! call_json {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn create_returns_pending_with_duration() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(three_day_paid_leave())
    );

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["duration_days"], 3);
    assert_eq!(body["employee_id"], EMPLOYEE);
    assert!(body["approved_by_manager"].is_null());
}

#[actix_web::test]
async fn reversed_dates_are_a_validation_error() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(json!({
                "leave_type": "sick",
                "start_date": "2025-06-03",
                "end_date": "2025-06-01",
                "reason": "Flu"
            }))
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[actix_web::test]
async fn two_stage_approval_debits_the_balance() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (_, created) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(three_day_paid_leave())
    );
    let id = created["id"].as_u64().unwrap();

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/approve_manager", id))
            .insert_header(manager())
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "manager_approved");
    assert_eq!(body["approved_by_manager"], MANAGER);

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/approve_hr", id))
            .insert_header(hr())
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["approved_by_hr"], HR);

    let (status, body) = call_json!(
        app,
        test::TestRequest::get()
            .uri("/api/leave/balance")
            .insert_header(employee())
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paid_leave_balance"], 7.0);
    assert_eq!(body["sick_leave_balance"], 2.0);
}

#[actix_web::test]
async fn hr_rejection_records_the_reason() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (_, created) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(three_day_paid_leave())
    );
    let id = created["id"].as_u64().unwrap();
    call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/approve_manager", id))
            .insert_header(manager())
    );

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/reject_hr", id))
            .insert_header(hr())
            .set_json(json!({ "reason": "insufficient coverage" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejection_reason"], "insufficient coverage");
    assert_eq!(body["rejected_by"], HR);
}

#[actix_web::test]
async fn reject_without_reason_is_a_validation_error() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (_, created) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(three_day_paid_leave())
    );
    let id = created["id"].as_u64().unwrap();

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/reject_manager", id))
            .insert_header(manager())
            .set_json(json!({}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (_, current) = call_json!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/leave/{}", id))
            .insert_header(employee())
    );
    assert_eq!(current["status"], "pending");
}

#[actix_web::test]
async fn employee_cannot_approve() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (_, created) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(manager())
            .set_json(three_day_paid_leave())
    );
    let id = created["id"].as_u64().unwrap();

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/approve_manager", id))
            .insert_header(employee())
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "authorization");
}

#[actix_web::test]
async fn cancelling_an_approved_request_conflicts() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (_, created) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(three_day_paid_leave())
    );
    let id = created["id"].as_u64().unwrap();
    for (path, who) in [("approve_manager", manager()), ("approve_hr", hr())] {
        let (status, _) = call_json!(
            app,
            test::TestRequest::put()
                .uri(&format!("/api/leave/{}/{}", id, path))
                .insert_header(who)
        );
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/cancel", id))
            .insert_header(employee())
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_state");

    let (_, current) = call_json!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/leave/{}", id))
            .insert_header(employee())
    );
    assert_eq!(current["status"], "approved");
    assert!(current["cancelled_at"].is_null());
}

#[actix_web::test]
async fn owner_cancels_a_pending_request() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (_, created) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(three_day_paid_leave())
    );
    let id = created["id"].as_u64().unwrap();

    let (status, _) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/cancel", id))
            .insert_header(manager())
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/cancel", id))
            .insert_header(employee())
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert!(!body["cancelled_at"].is_null());
}

#[actix_web::test]
async fn listing_scopes_follow_roles() {
    let svc = leave_service();
    let app = leave_app!(svc);

    call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(three_day_paid_leave())
    );

    let (status, body) = call_json!(
        app,
        test::TestRequest::get()
            .uri("/api/leave?scope=pending_approval")
            .insert_header(manager())
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["status"], "pending");

    // HR only decides after the manager stage
    let (_, body) = call_json!(
        app,
        test::TestRequest::get()
            .uri("/api/leave?scope=pending_approval")
            .insert_header(hr())
    );
    assert_eq!(body["total"], 0);

    let (status, body) = call_json!(
        app,
        test::TestRequest::get()
            .uri("/api/leave?scope=all")
            .insert_header(employee())
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "authorization");

    let (_, body) = call_json!(
        app,
        test::TestRequest::get()
            .uri("/api/leave")
            .insert_header(employee())
    );
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 10);
}

#[actix_web::test]
async fn unknown_request_is_not_found() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri("/api/leave/999/approve_manager")
            .insert_header(manager())
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (status, body) = call_json!(app, test::TestRequest::get().uri("/api/leave"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "authorization");
}

#[actix_web::test]
async fn page_past_the_offset_range_is_a_validation_error() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (status, body) = call_json!(
        app,
        test::TestRequest::get()
            .uri("/api/leave?page=18446744073709551615")
            .insert_header(employee())
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[actix_web::test]
async fn unknown_leave_type_answers_with_error_payload() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (status, body) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(json!({
                "leave_type": "compassionate",
                "start_date": "2025-06-01",
                "end_date": "2025-06-03",
                "reason": "Funeral"
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert!(body["detail"].as_str().unwrap().contains("compassionate"));
}

#[actix_web::test]
async fn bodiless_reject_answers_with_error_payload() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (_, created) = call_json!(
        app,
        test::TestRequest::post()
            .uri("/api/leave")
            .insert_header(employee())
            .set_json(three_day_paid_leave())
    );
    let id = created["id"].as_u64().unwrap();

    let (status, body) = call_json!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/leave/{}/reject_manager", id))
            .insert_header(manager())
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[actix_web::test]
async fn malformed_path_and_query_answer_with_error_payload() {
    let svc = leave_service();
    let app = leave_app!(svc);

    let (status, body) = call_json!(
        app,
        test::TestRequest::get()
            .uri("/api/leave/not-a-number")
            .insert_header(employee())
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = call_json!(
        app,
        test::TestRequest::get()
            .uri("/api/leave?scope=everything")
            .insert_header(employee())
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}
