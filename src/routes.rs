use crate::{
    api::leave_request,
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

fn build_limiter(name: &str, requests_per_min: u32) -> Result<Limiter> {
    if requests_per_min == 0 {
        return Err(anyhow!("{} rate limit must be at least one request per minute", name));
    }
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid {} rate limit: {} per minute", name, requests_per_min))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

/// Per-route limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimits {
    login: Limiter,
    register: Limiter,
    refresh: Limiter,
    protected: Limiter,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter("login", config.rate_login_per_min)?,
            register: build_limiter("register", config.rate_register_per_min)?,
            refresh: build_limiter("refresh", config.rate_refresh_per_min)?,
            protected: build_limiter("protected", config.rate_protected_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limits.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(limits.register.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limits.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limits.login.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limits.protected.clone()) // rate limiting
            .configure(configure_leave),
    );
}

/// `/leave` resources. `/balance` is registered ahead of `/{id}`; extractor
/// failures answer with an `ErrorPayload` of kind `validation`.
pub fn configure_leave(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            .app_data(web::JsonConfig::default().error_handler(leave_request::json_error))
            .app_data(web::PathConfig::default().error_handler(leave_request::path_error))
            .app_data(web::QueryConfig::default().error_handler(leave_request::query_error))
            // /leave
            .service(
                web::resource("")
                    .route(web::get().to(leave_request::leave_list))
                    .route(web::post().to(leave_request::create_leave)),
            )
            // /leave/balance
            .service(
                web::resource("/balance").route(web::get().to(leave_request::leave_balance)),
            )
            // /leave/{id}
            .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
            // /leave/{id}/approve_manager
            .service(
                web::resource("/{id}/approve_manager")
                    .route(web::put().to(leave_request::approve_manager)),
            )
            // /leave/{id}/reject_manager
            .service(
                web::resource("/{id}/reject_manager")
                    .route(web::put().to(leave_request::reject_manager)),
            )
            // /leave/{id}/approve_hr
            .service(
                web::resource("/{id}/approve_hr").route(web::put().to(leave_request::approve_hr)),
            )
            // /leave/{id}/reject_hr
            .service(
                web::resource("/{id}/reject_hr").route(web::put().to(leave_request::reject_hr)),
            )
            // /leave/{id}/cancel
            .service(
                web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_leave)),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new pair, the old refresh token is revoked
