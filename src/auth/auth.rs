use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::{TokenSubject, verify_token};
use crate::config::Config;
use crate::error::{LeaveError, LeaveResult};
use crate::model::role::Role;
use crate::models::TokenType;
use crate::workflow::Actor;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl From<TokenSubject> for AuthUser {
    fn from(subject: TokenSubject) -> Self {
        Self {
            user_id: subject.user_id,
            username: subject.username,
            role: subject.role,
            employee_id: subject.employee_id,
        }
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already decoded by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) if c.token_type == TokenType::Access => c,
            _ => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        match TokenSubject::from_claims(&claims) {
            Some(subject) => ready(Ok(subject.into())),
            None => ready(Err(ErrorUnauthorized("Invalid role"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> LeaveResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(LeaveError::Authorization("Admin only".into()))
        }
    }

    /// The workflow actor behind this user; leave actions need an employee profile.
    pub fn actor(&self) -> LeaveResult<Actor> {
        let employee_id = self
            .employee_id
            .ok_or_else(|| LeaveError::Authorization("No employee profile".into()))?;
        Ok(Actor {
            employee_id,
            role: self.role,
        })
    }
}
