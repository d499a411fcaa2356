use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};
use utoipa::ToSchema;

/// Machine-readable error kind carried in every error payload.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, StrumDisplay, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authorization,
    InvalidState,
    NotFound,
    Network,
    Busy,
    Internal,
}

/// Error payload returned by the API and decoded by the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "kind": "invalid_state",
    "detail": "cannot approve a request that is approved"
}))]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LeaveError {
    /// Malformed input, e.g. a rejection without a reason.
    #[display(fmt = "validation error: {}", _0)]
    Validation(String),
    /// The actor's role (or ownership) does not allow the transition.
    #[display(fmt = "not authorized: {}", _0)]
    Authorization(String),
    /// The transition is not legal from the record's current status.
    #[display(fmt = "invalid state: {}", _0)]
    InvalidState(String),
    #[display(fmt = "not found: {}", _0)]
    NotFound(String),
    /// Transport failure; the outcome of the request is unknown.
    #[display(fmt = "network error: {}", _0)]
    Network(String),
    /// A transition on the same request is still awaiting its response.
    #[display(fmt = "request {} already has a transition in flight", _0)]
    Busy(u64),
    #[display(fmt = "internal error: {}", _0)]
    Internal(String),
}

impl std::error::Error for LeaveError {}

impl LeaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LeaveError::Validation(_) => ErrorKind::Validation,
            LeaveError::Authorization(_) => ErrorKind::Authorization,
            LeaveError::InvalidState(_) => ErrorKind::InvalidState,
            LeaveError::NotFound(_) => ErrorKind::NotFound,
            LeaveError::Network(_) => ErrorKind::Network,
            LeaveError::Busy(_) => ErrorKind::Busy,
            LeaveError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Human-readable detail without the kind prefix.
    pub fn detail(&self) -> String {
        match self {
            LeaveError::Validation(d)
            | LeaveError::Authorization(d)
            | LeaveError::InvalidState(d)
            | LeaveError::NotFound(d)
            | LeaveError::Network(d)
            | LeaveError::Internal(d) => d.clone(),
            LeaveError::Busy(id) => format!("request {} already has a transition in flight", id),
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let detail = match self {
            // storage details stay in the logs
            LeaveError::Internal(_) => "Internal Server Error".to_string(),
            other => other.detail(),
        };
        ErrorPayload {
            kind: self.kind(),
            detail,
        }
    }

    /// Rebuilds an error from a payload received over the wire.
    pub fn from_payload(payload: ErrorPayload) -> Self {
        let ErrorPayload { kind, detail } = payload;
        match kind {
            ErrorKind::Validation => LeaveError::Validation(detail),
            ErrorKind::Authorization => LeaveError::Authorization(detail),
            ErrorKind::InvalidState => LeaveError::InvalidState(detail),
            ErrorKind::NotFound => LeaveError::NotFound(detail),
            ErrorKind::Network => LeaveError::Network(detail),
            ErrorKind::Busy => LeaveError::Network(detail),
            ErrorKind::Internal => LeaveError::Internal(detail),
        }
    }
}

impl From<sqlx::Error> for LeaveError {
    fn from(e: sqlx::Error) -> Self {
        LeaveError::Internal(e.to_string())
    }
}

impl From<reqwest::Error> for LeaveError {
    fn from(e: reqwest::Error) -> Self {
        LeaveError::Network(e.to_string())
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::Authorization(_) => StatusCode::FORBIDDEN,
            LeaveError::InvalidState(_) => StatusCode::CONFLICT,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Network(_) => StatusCode::BAD_GATEWAY,
            LeaveError::Busy(_) => StatusCode::TOO_MANY_REQUESTS,
            LeaveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_payload())
    }
}

pub type LeaveResult<T> = Result<T, LeaveError>;
