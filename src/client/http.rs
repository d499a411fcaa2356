use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::LeaveApi;
use crate::error::{ErrorPayload, LeaveError, LeaveResult};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{
    CreateLeave, LeaveListResponse, LeaveQuery, LeaveRequest, LeaveResponse,
};

/// [`LeaveApi`] over HTTP against the `/leave` routes of the server.
pub struct HttpLeaveApi {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl HttpLeaveApi {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8080/api`.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, access_token)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Swaps the bearer token after a refresh.
    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = access_token.into();
    }

    fn url(&self, path: &str) -> String {
        format!("{}/leave{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> LeaveResult<T> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Leave API request failed");
                LeaveError::from(e)
            })?;

        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            serde_json::from_slice(&body)
                .map_err(|e| LeaveError::Network(format!("undecodable response: {}", e)))
        } else {
            Err(error_from_body(status, &body))
        }
    }

    async fn transition(&self, id: u64, action: &str, reason: Option<&str>) -> LeaveResult<LeaveRequest> {
        let mut request = self.client.put(self.url(&format!("/{}/{}", id, action)));
        if let Some(reason) = reason {
            request = request.json(&json!({ "reason": reason }));
        }
        let response: LeaveResponse = self.send(request).await?;
        Ok(response.request)
    }
}

/// Maps a non-success response to an error, preferring the server's payload.
pub fn error_from_body(status: StatusCode, body: &[u8]) -> LeaveError {
    if let Ok(payload) = serde_json::from_slice::<ErrorPayload>(body) {
        return LeaveError::from_payload(payload);
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    let detail = if text.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, text)
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LeaveError::Authorization(detail),
        StatusCode::NOT_FOUND => LeaveError::NotFound(detail),
        StatusCode::BAD_REQUEST => LeaveError::Validation(detail),
        _ => LeaveError::Network(detail),
    }
}

#[async_trait]
impl LeaveApi for HttpLeaveApi {
    async fn create(&self, draft: &CreateLeave) -> LeaveResult<LeaveRequest> {
        let response: LeaveResponse = self.send(self.client.post(self.url("")).json(draft)).await?;
        Ok(response.request)
    }

    async fn get(&self, id: u64) -> LeaveResult<LeaveRequest> {
        let response: LeaveResponse = self
            .send(self.client.get(self.url(&format!("/{}", id))))
            .await?;
        Ok(response.request)
    }

    async fn list(&self, query: &LeaveQuery) -> LeaveResult<LeaveListResponse> {
        self.send(self.client.get(self.url("")).query(query)).await
    }

    async fn approve_as_manager(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(id, "approve_manager", None).await
    }

    async fn reject_as_manager(&self, id: u64, reason: &str) -> LeaveResult<LeaveRequest> {
        self.transition(id, "reject_manager", Some(reason)).await
    }

    async fn approve_as_hr(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(id, "approve_hr", None).await
    }

    async fn reject_as_hr(&self, id: u64, reason: &str) -> LeaveResult<LeaveRequest> {
        self.transition(id, "reject_hr", Some(reason)).await
    }

    async fn cancel(&self, id: u64) -> LeaveResult<LeaveRequest> {
        self.transition(id, "cancel", None).await
    }

    async fn balance(&self) -> LeaveResult<LeaveBalance> {
        self.send(self.client.get(self.url("/balance"))).await
    }
}
