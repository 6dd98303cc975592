use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use hipfrog_core::CommandError;

use crate::types::{
    CircleDetail, CircleListing, ErrorBody, PeopleEnvelope, PersonSummary, RoleDetail,
    RoleRecord, RolesEnvelope,
};

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Any status other than 200. `message` is the body's `message` field when present.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("GlassFrog could not be reached: {0}")]
    Transport(String),
    #[error("GlassFrog returned an unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

impl From<ApiError> for CommandError {
    fn from(error: ApiError) -> Self {
        CommandError::Upstream { status: error.status(), message: error.to_string() }
    }
}

/// Read-only GlassFrog endpoints used by the chat commands. Every call takes
/// the installation's GlassFrog token.
#[async_trait]
pub trait GlassfrogApi: Send + Sync {
    async fn circles(&self, token: &str) -> Result<CircleListing, ApiError>;
    async fn circle(&self, token: &str, circle_id: &str) -> Result<CircleDetail, ApiError>;
    async fn circle_people(
        &self,
        token: &str,
        circle_id: &str,
    ) -> Result<Vec<PersonSummary>, ApiError>;
    async fn circle_roles(&self, token: &str, circle_id: &str)
        -> Result<Vec<RoleRecord>, ApiError>;
    async fn roles(&self, token: &str) -> Result<Vec<RoleRecord>, ApiError>;
    async fn role(&self, token: &str, role_id: &str) -> Result<RoleDetail, ApiError>;
}

#[async_trait]
impl<T> GlassfrogApi for Arc<T>
where
    T: GlassfrogApi + ?Sized,
{
    async fn circles(&self, token: &str) -> Result<CircleListing, ApiError> {
        (**self).circles(token).await
    }

    async fn circle(&self, token: &str, circle_id: &str) -> Result<CircleDetail, ApiError> {
        (**self).circle(token, circle_id).await
    }

    async fn circle_people(
        &self,
        token: &str,
        circle_id: &str,
    ) -> Result<Vec<PersonSummary>, ApiError> {
        (**self).circle_people(token, circle_id).await
    }

    async fn circle_roles(
        &self,
        token: &str,
        circle_id: &str,
    ) -> Result<Vec<RoleRecord>, ApiError> {
        (**self).circle_roles(token, circle_id).await
    }

    async fn roles(&self, token: &str) -> Result<Vec<RoleRecord>, ApiError> {
        (**self).roles(token).await
    }

    async fn role(&self, token: &str, role_id: &str) -> Result<RoleDetail, ApiError> {
        (**self).role(token, role_id).await
    }
}

#[derive(Clone)]
pub struct HttpGlassfrogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGlassfrogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, path: &str) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(event_name = "glassfrog.request", endpoint = path, "calling GlassFrog");

        let response = self
            .client
            .get(&url)
            .header(AUTH_HEADER, token)
            .send()
            .await
            .map_err(|error| ApiError::Transport(error.to_string()))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|error| ApiError::Transport(error.to_string()))?;

        if status != StatusCode::OK {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|error| error.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| status_line(status));
            warn!(
                event_name = "glassfrog.request.rejected",
                endpoint = path,
                status = status.as_u16(),
                "GlassFrog answered with a non-200 status"
            );
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        serde_json::from_slice::<T>(&body).map_err(|error| ApiError::Decode(error.to_string()))
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("GlassFrog answered {} {reason}", status.as_u16()),
        None => format!("GlassFrog answered {}", status.as_u16()),
    }
}

#[async_trait]
impl GlassfrogApi for HttpGlassfrogClient {
    async fn circles(&self, token: &str) -> Result<CircleListing, ApiError> {
        self.get_json(token, "circles").await
    }

    async fn circle(&self, token: &str, circle_id: &str) -> Result<CircleDetail, ApiError> {
        let listing: CircleListing = self.get_json(token, &format!("circles/{circle_id}")).await?;
        CircleDetail::try_from(listing)
            .map_err(|_| ApiError::Decode(format!("circle {circle_id} was not in the response")))
    }

    async fn circle_people(
        &self,
        token: &str,
        circle_id: &str,
    ) -> Result<Vec<PersonSummary>, ApiError> {
        let envelope: PeopleEnvelope =
            self.get_json(token, &format!("circles/{circle_id}/people")).await?;
        Ok(envelope.people)
    }

    async fn circle_roles(
        &self,
        token: &str,
        circle_id: &str,
    ) -> Result<Vec<RoleRecord>, ApiError> {
        let envelope: RolesEnvelope =
            self.get_json(token, &format!("circles/{circle_id}/roles")).await?;
        Ok(envelope.roles)
    }

    async fn roles(&self, token: &str) -> Result<Vec<RoleRecord>, ApiError> {
        let envelope: RolesEnvelope = self.get_json(token, "roles").await?;
        Ok(envelope.roles)
    }

    async fn role(&self, token: &str, role_id: &str) -> Result<RoleDetail, ApiError> {
        let envelope: RolesEnvelope = self.get_json(token, &format!("roles/{role_id}")).await?;
        RoleDetail::try_from(envelope)
            .map_err(|_| ApiError::Decode(format!("role {role_id} was not in the response")))
    }
}
