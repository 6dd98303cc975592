use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use hipfrog_core::domain::installation::{AccessTokenGrant, ChatEndpoints, Installation};
use hipfrog_core::CommandResult;

/// Scopes requested in the client-credentials grant.
pub const TOKEN_SCOPES: &str = "send_notification view_room";

#[derive(Debug, Error)]
pub enum HipchatError {
    #[error("HipChat answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("HipChat could not be reached: {0}")]
    Transport(String),
    #[error("HipChat returned an unexpected response: {0}")]
    Decode(String),
    #[error("capabilities document is missing `{0}`")]
    MissingCapability(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RoomMember {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub mention_name: String,
}

#[async_trait]
pub trait HipchatApi: Send + Sync {
    /// Reads the token endpoint and API base URL from a tenant's capabilities document.
    async fn fetch_capabilities(&self, capabilities_url: &str)
        -> Result<ChatEndpoints, HipchatError>;

    async fn exchange_token(
        &self,
        token_url: &str,
        oauth_id: &str,
        oauth_secret: &SecretString,
    ) -> Result<AccessTokenGrant, HipchatError>;

    async fn send_notification(
        &self,
        installation: &Installation,
        notification: &CommandResult,
    ) -> Result<(), HipchatError>;

    async fn room_members(&self, installation: &Installation)
        -> Result<Vec<RoomMember>, HipchatError>;
}

#[async_trait]
impl<T> HipchatApi for Arc<T>
where
    T: HipchatApi + ?Sized,
{
    async fn fetch_capabilities(
        &self,
        capabilities_url: &str,
    ) -> Result<ChatEndpoints, HipchatError> {
        (**self).fetch_capabilities(capabilities_url).await
    }

    async fn exchange_token(
        &self,
        token_url: &str,
        oauth_id: &str,
        oauth_secret: &SecretString,
    ) -> Result<AccessTokenGrant, HipchatError> {
        (**self).exchange_token(token_url, oauth_id, oauth_secret).await
    }

    async fn send_notification(
        &self,
        installation: &Installation,
        notification: &CommandResult,
    ) -> Result<(), HipchatError> {
        (**self).send_notification(installation, notification).await
    }

    async fn room_members(
        &self,
        installation: &Installation,
    ) -> Result<Vec<RoomMember>, HipchatError> {
        (**self).room_members(installation).await
    }
}

#[derive(Deserialize)]
struct CapabilitiesDocument {
    #[serde(default)]
    capabilities: Option<Capabilities>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Capabilities {
    #[serde(default)]
    oauth2_provider: Option<OAuthProvider>,
    #[serde(default)]
    hipchat_api_provider: Option<ApiProvider>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OAuthProvider {
    token_url: String,
}

#[derive(Deserialize)]
struct ApiProvider {
    url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    group_id: Option<i64>,
    #[serde(default)]
    group_name: Option<String>,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    token_type: String,
}

#[derive(Deserialize)]
struct RoomMembersResponse {
    #[serde(default)]
    items: Vec<RoomMember>,
}

#[derive(Clone, Default)]
pub struct HttpHipchatClient {
    client: reqwest::Client,
}

impl HttpHipchatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, HipchatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);
    Err(HipchatError::Status { status: status.as_u16(), message })
}

fn transport(error: reqwest::Error) -> HipchatError {
    HipchatError::Transport(error.to_string())
}

fn decode(error: reqwest::Error) -> HipchatError {
    HipchatError::Decode(error.to_string())
}

#[async_trait]
impl HipchatApi for HttpHipchatClient {
    async fn fetch_capabilities(
        &self,
        capabilities_url: &str,
    ) -> Result<ChatEndpoints, HipchatError> {
        let response = self.client.get(capabilities_url).send().await.map_err(transport)?;
        let document: CapabilitiesDocument =
            check_status(response).await?.json().await.map_err(decode)?;

        let capabilities =
            document.capabilities.ok_or(HipchatError::MissingCapability("capabilities"))?;
        let token_url = capabilities
            .oauth2_provider
            .ok_or(HipchatError::MissingCapability("capabilities.oauth2Provider.tokenUrl"))?
            .token_url;
        let api_url = capabilities
            .hipchat_api_provider
            .ok_or(HipchatError::MissingCapability("capabilities.hipchatApiProvider.url"))?
            .url;

        Ok(ChatEndpoints { token_url, api_url })
    }

    async fn exchange_token(
        &self,
        token_url: &str,
        oauth_id: &str,
        oauth_secret: &SecretString,
    ) -> Result<AccessTokenGrant, HipchatError> {
        debug!(event_name = "hipchat.token.exchange", oauth_id, "requesting access token");

        let response = self
            .client
            .post(token_url)
            .basic_auth(oauth_id, Some(oauth_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials"), ("scope", TOKEN_SCOPES)])
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = check_status(response).await?.json().await.map_err(decode)?;

        Ok(AccessTokenGrant {
            access_token: SecretString::from(token.access_token),
            token_type: token.token_type,
            scope: token.scope,
            expires_in: token.expires_in,
            group_id: token.group_id,
            group_name: token.group_name,
        })
    }

    async fn send_notification(
        &self,
        installation: &Installation,
        notification: &CommandResult,
    ) -> Result<(), HipchatError> {
        let response = self
            .client
            .post(installation.notification_url())
            .bearer_auth(installation.access_token.expose_secret())
            .json(notification)
            .send()
            .await
            .map_err(transport)?;

        if let Err(error) = check_status(response).await {
            warn!(
                event_name = "hipchat.notification.rejected",
                oauth_id = %installation.oauth_id,
                room_id = installation.room_id,
                error = %error,
                "room notification was not accepted"
            );
            return Err(error);
        }
        Ok(())
    }

    async fn room_members(
        &self,
        installation: &Installation,
    ) -> Result<Vec<RoomMember>, HipchatError> {
        let response = self
            .client
            .get(installation.room_members_url())
            .bearer_auth(installation.access_token.expose_secret())
            .send()
            .await
            .map_err(transport)?;
        let members: RoomMembersResponse =
            check_status(response).await?.json().await.map_err(decode)?;
        Ok(members.items)
    }
}
