use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Tokens are treated as expired this many seconds before the chat platform
/// stops accepting them.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Upper bound on the `expires_in` the chat platform may grant.
const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Payload the chat platform posts to the install callback.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationRegistration {
    pub oauth_id: String,
    pub oauth_secret: String,
    pub capabilities_url: String,
    pub room_id: i64,
    pub group_id: i64,
}

/// Endpoints discovered from the chat platform's capabilities document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEndpoints {
    pub token_url: String,
    pub api_url: String,
}

/// Result of a client-credentials token exchange.
#[derive(Clone, Debug)]
pub struct AccessTokenGrant {
    pub access_token: SecretString,
    pub token_type: String,
    pub scope: String,
    pub expires_in: i64,
    pub group_id: Option<i64>,
    pub group_name: Option<String>,
}

/// One tenant's binding to the integration, keyed by `oauth_id`.
#[derive(Clone, Debug)]
pub struct Installation {
    pub oauth_id: String,
    pub oauth_secret: SecretString,
    pub capabilities_url: String,
    pub room_id: i64,
    pub group_id: i64,
    pub token_url: String,
    pub api_url: String,
    pub access_token: SecretString,
    pub token_type: String,
    pub scope: String,
    pub group_name: Option<String>,
    pub token_expires_at: DateTime<Utc>,
    pub glassfrog_token: Option<SecretString>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Installation {
    pub fn from_grant(
        registration: InstallationRegistration,
        endpoints: ChatEndpoints,
        grant: AccessTokenGrant,
        now: DateTime<Utc>,
    ) -> Self {
        let mut installation = Self {
            oauth_id: registration.oauth_id,
            oauth_secret: registration.oauth_secret.into(),
            capabilities_url: registration.capabilities_url,
            room_id: registration.room_id,
            group_id: registration.group_id,
            token_url: endpoints.token_url,
            api_url: endpoints.api_url,
            access_token: String::new().into(),
            token_type: String::new(),
            scope: String::new(),
            group_name: None,
            token_expires_at: now,
            glassfrog_token: None,
            created_at: now,
            updated_at: now,
        };
        installation.apply_grant(grant, now);
        installation
    }

    pub fn apply_grant(&mut self, grant: AccessTokenGrant, now: DateTime<Utc>) {
        self.access_token = grant.access_token;
        self.token_type = grant.token_type;
        self.scope = grant.scope;
        self.token_expires_at = expiry_after(now, grant.expires_in);
        if let Some(group_id) = grant.group_id {
            self.group_id = group_id;
        }
        if grant.group_name.is_some() {
            self.group_name = grant.group_name;
        }
        self.updated_at = now;
    }

    /// The configured GlassFrog token, if any. Blank values count as unset.
    pub fn glassfrog_token(&self) -> Option<&str> {
        self.glassfrog_token
            .as_ref()
            .map(|token| token.expose_secret())
            .filter(|token| !token.trim().is_empty())
    }

    pub fn access_token_expired(&self, now: DateTime<Utc>) -> bool {
        expiry_after(now, TOKEN_EXPIRY_MARGIN_SECS) >= self.token_expires_at
    }

    pub fn notification_url(&self) -> String {
        format!("{}/room/{}/notification", self.api_url.trim_end_matches('/'), self.room_id)
    }

    pub fn room_members_url(&self) -> String {
        format!("{}/room/{}/member", self.api_url.trim_end_matches('/'), self.room_id)
    }
}

/// `now` plus `seconds`, clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
fn expiry_after(now: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    Duration::try_seconds(seconds.clamp(0, MAX_TOKEN_LIFETIME_SECS))
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(now)
}
