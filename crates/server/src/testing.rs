//! Scripted collaborators for router tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::SecretString;
use serde_json::{json, Value};

use hipfrog_core::config::AppConfig;
use hipfrog_core::{
    AccessTokenGrant, ChatEndpoints, CommandResult, Installation, InstallationRegistration,
};
use hipfrog_db::{InMemoryInstallationRepository, InstallationRepository, RepositoryError};
use hipfrog_glassfrog::{
    ApiError, CircleDetail, CircleListing, CircleRecord, GlassfrogApi, Links, PersonSummary,
    RoleDetail, RoleRecord, SupportedRole,
};
use hipfrog_hipchat::{HipchatApi, HipchatError, RoomMember};

use crate::routes;
use crate::state::{AppState, SharedGlassfrog, SharedHipchat, SharedInstallations};

pub const GLASSFROG_TOKEN: &str = "gf-token";
pub const OAUTH_SECRET: &str = "oauth-secret";

pub struct Harness {
    pub state: AppState,
    pub installations: Arc<InMemoryInstallationRepository>,
    pub hipchat: Arc<FakeHipchat>,
}

impl Harness {
    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }
}

pub fn harness() -> Harness {
    let mut config = AppConfig::default();
    config.server.public_url = "https://hipfrog.example".to_string();

    let installations = Arc::new(InMemoryInstallationRepository::default());
    let hipchat = Arc::new(FakeHipchat::default());

    let state = AppState::new(
        config,
        Arc::clone(&installations) as SharedInstallations,
        Arc::new(FakeGlassfrog) as SharedGlassfrog,
        Arc::clone(&hipchat) as SharedHipchat,
    )
    .expect("templates compile");

    Harness { state, installations, hipchat }
}

/// Router over `installations` instead of the harness's own store.
pub fn router_with_store(installations: SharedInstallations, hipchat: Arc<FakeHipchat>) -> Router {
    let mut config = AppConfig::default();
    config.server.public_url = "https://hipfrog.example".to_string();

    let state = AppState::new(
        config,
        installations,
        Arc::new(FakeGlassfrog) as SharedGlassfrog,
        hipchat as SharedHipchat,
    )
    .expect("templates compile");
    routes::router(state)
}

pub fn stored_installation(glassfrog_token: Option<&str>) -> Installation {
    let mut installation = Installation::from_grant(
        InstallationRegistration {
            oauth_id: "oauth-1".to_string(),
            oauth_secret: OAUTH_SECRET.to_string(),
            capabilities_url: "https://chat.example/v2/capabilities".to_string(),
            room_id: 2589171,
            group_id: 7,
        },
        ChatEndpoints {
            token_url: "https://chat.example/v2/oauth/token".to_string(),
            api_url: "https://chat.example/v2".to_string(),
        },
        grant("chat-token"),
        Utc::now(),
    );
    installation.glassfrog_token =
        glassfrog_token.map(|token| SecretString::from(token.to_string()));
    installation
}

pub fn event_body(oauth_client_id: &str, text: &str) -> Value {
    json!({
        "event": "room_message",
        "oauth_client_id": oauth_client_id,
        "webhook_id": 11,
        "item": {
            "message": {
                "id": "m-1",
                "message": text,
                "from": {"id": 1, "name": "Ada Lovelace", "mention_name": "ada"}
            },
            "room": {"id": 2589171, "name": "Ops"}
        }
    })
}

/// A configure-page JWT as the chat platform would sign it.
pub fn signed_request(oauth_id: &str, secret: &str) -> String {
    let now = Utc::now();
    let claims = json!({
        "iss": oauth_id,
        "iat": now.timestamp(),
        "exp": (now + Duration::minutes(10)).timestamp(),
        "prn": "1",
        "context": {"room_id": 2589171}
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("sign request")
}

fn grant(access_token: &str) -> AccessTokenGrant {
    AccessTokenGrant {
        access_token: SecretString::from(access_token.to_string()),
        token_type: "bearer".to_string(),
        scope: "send_notification view_room".to_string(),
        expires_in: 3600,
        group_id: None,
        group_name: Some("Acme".to_string()),
    }
}

/// Accepts only [`GLASSFROG_TOKEN`]; organization of circles 1 and 2.
#[derive(Default)]
pub struct FakeGlassfrog;

impl FakeGlassfrog {
    fn authorize(token: &str) -> Result<(), ApiError> {
        if token == GLASSFROG_TOKEN {
            Ok(())
        } else {
            Err(ApiError::Status { status: 401, message: "Invalid API key".to_string() })
        }
    }
}

fn circle(id: i64, name: &str) -> CircleRecord {
    CircleRecord { id, name: name.to_string(), strategy: None }
}

fn secretary() -> RoleRecord {
    RoleRecord {
        id: 5,
        name: "Secretary".to_string(),
        purpose: None,
        links: Links { circle: Some(2), supporting_circle: None },
    }
}

#[async_trait]
impl GlassfrogApi for FakeGlassfrog {
    async fn circles(&self, token: &str) -> Result<CircleListing, ApiError> {
        Self::authorize(token)?;
        let mut listing = CircleListing::default();
        listing.circles = vec![circle(1, "General"), circle(2, "Sales")];
        listing.linked.supported_roles = vec![SupportedRole {
            id: 101,
            name: "Sales".to_string(),
            purpose: None,
            links: Links { circle: Some(1), supporting_circle: Some(2) },
        }];
        Ok(listing)
    }

    async fn circle(&self, token: &str, circle_id: &str) -> Result<CircleDetail, ApiError> {
        Self::authorize(token)?;
        match circle_id {
            "2" => Ok(CircleDetail {
                circle: circle(2, "Sales"),
                supported_role: None,
                domains: Vec::new(),
            }),
            _ => Err(ApiError::Status { status: 404, message: "Circle not found".to_string() }),
        }
    }

    async fn circle_people(
        &self,
        token: &str,
        _circle_id: &str,
    ) -> Result<Vec<PersonSummary>, ApiError> {
        Self::authorize(token)?;
        Ok(vec![PersonSummary { id: 41, name: "Grace".to_string() }])
    }

    async fn circle_roles(&self, token: &str, _circle_id: &str) -> Result<Vec<RoleRecord>, ApiError> {
        Self::authorize(token)?;
        Ok(vec![secretary()])
    }

    async fn roles(&self, token: &str) -> Result<Vec<RoleRecord>, ApiError> {
        Self::authorize(token)?;
        Ok(vec![secretary()])
    }

    async fn role(&self, token: &str, _role_id: &str) -> Result<RoleDetail, ApiError> {
        Self::authorize(token)?;
        Ok(RoleDetail {
            role: secretary(),
            domains: Vec::new(),
            circle: Some(circle(2, "Sales")),
            accountabilities: Vec::new(),
            people: vec![PersonSummary { id: 41, name: "Grace".to_string() }],
        })
    }
}

#[derive(Default)]
pub struct FakeHipchat {
    notifications: Mutex<Vec<CommandResult>>,
    token_exchanges: AtomicUsize,
    reject_exchange: AtomicBool,
}

impl FakeHipchat {
    pub fn notifications(&self) -> Vec<CommandResult> {
        self.notifications.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn token_exchanges(&self) -> usize {
        self.token_exchanges.load(Ordering::SeqCst)
    }

    pub fn fail_token_exchange(&self) {
        self.reject_exchange.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl HipchatApi for FakeHipchat {
    async fn fetch_capabilities(
        &self,
        _capabilities_url: &str,
    ) -> Result<ChatEndpoints, HipchatError> {
        Ok(ChatEndpoints {
            token_url: "https://chat.example/v2/oauth/token".to_string(),
            api_url: "https://chat.example/v2".to_string(),
        })
    }

    async fn exchange_token(
        &self,
        _token_url: &str,
        _oauth_id: &str,
        _oauth_secret: &SecretString,
    ) -> Result<AccessTokenGrant, HipchatError> {
        if self.reject_exchange.load(Ordering::SeqCst) {
            return Err(HipchatError::Transport("connection refused".to_string()));
        }
        self.token_exchanges.fetch_add(1, Ordering::SeqCst);
        Ok(grant("renewed-token"))
    }

    async fn send_notification(
        &self,
        _installation: &Installation,
        notification: &CommandResult,
    ) -> Result<(), HipchatError> {
        if let Ok(mut sent) = self.notifications.lock() {
            sent.push(notification.clone());
        }
        Ok(())
    }

    async fn room_members(
        &self,
        _installation: &Installation,
    ) -> Result<Vec<RoomMember>, HipchatError> {
        Ok(vec![RoomMember {
            id: Some(41),
            name: "Grace".to_string(),
            mention_name: "grace".to_string(),
        }])
    }
}

/// Store whose record disappears the moment a GlassFrog token is written,
/// as when an uninstall lands mid-request.
#[derive(Default)]
pub struct UninstalledOnTokenWrite {
    inner: InMemoryInstallationRepository,
}

#[async_trait]
impl InstallationRepository for UninstalledOnTokenWrite {
    async fn find_by_oauth_id(
        &self,
        oauth_id: &str,
    ) -> Result<Option<Installation>, RepositoryError> {
        self.inner.find_by_oauth_id(oauth_id).await
    }

    async fn save(&self, installation: Installation) -> Result<(), RepositoryError> {
        self.inner.save(installation).await
    }

    async fn set_glassfrog_token(
        &self,
        oauth_id: &str,
        token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        self.inner.delete(oauth_id).await?;
        self.inner.set_glassfrog_token(oauth_id, token, updated_at).await
    }

    async fn update_access_token(
        &self,
        installation: &Installation,
    ) -> Result<bool, RepositoryError> {
        self.inner.update_access_token(installation).await
    }

    async fn delete(&self, oauth_id: &str) -> Result<bool, RepositoryError> {
        self.inner.delete(oauth_id).await
    }

    async fn list(&self) -> Result<Vec<Installation>, RepositoryError> {
        self.inner.list().await
    }
}
