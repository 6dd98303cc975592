#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use secrecy::SecretString;

use hipfrog_core::domain::installation::{
    AccessTokenGrant, ChatEndpoints, Installation, InstallationRegistration,
};
use hipfrog_core::CommandResult;
use hipfrog_glassfrog::{
    ApiError, CircleDetail, CircleListing, CircleRecord, GlassfrogApi, Links, PersonSummary,
    RoleDetail, RoleRecord, SupportedRole,
};
use hipfrog_hipchat::{HipchatApi, HipchatError, RoomMember};

pub fn installation(glassfrog_token: Option<&str>) -> Installation {
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).single().expect("valid timestamp");
    let mut installation = Installation::from_grant(
        InstallationRegistration {
            oauth_id: "oauth-1".to_string(),
            oauth_secret: "oauth-secret".to_string(),
            capabilities_url: "https://chat.example/v2/capabilities".to_string(),
            room_id: 2589171,
            group_id: 7,
        },
        ChatEndpoints {
            token_url: "https://chat.example/v2/oauth/token".to_string(),
            api_url: "https://chat.example/v2".to_string(),
        },
        AccessTokenGrant {
            access_token: SecretString::from("chat-token".to_string()),
            token_type: "bearer".to_string(),
            scope: "send_notification view_room".to_string(),
            expires_in: 3600,
            group_id: None,
            group_name: None,
        },
        now,
    );
    installation.glassfrog_token = glassfrog_token.map(|token| SecretString::from(token.to_string()));
    installation
}

pub fn person(id: i64, name: &str) -> PersonSummary {
    PersonSummary { id, name: name.to_string() }
}

fn circle(id: i64, name: &str) -> CircleRecord {
    CircleRecord { id, name: name.to_string(), strategy: None }
}

fn role(id: i64, name: &str, supporting_circle: Option<i64>) -> RoleRecord {
    RoleRecord {
        id,
        name: name.to_string(),
        purpose: None,
        links: Links { circle: Some(2), supporting_circle },
    }
}

fn supported(id: i64, parent: Option<i64>, child: i64) -> SupportedRole {
    SupportedRole {
        id,
        name: String::new(),
        purpose: Some(format!("Purpose of circle {child}")),
        links: Links { circle: parent, supporting_circle: Some(child) },
    }
}

/// Scripted GlassFrog: a two-circle organization, or a key that every endpoint rejects.
pub struct FakeGlassfrog {
    rejection: Option<(u16, String)>,
    circle_people: Vec<PersonSummary>,
    role_people: Vec<PersonSummary>,
    calls: Mutex<Vec<String>>,
}

impl FakeGlassfrog {
    pub fn organization() -> Arc<Self> {
        Self::with_people(
            vec![person(42, "Zoe"), person(40, "Ada")],
            vec![person(40, "Ada"), person(41, "Grace")],
        )
    }

    pub fn with_people(circle_people: Vec<PersonSummary>, role_people: Vec<PersonSummary>) -> Arc<Self> {
        Arc::new(Self { rejection: None, circle_people, role_people, calls: Mutex::new(Vec::new()) })
    }

    pub fn rejecting(status: u16, message: &str) -> Arc<Self> {
        Arc::new(Self {
            rejection: Some((status, message.to_string())),
            circle_people: Vec::new(),
            role_people: Vec::new(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn enter(&self, call: String) -> Result<(), ApiError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match &self.rejection {
            Some((status, message)) => {
                Err(ApiError::Status { status: *status, message: message.clone() })
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GlassfrogApi for FakeGlassfrog {
    async fn circles(&self, _token: &str) -> Result<CircleListing, ApiError> {
        self.enter("circles".to_string())?;
        let mut listing = CircleListing::default();
        listing.circles = vec![circle(1, "General"), circle(2, "Sales")];
        listing.linked.supported_roles = vec![supported(100, None, 1), supported(101, Some(1), 2)];
        Ok(listing)
    }

    async fn circle(&self, _token: &str, circle_id: &str) -> Result<CircleDetail, ApiError> {
        self.enter(format!("circles/{circle_id}"))?;
        match circle_id {
            "1" => Ok(CircleDetail {
                circle: circle(1, "General"),
                supported_role: Some(supported(100, None, 1)),
                domains: Vec::new(),
            }),
            "2" => Ok(CircleDetail {
                circle: circle(2, "Sales"),
                supported_role: Some(supported(101, Some(1), 2)),
                domains: vec!["Pricing".to_string()],
            }),
            _ => Err(ApiError::Status { status: 404, message: "Circle not found".to_string() }),
        }
    }

    async fn circle_people(
        &self,
        _token: &str,
        circle_id: &str,
    ) -> Result<Vec<PersonSummary>, ApiError> {
        self.enter(format!("circles/{circle_id}/people"))?;
        Ok(self.circle_people.clone())
    }

    async fn circle_roles(
        &self,
        _token: &str,
        circle_id: &str,
    ) -> Result<Vec<RoleRecord>, ApiError> {
        self.enter(format!("circles/{circle_id}/roles"))?;
        Ok(vec![role(5, "Secretary", None), role(6, "Facilitator", None)])
    }

    async fn roles(&self, _token: &str) -> Result<Vec<RoleRecord>, ApiError> {
        self.enter("roles".to_string())?;
        Ok(vec![role(5, "Secretary", None), role(6, "Facilitator", None), role(7, "Lead Link", None)])
    }

    async fn role(&self, _token: &str, role_id: &str) -> Result<RoleDetail, ApiError> {
        self.enter(format!("roles/{role_id}"))?;
        match role_id {
            "5" => Ok(RoleDetail {
                role: role(5, "Secretary", None),
                domains: Vec::new(),
                circle: Some(circle(2, "Sales")),
                accountabilities: vec!["Scheduling meetings".to_string()],
                people: self.role_people.clone(),
            }),
            _ => Err(ApiError::Status { status: 404, message: "Role not found".to_string() }),
        }
    }
}

/// Scripted chat platform with a fixed room roster.
pub struct FakeHipchat {
    roster: Option<Vec<RoomMember>>,
    notifications: Mutex<Vec<CommandResult>>,
}

impl FakeHipchat {
    pub fn with_roster(members: &[(&str, &str)]) -> Arc<Self> {
        let roster = members
            .iter()
            .map(|(name, mention_name)| RoomMember {
                id: None,
                name: name.to_string(),
                mention_name: mention_name.to_string(),
            })
            .collect();
        Arc::new(Self { roster: Some(roster), notifications: Mutex::new(Vec::new()) })
    }

    pub fn without_roster() -> Arc<Self> {
        Arc::new(Self { roster: None, notifications: Mutex::new(Vec::new()) })
    }

    pub fn notifications(&self) -> Vec<CommandResult> {
        self.notifications.lock().map(|sent| sent.clone()).unwrap_or_default()
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
        Ok(AccessTokenGrant {
            access_token: SecretString::from("chat-token".to_string()),
            token_type: "bearer".to_string(),
            scope: "send_notification view_room".to_string(),
            expires_in: 3600,
            group_id: None,
            group_name: None,
        })
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
        self.roster.clone().ok_or_else(|| HipchatError::Status {
            status: 403,
            message: "view_room scope missing".to_string(),
        })
    }
}
