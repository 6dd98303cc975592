//! Chat-platform facing routes.
//!
//! - `GET    /`                    install link
//! - `GET    /capabilities.json`   add-on descriptor
//! - `POST   /installed`           install callback
//! - `DELETE /installed/{oauth_id}` uninstall callback
//! - `POST   /hipfrog`, `/hola`    `/hipfrog` command webhook
//! - `POST   /atrole`, `/atcircle` mention webhooks
//! - `GET|POST /configure.html`    per-installation configuration page

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use hipfrog_core::{
    ApplicationError, CommandError, CommandResult, Installation, InstallationRegistration,
};
use hipfrog_db::RepositoryError;
use hipfrog_hipchat::capabilities::Descriptor;
use hipfrog_hipchat::{messages, EventContext, HipchatError, MentionKind, RoomMessageEvent};

use crate::configure;
use crate::state::AppState;

const INSTALL_LINK_TEXT: &str = "Install Glassfrog HipChat Integration";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/capabilities.json", get(capabilities))
        .route("/installed", post(installed))
        .route("/installed/{oauth_id}", delete(uninstalled))
        .route("/hipfrog", post(hipfrog_command))
        .route("/hola", post(hipfrog_command))
        .route("/atrole", post(at_role))
        .route("/atcircle", post(at_circle))
        .route("/configure.html", get(configure::page).post(configure::save))
        .with_state(state)
}

pub(crate) fn request_context() -> EventContext {
    EventContext { correlation_id: Uuid::new_v4().to_string() }
}

async fn home(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<a target="_blank" href="{}?url={}">{INSTALL_LINK_TEXT}</a>"#,
        state.config.hipchat.install_url,
        state.config.server.public_link("/capabilities.json"),
    ))
}

async fn capabilities(State(state): State<AppState>) -> Json<Descriptor> {
    Json(Descriptor::new(&state.config.server, &state.config.hipchat))
}

#[derive(Debug, Error)]
enum InstallError {
    #[error("chat platform rejected the installation: {0}")]
    Chat(#[from] HipchatError),
    #[error("installation could not be stored: {0}")]
    Store(#[from] RepositoryError),
}

impl InstallError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Chat(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

async fn install(
    state: &AppState,
    registration: InstallationRegistration,
) -> Result<Installation, InstallError> {
    let endpoints = state.hipchat.fetch_capabilities(&registration.capabilities_url).await?;
    let grant = state
        .hipchat
        .exchange_token(
            &endpoints.token_url,
            &registration.oauth_id,
            &registration.oauth_secret.clone().into(),
        )
        .await?;

    let installation = Installation::from_grant(registration, endpoints, grant, Utc::now());
    state.installations.save(installation.clone()).await?;
    Ok(installation)
}

async fn installed(
    State(state): State<AppState>,
    Json(registration): Json<InstallationRegistration>,
) -> StatusCode {
    let ctx = request_context();
    let oauth_id = registration.oauth_id.clone();

    let installation = match install(&state, registration).await {
        Ok(installation) => installation,
        Err(error) => {
            error!(
                event_name = "hipfrog.install.failed",
                correlation_id = %ctx.correlation_id,
                oauth_id = %oauth_id,
                error = %error,
                "installation failed"
            );
            return error.status_code();
        }
    };

    info!(
        event_name = "hipfrog.install.completed",
        correlation_id = %ctx.correlation_id,
        oauth_id = %installation.oauth_id,
        room_id = installation.room_id,
        group_id = installation.group_id,
        "installation stored"
    );

    if let Err(error) = state
        .hipchat
        .send_notification(&installation, &CommandResult::success(messages::INSTALLED))
        .await
    {
        warn!(
            event_name = "hipfrog.install.notification_failed",
            correlation_id = %ctx.correlation_id,
            oauth_id = %installation.oauth_id,
            error = %error,
            "installed notification was not delivered"
        );
    }

    StatusCode::OK
}

async fn uninstalled(State(state): State<AppState>, Path(oauth_id): Path<String>) -> StatusCode {
    let ctx = request_context();
    match state.installations.delete(&oauth_id).await {
        Ok(removed) => {
            info!(
                event_name = "hipfrog.uninstall.completed",
                correlation_id = %ctx.correlation_id,
                oauth_id = %oauth_id,
                removed,
                "installation removed"
            );
            StatusCode::OK
        }
        Err(error) => {
            error!(
                event_name = "hipfrog.uninstall.failed",
                correlation_id = %ctx.correlation_id,
                oauth_id = %oauth_id,
                error = %error,
                "installation could not be removed"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Looks up the installation a webhook belongs to; failures become the reply.
async fn installation_for_event(
    state: &AppState,
    event: &RoomMessageEvent,
    ctx: &EventContext,
) -> Result<Installation, CommandResult> {
    match state.installations.find_by_oauth_id(&event.oauth_client_id).await {
        Ok(Some(installation)) => Ok(installation),
        Ok(None) => {
            warn!(
                event_name = "hipfrog.webhook.unknown_installation",
                correlation_id = %ctx.correlation_id,
                oauth_id = %event.oauth_client_id,
                "webhook from unknown installation"
            );
            Err(CommandError::UnknownInstallation(event.oauth_client_id.clone()).into())
        }
        Err(error) => {
            error!(
                event_name = "hipfrog.webhook.store_failed",
                correlation_id = %ctx.correlation_id,
                oauth_id = %event.oauth_client_id,
                error = %error,
                "installation lookup failed"
            );
            let failure = ApplicationError::Persistence(error.to_string());
            Err(CommandResult::error(failure.user_message()))
        }
    }
}

async fn hipfrog_command(
    State(state): State<AppState>,
    Json(event): Json<RoomMessageEvent>,
) -> Json<CommandResult> {
    let ctx = request_context();
    let installation = match installation_for_event(&state, &event, &ctx).await {
        Ok(installation) => installation,
        Err(reply) => return Json(reply),
    };

    Json(state.commands.route(&installation, event.text(), &ctx).await)
}

async fn mention(state: &AppState, kind: MentionKind, event: RoomMessageEvent) -> CommandResult {
    let ctx = request_context();
    let installation = match installation_for_event(state, &event, &ctx).await {
        Ok(installation) => installation,
        Err(reply) => return reply,
    };
    let installation = state.with_fresh_access_token(installation, &ctx).await;

    state.mentions.route(kind, &installation, &event, &ctx).await
}

async fn at_role(
    State(state): State<AppState>,
    Json(event): Json<RoomMessageEvent>,
) -> Json<CommandResult> {
    Json(mention(&state, MentionKind::Role, event).await)
}

async fn at_circle(
    State(state): State<AppState>,
    Json(event): Json<RoomMessageEvent>,
) -> Json<CommandResult> {
    Json(mention(&state, MentionKind::Circle, event).await)
}
