//! The configuration page shown inside the chat platform's add-on settings.
//!
//! Requests carry a `signed_request` JWT: `iss` names the installation and the
//! signature uses that installation's OAuth secret.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tera::Context;
use thiserror::Error;
use tracing::{error, info, warn};

use hipfrog_core::{CommandResult, Installation};
use hipfrog_db::{InstallationRepository, RepositoryError};
use hipfrog_glassfrog::GlassfrogApi;
use hipfrog_hipchat::{messages, EventContext};

use crate::routes::request_context;
use crate::state::{AppState, CONFIGURE_TEMPLATE};

#[derive(Debug, Deserialize)]
pub struct SignedRequestQuery {
    pub signed_request: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfigureForm {
    pub glassfrogtoken: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    iss: String,
}

#[derive(Debug, Error)]
pub enum SignedRequestError {
    #[error("signed request is not a readable JWT: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("signed request names unknown installation `{0}`")]
    UnknownIssuer(String),
    #[error("signed request failed verification: {0}")]
    Verification(#[source] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Resolves the installation named by `iss`, then checks the HS256 signature
/// against that installation's OAuth secret.
pub async fn verify_signed_request<R>(
    repository: &R,
    token: &str,
) -> Result<Installation, SignedRequestError>
where
    R: InstallationRepository + ?Sized,
{
    let mut unverified = Validation::new(Algorithm::HS256);
    unverified.insecure_disable_signature_validation();
    unverified.validate_exp = false;
    unverified.validate_aud = false;
    unverified.required_spec_claims.clear();
    let issuer = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &unverified)
        .map_err(SignedRequestError::Malformed)?
        .claims
        .iss;

    let installation = repository
        .find_by_oauth_id(&issuer)
        .await?
        .ok_or_else(|| SignedRequestError::UnknownIssuer(issuer.clone()))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    validation.set_issuer(&[issuer.as_str()]);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(installation.oauth_secret.expose_secret().as_bytes()),
        &validation,
    )
    .map_err(SignedRequestError::Verification)?;

    Ok(installation)
}

struct Flash {
    message: String,
    ok: bool,
}

async fn authorize(
    state: &AppState,
    signed_request: &str,
    ctx: &EventContext,
) -> Result<Installation, Response> {
    verify_signed_request(state.installations.as_ref(), signed_request).await.map_err(|error| {
        warn!(
            event_name = "hipfrog.configure.unauthorized",
            correlation_id = %ctx.correlation_id,
            error = %error,
            "configuration request rejected"
        );
        unauthorized()
    })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Html("<h1>Unauthorized</h1><p>The configuration request could not be verified.</p>".to_string()),
    )
        .into_response()
}

fn render(
    state: &AppState,
    signed_request: &str,
    glassfrog_token: &str,
    flash: Option<Flash>,
    ctx: &EventContext,
) -> Response {
    let mut context = Context::new();
    context.insert("addon_name", &state.config.hipchat.addon_name);
    context.insert("signed_request", signed_request);
    context.insert("glassfrogtoken", glassfrog_token);
    context.insert("flash", &flash.as_ref().map(|flash| flash.message.as_str()));
    context.insert("flash_ok", &flash.as_ref().is_some_and(|flash| flash.ok));

    match state.templates.render(CONFIGURE_TEMPLATE, &context) {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            error!(
                event_name = "hipfrog.configure.render_failed",
                correlation_id = %ctx.correlation_id,
                error = %error,
                "configuration page could not be rendered"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Configuration page unavailable</h1>".to_string()),
            )
                .into_response()
        }
    }
}

pub async fn page(
    State(state): State<AppState>,
    Query(query): Query<SignedRequestQuery>,
) -> Response {
    let ctx = request_context();
    let installation = match authorize(&state, &query.signed_request, &ctx).await {
        Ok(installation) => installation,
        Err(response) => return response,
    };

    render(
        &state,
        &query.signed_request,
        installation.glassfrog_token().unwrap_or_default(),
        None,
        &ctx,
    )
}

/// Stores the submitted token, then proves it against GlassFrog and reports
/// the outcome both on the page and, when it works, in the room.
pub async fn save(
    State(state): State<AppState>,
    Query(query): Query<SignedRequestQuery>,
    Form(form): Form<ConfigureForm>,
) -> Response {
    let ctx = request_context();
    let mut installation = match authorize(&state, &query.signed_request, &ctx).await {
        Ok(installation) => installation,
        Err(response) => return response,
    };

    let token = form.glassfrogtoken.trim().to_string();
    match state.installations.set_glassfrog_token(&installation.oauth_id, &token, Utc::now()).await
    {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                event_name = "hipfrog.configure.installation_gone",
                correlation_id = %ctx.correlation_id,
                oauth_id = %installation.oauth_id,
                "installation was removed before its token could be stored"
            );
            return unauthorized();
        }
        Err(error) => {
            error!(
                event_name = "hipfrog.configure.store_failed",
                correlation_id = %ctx.correlation_id,
                oauth_id = %installation.oauth_id,
                error = %error,
                "glassfrog token could not be stored"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>The token could not be saved. Please retry.</h1>".to_string()),
            )
                .into_response();
        }
    }
    installation.glassfrog_token = Some(SecretString::from(token.clone()));

    let flash = match state.commands.api().circles(&token).await {
        Ok(_) => {
            info!(
                event_name = "hipfrog.configure.token_verified",
                correlation_id = %ctx.correlation_id,
                oauth_id = %installation.oauth_id,
                "glassfrog token verified"
            );
            let installation = state.with_fresh_access_token(installation.clone(), &ctx).await;
            if let Err(error) = state
                .hipchat
                .send_notification(&installation, &CommandResult::success(messages::CONFIGURED))
                .await
            {
                warn!(
                    event_name = "hipfrog.configure.notification_failed",
                    correlation_id = %ctx.correlation_id,
                    oauth_id = %installation.oauth_id,
                    error = %error,
                    "configured notification was not delivered"
                );
            }
            Flash { message: messages::CONFIGURED_FLASH.to_string(), ok: true }
        }
        Err(error) => {
            warn!(
                event_name = "hipfrog.configure.token_rejected",
                correlation_id = %ctx.correlation_id,
                oauth_id = %installation.oauth_id,
                error = %error,
                "glassfrog token test failed"
            );
            Flash {
                message: messages::token_test_failed(error.status(), &error.to_string()),
                ok: false,
            }
        }
    };

    render(&state, &query.signed_request, &token, Some(flash), &ctx)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use hipfrog_db::InstallationRepository;

    use super::{verify_signed_request, SignedRequestError};
    use crate::state::SharedInstallations;
    use crate::testing::{
        harness, router_with_store, signed_request, stored_installation, FakeHipchat,
        UninstalledOnTokenWrite, OAUTH_SECRET,
    };

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    fn form_post(jwt: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(format!("/configure.html?signed_request={jwt}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("glassfrogtoken={token}")))
            .expect("request")
    }

    #[tokio::test]
    async fn verifies_signature_with_installation_secret() {
        let harness = harness();
        harness.installations.save(stored_installation(None)).await.expect("seed");

        let installation = verify_signed_request(
            harness.installations.as_ref(),
            &signed_request("oauth-1", OAUTH_SECRET),
        )
        .await
        .expect("valid request");
        assert_eq!(installation.oauth_id, "oauth-1");

        let forged = verify_signed_request(
            harness.installations.as_ref(),
            &signed_request("oauth-1", "someone-else"),
        )
        .await;
        assert!(matches!(forged, Err(SignedRequestError::Verification(_))));

        let unknown = verify_signed_request(
            harness.installations.as_ref(),
            &signed_request("oauth-9", OAUTH_SECRET),
        )
        .await;
        assert!(matches!(unknown, Err(SignedRequestError::UnknownIssuer(ref issuer)) if issuer == "oauth-9"));

        let garbage = verify_signed_request(harness.installations.as_ref(), "not-a-jwt").await;
        assert!(matches!(garbage, Err(SignedRequestError::Malformed(_))));
    }

    #[tokio::test]
    async fn page_renders_current_token() {
        let harness = harness();
        harness.installations.save(stored_installation(Some("gf-token"))).await.expect("seed");
        let jwt = signed_request("oauth-1", OAUTH_SECRET);

        let response = harness
            .router()
            .oneshot(
                Request::get(format!("/configure.html?signed_request={jwt}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"name="glassfrogtoken" value="gf-token""#));
        assert!(!html.contains("aui-message"));
    }

    #[tokio::test]
    async fn page_with_bad_signature_is_unauthorized() {
        let harness = harness();
        harness.installations.save(stored_installation(None)).await.expect("seed");
        let jwt = signed_request("oauth-1", "wrong-secret");

        let response = harness
            .router()
            .oneshot(
                Request::get(format!("/configure.html?signed_request={jwt}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn saving_working_token_stores_it_and_notifies_room() {
        let harness = harness();
        harness.installations.save(stored_installation(None)).await.expect("seed");
        let jwt = signed_request("oauth-1", OAUTH_SECRET);

        let response =
            harness.router().oneshot(form_post(&jwt, "gf-token")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("The GlassFrog token works and has been saved."));
        assert!(html.contains("aui-message-success"));

        let stored = harness
            .installations
            .find_by_oauth_id("oauth-1")
            .await
            .expect("lookup")
            .expect("installation");
        assert_eq!(stored.glassfrog_token(), Some("gf-token"));

        let sent = harness.hipchat.notifications();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_success());
    }

    #[tokio::test]
    async fn saving_rejected_token_keeps_it_and_reports_error() {
        let harness = harness();
        harness.installations.save(stored_installation(None)).await.expect("seed");
        let jwt = signed_request("oauth-1", OAUTH_SECRET);

        let response =
            harness.router().oneshot(form_post(&jwt, "stale-token")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(
            "Encountered Error 401 when testing the Glassfrog Token. Message given: &#x27;Invalid API key&#x27;."
        ));
        assert!(html.contains("aui-message-error"));

        let stored = harness
            .installations
            .find_by_oauth_id("oauth-1")
            .await
            .expect("lookup")
            .expect("installation");
        assert_eq!(stored.glassfrog_token(), Some("stale-token"));
        assert!(harness.hipchat.notifications().is_empty());
    }

    #[tokio::test]
    async fn saving_for_installation_removed_mid_request_is_unauthorized() {
        let store = Arc::new(UninstalledOnTokenWrite::default());
        store.save(stored_installation(None)).await.expect("seed");
        let hipchat = Arc::new(FakeHipchat::default());
        let jwt = signed_request("oauth-1", OAUTH_SECRET);

        let router = router_with_store(Arc::clone(&store) as SharedInstallations, Arc::clone(&hipchat));
        let response = router.oneshot(form_post(&jwt, "gf-token")).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!body_text(response).await.contains("has been saved"));
        assert!(store.list().await.expect("list").is_empty());
        assert!(hipchat.notifications().is_empty());
    }
}
