use std::sync::Arc;

use chrono::Utc;
use tera::Tera;
use tracing::{info, warn};

use hipfrog_core::config::AppConfig;
use hipfrog_core::{ApplicationError, Installation};
use hipfrog_db::InstallationRepository;
use hipfrog_glassfrog::{AppLinks, GlassfrogApi};
use hipfrog_hipchat::{CommandDispatcher, EventContext, HipchatApi, MentionDispatcher};

pub type SharedGlassfrog = Arc<dyn GlassfrogApi>;
pub type SharedHipchat = Arc<dyn HipchatApi>;
pub type SharedInstallations = Arc<dyn InstallationRepository>;

pub const CONFIGURE_TEMPLATE: &str = "configure.html";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub installations: SharedInstallations,
    pub hipchat: SharedHipchat,
    pub commands: Arc<CommandDispatcher<SharedGlassfrog>>,
    pub mentions: Arc<MentionDispatcher<SharedGlassfrog, SharedHipchat>>,
    pub templates: Arc<Tera>,
}

fn init_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(CONFIGURE_TEMPLATE, include_str!("../../../templates/configure.html"))?;
    Ok(tera)
}

impl AppState {
    pub fn new(
        config: AppConfig,
        installations: SharedInstallations,
        glassfrog: SharedGlassfrog,
        hipchat: SharedHipchat,
    ) -> Result<Self, tera::Error> {
        let links = AppLinks::new(config.glassfrog.app_url.clone());
        Ok(Self {
            commands: Arc::new(CommandDispatcher::new(Arc::clone(&glassfrog), links)),
            mentions: Arc::new(MentionDispatcher::new(glassfrog, Arc::clone(&hipchat))),
            templates: Arc::new(init_templates()?),
            config: Arc::new(config),
            installations,
            hipchat,
        })
    }

    /// Returns the installation with a usable chat access token, renewing and
    /// persisting it when expired. A failed renewal is logged and the stale
    /// installation returned; the chat call that follows reports the rejection.
    pub async fn with_fresh_access_token(
        &self,
        installation: Installation,
        ctx: &EventContext,
    ) -> Installation {
        if !installation.access_token_expired(Utc::now()) {
            return installation;
        }

        match self.renew_access_token(&installation).await {
            Ok(renewed) => {
                info!(
                    event_name = "hipfrog.access_token.renewed",
                    correlation_id = %ctx.correlation_id,
                    oauth_id = %renewed.oauth_id,
                    expires_at = %renewed.token_expires_at.to_rfc3339(),
                    "chat access token renewed"
                );
                renewed
            }
            Err(error) => {
                warn!(
                    event_name = "hipfrog.access_token.renewal_failed",
                    correlation_id = %ctx.correlation_id,
                    oauth_id = %installation.oauth_id,
                    error = %error,
                    "chat access token renewal failed"
                );
                installation
            }
        }
    }

    async fn renew_access_token(
        &self,
        installation: &Installation,
    ) -> Result<Installation, ApplicationError> {
        let grant = self
            .hipchat
            .exchange_token(
                &installation.token_url,
                &installation.oauth_id,
                &installation.oauth_secret,
            )
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;

        let mut renewed = installation.clone();
        renewed.apply_grant(grant, Utc::now());
        self.installations
            .update_access_token(&renewed)
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        Ok(renewed)
    }
}
