use chrono::{DateTime, Utc};
use hipfrog_core::Installation;
use hipfrog_db::{InstallationRepository, SqlInstallationRepository};
use serde::Serialize;

use crate::commands::{load_config, with_database, CommandResult, Failure};

/// What an operator may see about a tenant; credentials never leave the store.
#[derive(Debug, Serialize)]
struct InstallationSummary {
    oauth_id: String,
    room_id: i64,
    group_id: i64,
    group_name: Option<String>,
    glassfrog_token_configured: bool,
    access_token_expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Installation> for InstallationSummary {
    fn from(installation: &Installation) -> Self {
        Self {
            oauth_id: installation.oauth_id.clone(),
            room_id: installation.room_id,
            group_id: installation.group_id,
            group_name: installation.group_name.clone(),
            glassfrog_token_configured: installation.glassfrog_token().is_some(),
            access_token_expires_at: installation.token_expires_at,
            created_at: installation.created_at,
            updated_at: installation.updated_at,
        }
    }
}

pub fn run() -> CommandResult {
    let outcome = load_config().and_then(|config| {
        with_database(&config, |pool| async move {
            SqlInstallationRepository::new(pool)
                .list()
                .await
                .map_err(|error| Failure::DbQuery(error.to_string()))
        })
    });

    CommandResult::from_outcome(
        "installations",
        outcome.map(|installations| {
            let configured =
                installations.iter().filter(|item| item.glassfrog_token().is_some()).count();
            let summaries: Vec<InstallationSummary> =
                installations.iter().map(InstallationSummary::from).collect();
            (
                format!("{} installation(s), {configured} with a GlassFrog token", summaries.len()),
                serde_json::to_value(summaries).ok(),
            )
        }),
    )
}
