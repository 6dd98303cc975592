use hipfrog_db::migrations;

use crate::commands::{load_config, with_database, CommandResult, Failure};

pub fn run() -> CommandResult {
    let outcome = load_config().and_then(|config| {
        with_database(&config, |pool| async move {
            migrations::run_pending(&pool).await.map_err(|error| Failure::Migration(error.to_string()))?;
            migrations::applied_versions(&pool)
                .await
                .map_err(|error| Failure::Migration(error.to_string()))
        })
    });

    CommandResult::from_outcome(
        "migrate",
        outcome.map(|versions| {
            let version = versions.last().copied().unwrap_or(0);
            (format!("applied pending migrations; schema at version {version}"), None)
        }),
    )
}
