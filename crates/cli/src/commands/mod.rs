pub mod config;
pub mod doctor;
pub mod installations;
pub mod migrate;

use std::future::Future;

use hipfrog_core::config::{AppConfig, LoadOptions};
use hipfrog_db::connection::connect_from_config;
use hipfrog_db::DbPool;
use serde::Serialize;
use serde_json::Value;

/// Printed payload plus process exit code.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// Operator-facing failure classes; each maps to a stable exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Config(String),
    Runtime(String),
    DbConnect(String),
    Migration(String),
    DbQuery(String),
}

impl Failure {
    pub fn class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::Runtime(_) => "runtime_init",
            Self::DbConnect(_) => "db_connectivity",
            Self::Migration(_) => "migration",
            Self::DbQuery(_) => "db_query",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Runtime(_) => 3,
            Self::DbConnect(_) => 4,
            Self::Migration(_) => 5,
            Self::DbQuery(_) => 6,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config(message)
            | Self::Runtime(message)
            | Self::DbConnect(message)
            | Self::Migration(message)
            | Self::DbQuery(message) => message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'static str>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: &str, data: Option<Value>) -> Self {
        let payload = Payload { command, status: Status::Ok, error_class: None, message, data };
        Self { exit_code: 0, output: render(&payload) }
    }

    pub fn failure(command: &str, failure: &Failure) -> Self {
        let payload = Payload {
            command,
            status: Status::Error,
            error_class: Some(failure.class()),
            message: failure.message(),
            data: None,
        };
        Self { exit_code: failure.exit_code(), output: render(&payload) }
    }

    pub fn from_outcome(command: &str, outcome: Result<(String, Option<Value>), Failure>) -> Self {
        match outcome {
            Ok((message, data)) => Self::success(command, &message, data),
            Err(failure) => Self::failure(command, &failure),
        }
    }
}

pub(crate) fn load_config() -> Result<AppConfig, Failure> {
    AppConfig::load(LoadOptions::default())
        .map_err(|error| Failure::Config(format!("configuration issue: {error}")))
}

/// Runs `work` against a freshly opened pool on a current-thread runtime,
/// closing the pool afterwards.
pub(crate) fn with_database<T, F, Fut>(config: &AppConfig, work: F) -> Result<T, Failure>
where
    F: FnOnce(DbPool) -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| Failure::Runtime(format!("failed to initialize async runtime: {error}")))?;

    runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| Failure::DbConnect(error.to_string()))?;
        let outcome = work(pool.clone()).await;
        pool.close().await;
        outcome
    })
}

fn render(payload: &Payload<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!("{{\"status\":\"error\",\"error_class\":\"serialization\",\"message\":{:?}}}", error.to_string())
    })
}
