use hipfrog_core::config::AppConfig;
use hipfrog_db::migrations;
use serde::Serialize;

use crate::commands::{load_config, with_database, CommandResult, Failure};

const FAILED_EXIT_CODE: u8 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Verdict {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct Finding {
    check: &'static str,
    verdict: Verdict,
    details: String,
}

impl Finding {
    fn from_result(check: &'static str, result: Result<String, String>) -> Self {
        match result {
            Ok(details) => Self { check, verdict: Verdict::Pass, details },
            Err(details) => Self { check, verdict: Verdict::Fail, details },
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    healthy: bool,
    findings: Vec<Finding>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = examine();
    let exit_code = if report.healthy { 0 } else { FAILED_EXIT_CODE };
    let output = if json_output {
        serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("{{\"healthy\":false,\"error\":{:?}}}", error.to_string()))
    } else {
        render_text(&report)
    };

    CommandResult { exit_code, output }
}

fn examine() -> Report {
    let findings = match load_config() {
        Ok(config) => vec![
            Finding {
                check: "config_validation",
                verdict: Verdict::Pass,
                details: "configuration loaded and validated".to_string(),
            },
            Finding::from_result("public_url", public_url(&config)),
            Finding::from_result("database_schema", database_schema(&config)),
        ],
        Err(failure) => {
            let mut findings = vec![Finding::from_result("config_validation", Err(describe(failure)))];
            findings.extend(["public_url", "database_schema"].map(|check| Finding {
                check,
                verdict: Verdict::Skipped,
                details: "configuration did not load".to_string(),
            }));
            findings
        }
    };

    let healthy = findings.iter().all(|finding| finding.verdict == Verdict::Pass);
    Report { healthy, findings }
}

/// The chat platform fetches the descriptor and posts webhooks over HTTPS only;
/// plain HTTP is accepted for loopback development.
fn public_url(config: &AppConfig) -> Result<String, String> {
    let public_url = config.server.public_url.trim();
    let loopback = ["http://localhost", "http://127.0.0.1"]
        .iter()
        .any(|prefix| public_url.starts_with(prefix));

    if public_url.starts_with("https://") || loopback {
        Ok(format!("descriptor advertised at {}", config.server.public_link("/capabilities.json")))
    } else {
        Err(format!("`{public_url}` is not https; the chat platform will refuse to install it"))
    }
}

fn database_schema(config: &AppConfig) -> Result<String, String> {
    let pending = with_database(config, |pool| async move {
        migrations::pending_versions(&pool)
            .await
            .map_err(|error| Failure::DbQuery(format!("failed to read migration state: {error}")))
    })
    .map_err(describe)?;

    if pending.is_empty() {
        Ok(format!("connected to `{}` with all migrations applied", config.database.url))
    } else {
        Err(format!("{} migration(s) pending; run `hipfrog migrate`", pending.len()))
    }
}

fn describe(failure: Failure) -> String {
    match failure {
        Failure::DbConnect(message) => format!("failed to connect to database: {message}"),
        Failure::Config(message)
        | Failure::Runtime(message)
        | Failure::Migration(message)
        | Failure::DbQuery(message) => message,
    }
}

fn render_text(report: &Report) -> String {
    let headline = if report.healthy {
        "doctor: all readiness checks passed"
    } else {
        "doctor: one or more readiness checks failed"
    };

    std::iter::once(headline.to_string())
        .chain(report.findings.iter().map(|finding| {
            let marker = match finding.verdict {
                Verdict::Pass => "ok",
                Verdict::Fail => "fail",
                Verdict::Skipped => "skip",
            };
            format!("- [{marker}] {}: {}", finding.check, finding.details)
        }))
        .collect::<Vec<_>>()
        .join("\n")
}
