use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use hipfrog_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key: "database.url",
            value: redact_url_credentials(&config.database.url),
            env_keys: &["HIPFROG_DATABASE_URL"],
        },
        Field {
            key: "database.max_connections",
            value: config.database.max_connections.to_string(),
            env_keys: &["HIPFROG_DATABASE_MAX_CONNECTIONS"],
        },
        Field {
            key: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            env_keys: &["HIPFROG_DATABASE_TIMEOUT_SECS"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["HIPFROG_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["HIPFROG_SERVER_PORT"],
        },
        Field {
            key: "server.public_url",
            value: config.server.public_url.clone(),
            env_keys: &["HIPFROG_SERVER_PUBLIC_URL", "PUBLIC_URL"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["HIPFROG_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "glassfrog.api_url",
            value: config.glassfrog.api_url.clone(),
            env_keys: &["HIPFROG_GLASSFROG_API_URL"],
        },
        Field {
            key: "glassfrog.app_url",
            value: config.glassfrog.app_url.clone(),
            env_keys: &["HIPFROG_GLASSFROG_APP_URL"],
        },
        Field {
            key: "hipchat.addon_key",
            value: config.hipchat.addon_key.clone(),
            env_keys: &["HIPFROG_HIPCHAT_ADDON_KEY"],
        },
        Field {
            key: "hipchat.addon_name",
            value: config.hipchat.addon_name.clone(),
            env_keys: &["HIPFROG_HIPCHAT_ADDON_NAME"],
        },
        Field {
            key: "hipchat.install_url",
            value: config.hipchat.install_url.clone(),
            env_keys: &["HIPFROG_HIPCHAT_INSTALL_URL"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["HIPFROG_LOGGING_LEVEL", "HIPFROG_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["HIPFROG_LOGGING_FORMAT", "HIPFROG_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("hipfrog.toml"), PathBuf::from("config/hipfrog.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Masks a `user:password@` segment, should a URL carry one.
fn redact_url_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((_, host)) => format!("{scheme}://<redacted>@{host}"),
        None => url.to_string(),
    }
}
