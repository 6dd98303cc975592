use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_CANDIDATES: [&str; 2] = ["hipfrog.toml", "config/hipfrog.toml"];

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub glassfrog: GlassfrogConfig,
    pub hipchat: HipchatConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Externally reachable base URL; every link in the capabilities descriptor hangs off it.
    pub public_url: String,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GlassfrogConfig {
    pub api_url: String,
    pub app_url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HipchatConfig {
    pub addon_key: String,
    pub addon_name: String,
    pub install_url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Programmatic values applied after file and environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub public_url: Option<String>,
    pub glassfrog_api_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("config file references unset environment variable `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated `${{...}}` expression in config file")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://hipfrog.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 45277,
            public_url: "http://localhost:45277".to_string(),
            graceful_shutdown_secs: 15,
        }
    }
}

impl Default for GlassfrogConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.glassfrog.com/api/v3".to_string(),
            app_url: "https://app.glassfrog.com".to_string(),
        }
    }
}

impl Default for HipchatConfig {
    fn default() -> Self {
        Self {
            addon_key: "hipfrog".to_string(),
            addon_name: "Hipfrog".to_string(),
            install_url: "https://www.hipchat.com/addons/install".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ServerConfig {
    /// `public_url` joined with `path`, without doubling the slash.
    pub fn public_link(&self, path: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Shape of `hipfrog.toml`: every section optional, every key defaulted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    database: DatabaseConfig,
    server: ServerConfig,
    glassfrog: GlassfrogConfig,
    hipchat: HipchatConfig,
    logging: LoggingConfig,
}

impl From<FileConfig> for AppConfig {
    fn from(file: FileConfig) -> Self {
        Self {
            database: file.database,
            server: file.server,
            glassfrog: file.glassfrog,
            hipchat: file.hipchat,
            logging: file.logging,
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then `HIPFROG_*` variables, then `overrides`.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match locate_file(options.config_path.as_deref()) {
            Some(path) => Self::from(read_file(&path)?),
            None if options.require_file => {
                let expected =
                    options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_CANDIDATES[0]));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => Self::default(),
        };

        config.apply_env()?;
        config.apply_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        set_from_env(&mut self.database.url, &["HIPFROG_DATABASE_URL"])?;
        set_from_env(&mut self.database.max_connections, &["HIPFROG_DATABASE_MAX_CONNECTIONS"])?;
        set_from_env(&mut self.database.timeout_secs, &["HIPFROG_DATABASE_TIMEOUT_SECS"])?;

        set_from_env(&mut self.server.bind_address, &["HIPFROG_SERVER_BIND_ADDRESS"])?;
        set_from_env(&mut self.server.port, &["HIPFROG_SERVER_PORT"])?;
        set_from_env(&mut self.server.public_url, &["HIPFROG_SERVER_PUBLIC_URL", "PUBLIC_URL"])?;
        set_from_env(
            &mut self.server.graceful_shutdown_secs,
            &["HIPFROG_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        )?;

        set_from_env(&mut self.glassfrog.api_url, &["HIPFROG_GLASSFROG_API_URL"])?;
        set_from_env(&mut self.glassfrog.app_url, &["HIPFROG_GLASSFROG_APP_URL"])?;

        set_from_env(&mut self.hipchat.addon_key, &["HIPFROG_HIPCHAT_ADDON_KEY"])?;
        set_from_env(&mut self.hipchat.addon_name, &["HIPFROG_HIPCHAT_ADDON_NAME"])?;
        set_from_env(&mut self.hipchat.install_url, &["HIPFROG_HIPCHAT_INSTALL_URL"])?;

        set_from_env(&mut self.logging.level, &["HIPFROG_LOGGING_LEVEL", "HIPFROG_LOG_LEVEL"])?;
        if let Some((_, value)) = first_env(&["HIPFROG_LOGGING_FORMAT", "HIPFROG_LOG_FORMAT"]) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides { database_url, log_level, bind_address, port, public_url, glassfrog_api_url } =
            overrides;

        replace(&mut self.database.url, database_url);
        replace(&mut self.logging.level, log_level);
        replace(&mut self.server.bind_address, bind_address);
        replace(&mut self.server.port, port);
        replace(&mut self.server.public_url, public_url);
        replace(&mut self.glassfrog.api_url, glassfrog_api_url);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        if !(url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:") {
            return Err(invalid(
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections must be greater than zero"));
        }
        if !(1..=300).contains(&self.database.timeout_secs) {
            return Err(invalid("database.timeout_secs must be in range 1..=300"));
        }

        if self.server.port == 0 {
            return Err(invalid("server.port must be greater than zero"));
        }
        if self.server.graceful_shutdown_secs == 0 {
            return Err(invalid("server.graceful_shutdown_secs must be greater than zero"));
        }
        if self.hipchat.addon_key.trim().is_empty() {
            return Err(invalid("hipchat.addon_key must not be empty"));
        }

        for (field, value) in [
            ("server.public_url", &self.server.public_url),
            ("glassfrog.api_url", &self.glassfrog.api_url),
            ("glassfrog.app_url", &self.glassfrog.app_url),
            ("hipchat.install_url", &self.hipchat.install_url),
        ] {
            let value = value.trim();
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(invalid(&format!("{field} must start with http:// or https://")));
            }
        }

        match self.logging.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(invalid("logging.level must be one of trace|debug|info|warn|error")),
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_string())
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn locate_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => CONFIG_CANDIDATES.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&interpolate(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references from the process environment.
fn interpolate(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

/// First non-blank variable among `keys`, with the key that supplied it.
fn first_env(keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    })
}

fn set_from_env<T>(slot: &mut T, keys: &[&'static str]) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some((key, value)) = first_env(keys) {
        *slot = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.clone(),
        })?;
    }
    Ok(())
}
