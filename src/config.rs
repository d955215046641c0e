//! Process configuration, read once from the environment at startup.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Immutable process configuration. Built once in `main` and passed by
/// `Arc` into every component constructor; no component reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub imap_host: String,
    pub imap_port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// Seconds between poll cycles (timer starts after a cycle completes).
    pub poll_interval_secs: u64,
    /// Minimum seconds between two accepted requests from the same sender.
    pub cooldown_secs: u64,
    /// Sender domains permitted to submit requests; `*` accepts all.
    pub allowed_domains: Vec<String>,
    pub openai_api_key: SecretString,
    pub openai_model: String,
    pub openai_max_tokens: u32,
    pub weather_api_key: SecretString,
    pub db_path: String,
}

impl Config {
    /// Build configuration from environment variables.
    ///
    /// Missing or malformed required values are the only fatal startup
    /// condition in the whole system.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            imap_host: optional("IMAP_HOST", "imap.gmail.com"),
            imap_port: parsed("IMAP_PORT", 993)?,
            smtp_host: optional("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: parsed("SMTP_PORT", 587)?,
            username: required("SMTP_USERNAME")?,
            password: required("SMTP_PASSWORD")?,
            poll_interval_secs: parsed("INTERVAL", 60)?,
            cooldown_secs: parsed("RATE_LIMIT", 30)?,
            allowed_domains: parse_allowed_domains(&required("ALLOWED_DOMAINS")?),
            openai_api_key: SecretString::from(required("OAI_API_KEY")?),
            openai_model: optional("OAI_MODEL", "gpt-3.5-turbo-0125"),
            openai_max_tokens: parsed("OAI_MAX_TOKENS", 50)?,
            weather_api_key: SecretString::from(required("WEATHER_API_KEY")?),
            db_path: optional("DB_PATH", "db/request_times.db"),
        })
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional numeric variable; present-but-unparseable is fatal
/// rather than silently falling back to the default.
fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?} is not a valid number"),
        }),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated domain list, trimming whitespace and dropping
/// empty entries.
pub fn parse_allowed_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}
