//! Error types for the mailbot.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),
}

/// Configuration-related errors. The only fatal error class: a bad
/// required value aborts startup, nothing else ever does.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// IMAP session errors.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("IMAP login rejected for {username}")]
    AuthRejected { username: String },

    #[error("IMAP protocol error: {0}")]
    Protocol(String),

    #[error("Failed to fetch message {uid}: {reason}")]
    Fetch { uid: u32, reason: String },

    #[error("Failed to relocate message {uid} to {folder}: {reason}")]
    Relocate {
        uid: u32,
        folder: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Report-generation errors. The `Display` text of these is what lands
/// in the error reply sent back to the requester.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Location resolution failed: {0}")]
    Resolve(String),

    #[error("Weather data request failed: {0}")]
    Upstream(String),

    #[error("Generated report was empty")]
    EmptyReport,
}

/// Outbound delivery errors. Logged at the notifier boundary, never
/// propagated past it.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// Result type alias for the mailbot.
pub type Result<T> = std::result::Result<T, Error>;
