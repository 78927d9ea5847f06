//! Error types for projctl
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling. Every variant carries a
//! stable machine-readable tag (see [`ProjctlError::tag`]) so callers and the
//! CLI can branch on the failure kind without parsing messages.

use thiserror::Error;

/// Main error type for projctl operations
///
/// This enum encompasses every failure that can occur while managing
/// connections, reading or writing credentials, talking to an authorization
/// server, and dispatching authenticated requests.
#[derive(Error, Debug)]
pub enum ProjctlError {
    /// Configuration-related errors, including an authentication attempt
    /// that has neither a known connection nor a complete set of parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required command parameter is still empty after resolution
    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    /// No connection with the given id exists
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// The connection is reserved and cannot be updated or removed
    #[error("Connection is protected and cannot be changed: {0}")]
    ConnectionProtected(String),

    /// A label or url is already used by another connection
    #[error("Connection conflict: {0}")]
    ConnectionConflict(String),

    /// The gatekeeper environment endpoint could not be queried
    #[error("Connection discovery failed: {0}")]
    ConnectionDiscovery(String),

    /// A persisted document could not be read
    #[error("File load error: {0}")]
    FileLoad(String),

    /// A persisted document could not be decoded
    #[error("File parse error: {0}")]
    FileParse(String),

    /// A persisted document could not be written
    #[error("File write error: {0}")]
    FileWrite(String),

    /// No secret is stored for the principal on the connection
    #[error("No secret stored for '{principal}' on connection '{connection_id}'")]
    SecretNotFound {
        /// Connection the secret was looked up under
        connection_id: String,
        /// Username or token kind that was looked up
        principal: String,
    },

    /// A secret read back after writing did not match what was written
    #[error("Secret read-back mismatch for '{principal}' on connection '{connection_id}'")]
    PasswordReadback {
        /// Connection the secret was written under
        connection_id: String,
        /// Username or token kind that was written
        principal: String,
    },

    /// The authorization server rejected a grant
    ///
    /// `tag` is the server's own `error` field, `description` its
    /// `error_description`.
    #[error("{tag}: {description}")]
    AuthRejected {
        /// Error code reported by the authorization server
        tag: String,
        /// Human-readable description reported by the authorization server
        description: String,
    },

    /// The token endpoint does not exist (HTTP 404)
    #[error("Authorization endpoint not found: {0}")]
    AuthEndpointNotFound(String),

    /// The authorization service is unavailable (HTTP 503)
    #[error("Authorization service is down: {0}")]
    AuthServiceDown(String),

    /// The authorization server could not be reached at all
    #[error("Authorization server unreachable: {0}")]
    AuthUnreachable(String),

    /// Any other non-success response from the authorization server
    #[error("Unexpected authorization server response {status}: {body}")]
    AuthResponse {
        /// HTTP status returned by the server
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Re-authentication is impossible because no password is cached
    #[error("No password stored for user '{username}' on connection '{connection_id}'")]
    NoPassword {
        /// Connection being dispatched against
        connection_id: String,
        /// Username configured on the connection
        username: String,
    },

    /// Re-authentication with the cached password was rejected
    #[error("Authentication failed for connection '{connection_id}': {source}")]
    AuthFailed {
        /// Connection being dispatched against
        connection_id: String,
        /// The authorization server failure
        source: Box<ProjctlError>,
    },

    /// Every authentication strategy was tried and the request still failed
    #[error("Request to connection '{0}' failed: no other methods of authentication left")]
    AuthExhausted(String),

    /// A request whose body is a single-use stream cannot go through the
    /// authentication cascade
    #[error("Request cannot be re-sent: {0}")]
    RequestNotReplayable(String),

    /// The unauthenticated local deployment could not be reached
    #[error("Request to the local connection failed: {0}")]
    LocalRequestFailed(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl ProjctlError {
    /// Returns the stable machine-readable tag for this error
    ///
    /// For [`ProjctlError::AuthRejected`] this is the authorization server's
    /// own `error` code, so callers branch on the same value the server sent.
    ///
    /// # Examples
    ///
    /// ```
    /// use projctl::ProjctlError;
    ///
    /// let err = ProjctlError::ConnectionProtected("local".to_string());
    /// assert_eq!(err.tag(), "con_protected");
    ///
    /// let err = ProjctlError::AuthRejected {
    ///     tag: "invalid_grant".to_string(),
    ///     description: "Invalid user credentials".to_string(),
    /// };
    /// assert_eq!(err.tag(), "invalid_grant");
    /// ```
    pub fn tag(&self) -> &str {
        match self {
            Self::Config(_) => "config_error",
            Self::MissingParameters(_) => "cli_command",
            Self::ConnectionNotFound(_) => "con_not_found",
            Self::ConnectionProtected(_) => "con_protected",
            Self::ConnectionConflict(_) => "con_conflict",
            Self::ConnectionDiscovery(_) => "con_discovery",
            Self::FileLoad(_) => "file_load",
            Self::FileParse(_) => "file_parse",
            Self::FileWrite(_) => "file_write",
            Self::SecretNotFound { .. } => "secret_not_found",
            Self::PasswordReadback { .. } => "password_readback",
            Self::AuthRejected { tag, .. } => tag,
            Self::AuthEndpointNotFound(_) => "auth_endpoint_not_found",
            Self::AuthServiceDown(_) => "auth_service_down",
            Self::AuthUnreachable(_) => "auth_unreachable",
            Self::AuthResponse { .. } => "auth_response",
            Self::NoPassword { .. } => "no_password",
            Self::AuthFailed { .. } => "auth_failed",
            Self::AuthExhausted(_) => "auth_exhausted",
            Self::RequestNotReplayable(_) => "request_not_replayable",
            Self::LocalRequestFailed(_) => "local_request_failed",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
            Self::Yaml(_) => "yaml_error",
            Self::Http(_) => "http_error",
            Self::Keyring(_) => "keyring_error",
        }
    }

    /// Returns the human-readable description shown next to the tag
    pub fn description(&self) -> String {
        match self {
            Self::AuthRejected { description, .. } => description.clone(),
            other => other.to_string(),
        }
    }

    /// Converts an arbitrary error into a typed one
    ///
    /// Errors that are already a [`ProjctlError`] are returned unchanged;
    /// anything else is treated as the authorization server being unreachable.
    pub fn from_auth_error(err: anyhow::Error) -> Self {
        match err.downcast::<ProjctlError>() {
            Ok(typed) => typed,
            Err(other) => Self::AuthUnreachable(other.to_string()),
        }
    }
}

/// Result type alias for projctl operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Typed failures
/// are recovered with `err.downcast_ref::<ProjctlError>()`.
pub type Result<T> = anyhow::Result<T>;
