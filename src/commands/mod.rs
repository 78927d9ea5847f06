/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `connections` — Connection registry management
- `secure`      — Login, token refresh and logout
- `request`     — Authenticated requests through the dispatcher

Handlers share a [`Context`] built once per process from the loaded
configuration.
*/

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{AuthSession, RequestDispatcher};
use crate::config::Config;
use crate::connections::{Connection, ConnectionRegistry};
use crate::credentials::CredentialStore;
use crate::error::{ProjctlError, Result};

pub mod connections;
pub mod request;
pub mod secure;

/// Collaborators shared by every command handler
pub struct Context {
    /// Validated configuration
    pub config: Config,
    /// Connection registry, initialized
    pub registry: Arc<ConnectionRegistry>,
    /// Credential store selected by the configuration
    pub store: Arc<CredentialStore>,
    /// HTTP client with the configured timeout and redirects disabled
    pub http: Arc<reqwest::Client>,
    /// Print results as JSON
    pub json: bool,
}

impl Context {
    /// Builds the shared collaborators and initializes the connection file
    ///
    /// # Errors
    ///
    /// Returns the first failure among client construction, credential
    /// backend selection, and connection file initialization.
    pub fn new(config: Config, json: bool) -> Result<Self> {
        let http = Arc::new(config.http.build_client()?);
        let store = Arc::new(CredentialStore::new(&config)?);
        let registry = Arc::new(ConnectionRegistry::from_config(&config)?);
        registry.initialize()?;

        Ok(Self {
            config,
            registry,
            store,
            http,
            json,
        })
    }

    /// Auth session over the shared collaborators
    pub fn session(&self) -> AuthSession {
        AuthSession::new(
            self.http.clone(),
            self.registry.clone(),
            self.store.clone(),
        )
    }

    /// Request dispatcher honoring the configured rejected-token status
    pub fn dispatcher(&self) -> RequestDispatcher {
        RequestDispatcher::new(self.session())
            .with_rejected_status(self.config.rejected_token_status())
    }

    /// Resolves an optional `--conid` to a connection, defaulting to the
    /// active one
    pub fn resolve_connection(&self, conid: Option<&str>) -> Result<Connection> {
        match conid {
            Some(id) => self.registry.get_by_id(id),
            None => self.registry.active(),
        }
    }
}

/// Machine-readable error report
///
/// Serialized as `{"error": <tag>, "error_description": <description>}`,
/// the same shape authorization servers use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Stable error tag
    pub error: String,
    /// Human-readable description
    pub error_description: String,
}

impl ErrorReport {
    /// Builds a report from any error, recovering typed errors when possible
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ProjctlError>() {
            Some(typed) => Self {
                error: typed.tag().to_string(),
                error_description: typed.description(),
            },
            None => Self {
                error: "unknown_error".to_string(),
                error_description: format!("{:#}", err),
            },
        }
    }

    /// Renders the report as printed on stderr
    pub fn render(&self, json: bool) -> String {
        if json {
            serde_json::to_string(self).unwrap_or_else(|_| {
                format!(
                    r#"{{"error":"{}","error_description":"{}"}}"#,
                    self.error, self.error_description
                )
            })
        } else {
            format!("Error [{}]: {}", self.error, self.error_description)
        }
    }
}

/// Prints a serializable value as pretty JSON on stdout
///
/// # Errors
///
/// Returns `ProjctlError::Serialization` if serialization fails
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(ProjctlError::Serialization)?;
    println!("{}", json);
    Ok(())
}
