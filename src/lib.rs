//! projctl - Developer CLI for project-control deployments
//!
//! This library manages named connections to project-control deployments,
//! stores their credentials, and sends authenticated requests on their
//! behalf.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `connections`: Persisted connection registry, schema migration, gatekeeper discovery
//! - `credentials`: Secret storage in the OS keyring or an insecure file fallback
//! - `auth`: Token grants and the authenticated request dispatcher
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Command handlers invoked by the CLI entrypoint
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use projctl::auth::{AuthSession, RequestDispatcher};
//! use projctl::connections::ConnectionRegistry;
//! use projctl::credentials::CredentialStore;
//! use projctl::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let registry = Arc::new(ConnectionRegistry::from_config(&config)?);
//!     registry.initialize()?;
//!
//!     let http = Arc::new(config.http.build_client()?);
//!     let store = Arc::new(CredentialStore::new(&config)?);
//!     let dispatcher = RequestDispatcher::new(AuthSession::new(http.clone(), registry, store))
//!         .with_rejected_status(config.rejected_token_status());
//!
//!     let request = http.get("http://localhost:8080/api/v1/projects").build()?;
//!     let response = dispatcher.dispatch(request, "local").await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod connections;
pub mod credentials;
pub mod error;
pub mod file_utils;

// Re-export commonly used types
pub use auth::{AuthParams, AuthSession, AuthToken, RequestDispatcher};
pub use config::Config;
pub use connections::{Connection, ConnectionRegistry};
pub use credentials::CredentialStore;
pub use error::{ProjctlError, Result};
