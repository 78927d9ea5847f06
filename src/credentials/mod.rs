//! Credential persistence
//!
//! Secrets (passwords and OAuth tokens) are addressed by a connection id and
//! a principal. The principal is either a username or one of the reserved
//! token kinds [`ACCESS_TOKEN`] and [`REFRESH_TOKEN`]. Every secret lives
//! under the service name `<prefix>.<lowercased connection id>` with the
//! lowercased principal as key, so connections never collide and all of a
//! connection's secrets can be cleaned up together.
//!
//! The backend is chosen once per process from [`Config`]: the OS keyring
//! by default, or the insecure JSON file when `keyring.insecure` is set.

pub mod backend;

use crate::config::Config;
use crate::error::{ProjctlError, Result};

use self::backend::{InsecureFileBackend, KeyringBackend, SecretBackend};

/// Principal under which a connection's access token is stored
pub const ACCESS_TOKEN: &str = "access_token";

/// Principal under which a connection's refresh token is stored
pub const REFRESH_TOKEN: &str = "refresh_token";

/// Namespaced accessor for connection secrets
///
/// # Examples
///
/// ```
/// use projctl::credentials::CredentialStore;
/// use projctl::credentials::backend::InsecureFileBackend;
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = CredentialStore::with_backend(
///     Box::new(InsecureFileBackend::new(dir.path().join("secrets.json"))),
///     "org.projctl",
/// );
///
/// store.put("K3X9", "Alice", "hunter2").unwrap();
/// assert_eq!(store.get("k3x9", "alice").unwrap(), "hunter2");
/// ```
pub struct CredentialStore {
    backend: Box<dyn SecretBackend>,
    service_prefix: String,
}

impl CredentialStore {
    /// Creates the store selected by the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::Config`] if the insecure keyring is enabled but
    /// its file location cannot be determined.
    pub fn new(config: &Config) -> Result<Self> {
        let backend: Box<dyn SecretBackend> = if config.keyring.insecure {
            let path = config.insecure_keyring_file()?;
            tracing::debug!("Using insecure keyring at {}", path.display());
            Box::new(InsecureFileBackend::new(path))
        } else {
            Box::new(KeyringBackend)
        };
        Ok(Self::with_backend(backend, config.keyring.service_prefix.clone()))
    }

    /// Creates a store over an explicit backend
    pub fn with_backend<S: Into<String>>(backend: Box<dyn SecretBackend>, service_prefix: S) -> Self {
        Self {
            backend,
            service_prefix: service_prefix.into(),
        }
    }

    /// Service name holding the secrets of a connection
    pub fn service_name(&self, connection_id: &str) -> String {
        format!(
            "{}.{}",
            self.service_prefix,
            connection_id.trim().to_lowercase()
        )
    }

    /// Stores a secret and verifies it can be read back unchanged
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::PasswordReadback`] if the value read back
    /// differs from the one written, or the backend's own error.
    pub fn put(&self, connection_id: &str, principal: &str, secret: &str) -> Result<()> {
        let service = self.service_name(connection_id);
        let principal = principal.trim().to_lowercase();

        self.backend.set(&service, &principal, secret)?;

        match self.backend.get(&service, &principal)? {
            Some(stored) if stored == secret => {
                tracing::debug!("Stored secret '{}' under {}", principal, service);
                Ok(())
            }
            _ => Err(ProjctlError::PasswordReadback {
                connection_id: connection_id.to_string(),
                principal,
            }
            .into()),
        }
    }

    /// Reads a secret
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::SecretNotFound`] if nothing is stored, or the
    /// backend's own error if it is unavailable.
    pub fn get(&self, connection_id: &str, principal: &str) -> Result<String> {
        let service = self.service_name(connection_id);
        let principal = principal.trim().to_lowercase();

        self.backend.get(&service, &principal)?.ok_or_else(|| {
            ProjctlError::SecretNotFound {
                connection_id: connection_id.to_string(),
                principal,
            }
            .into()
        })
    }

    /// Deletes a secret; absence is not an error
    pub fn delete(&self, connection_id: &str, principal: &str) -> Result<()> {
        let service = self.service_name(connection_id);
        let principal = principal.trim().to_lowercase();
        self.backend.delete(&service, &principal)
    }

    /// Deletes every secret the CLI stores for a connection
    ///
    /// Removes both tokens and, when given, the username's password. Failures
    /// are logged and otherwise ignored.
    pub fn clear_connection(&self, connection_id: &str, username: Option<&str>) {
        let principals = [Some(ACCESS_TOKEN), Some(REFRESH_TOKEN), username];
        for principal in principals.into_iter().flatten() {
            if principal.trim().is_empty() {
                continue;
            }
            if let Err(e) = self.delete(connection_id, principal) {
                tracing::warn!(
                    "Failed to delete secret '{}' for connection '{}': {}",
                    principal,
                    connection_id,
                    e
                );
            }
        }
    }
}
