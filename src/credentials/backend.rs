//! Secret storage backends
//!
//! [`KeyringBackend`] stores secrets in the operating system's native
//! credential store (Keychain on macOS, Secret Service on Linux, Windows
//! Credential Manager on Windows). [`InsecureFileBackend`] keeps them in a
//! plain JSON file for headless machines that have no keyring service; it is
//! only used when explicitly enabled.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProjctlError, Result};
use crate::file_utils::{read_if_exists, write_atomic};

/// Storage for secrets addressed by `(service, principal)`
///
/// Implementations receive already-normalized names; they must treat a
/// missing entry as `Ok(None)` on read and as success on delete.
#[cfg_attr(test, mockall::automock)]
pub trait SecretBackend: Send + Sync {
    /// Creates or overwrites a secret
    fn set(&self, service: &str, principal: &str, secret: &str) -> Result<()>;

    /// Reads a secret, `Ok(None)` when absent
    fn get(&self, service: &str, principal: &str) -> Result<Option<String>>;

    /// Deletes a secret; absence is not an error
    fn delete(&self, service: &str, principal: &str) -> Result<()>;
}

/// Backend using the OS native keyring
///
/// The keyring is stateless from the caller's point of view; this is a
/// zero-field accessor.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringBackend;

impl SecretBackend for KeyringBackend {
    fn set(&self, service: &str, principal: &str, secret: &str) -> Result<()> {
        let entry = keyring::Entry::new(service, principal).map_err(ProjctlError::Keyring)?;
        entry.set_password(secret).map_err(ProjctlError::Keyring)?;
        Ok(())
    }

    fn get(&self, service: &str, principal: &str) -> Result<Option<String>> {
        let entry = keyring::Entry::new(service, principal).map_err(ProjctlError::Keyring)?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ProjctlError::Keyring(e).into()),
        }
    }

    fn delete(&self, service: &str, principal: &str) -> Result<()> {
        let entry = keyring::Entry::new(service, principal).map_err(ProjctlError::Keyring)?;
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ProjctlError::Keyring(e).into()),
        }
    }
}

/// One record of the insecure keyring file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct InsecureSecret {
    service: String,
    principal: String,
    secret: String,
}

/// Backend storing secrets unencrypted in a JSON array on disk
///
/// Every change rewrites the whole file atomically with owner-only
/// permissions.
///
/// # Examples
///
/// ```
/// use projctl::credentials::backend::{InsecureFileBackend, SecretBackend};
///
/// let dir = tempfile::tempdir().unwrap();
/// let backend = InsecureFileBackend::new(dir.path().join("insecure-keyring.json"));
/// backend.set("org.projctl.k3x9", "alice", "hunter2").unwrap();
/// assert_eq!(
///     backend.get("org.projctl.k3x9", "alice").unwrap().as_deref(),
///     Some("hunter2")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct InsecureFileBackend {
    path: PathBuf,
}

impl InsecureFileBackend {
    /// Creates a backend bound to the given file
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<InsecureSecret>> {
        match read_if_exists(&self.path)? {
            None => Ok(Vec::new()),
            Some(contents) if contents.trim().is_empty() => Ok(Vec::new()),
            Some(contents) => serde_json::from_str(&contents).map_err(|e| {
                ProjctlError::FileParse(format!(
                    "insecure keyring {} is not valid: {}",
                    self.path.display(),
                    e
                ))
                .into()
            }),
        }
    }

    fn save(&self, records: &[InsecureSecret]) -> Result<()> {
        let body = serde_json::to_vec_pretty(records)
            .map_err(|e| ProjctlError::FileWrite(format!("failed to encode secrets: {}", e)))?;
        write_atomic(&self.path, &body)
    }
}

impl SecretBackend for InsecureFileBackend {
    fn set(&self, service: &str, principal: &str, secret: &str) -> Result<()> {
        let mut records = self.load()?;
        match records
            .iter_mut()
            .find(|r| r.service == service && r.principal == principal)
        {
            Some(record) => record.secret = secret.to_string(),
            None => records.push(InsecureSecret {
                service: service.to_string(),
                principal: principal.to_string(),
                secret: secret.to_string(),
            }),
        }
        self.save(&records)
    }

    fn get(&self, service: &str, principal: &str) -> Result<Option<String>> {
        Ok(self
            .load()?
            .into_iter()
            .find(|r| r.service == service && r.principal == principal)
            .map(|r| r.secret))
    }

    fn delete(&self, service: &str, principal: &str) -> Result<()> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| !(r.service == service && r.principal == principal));
        if records.len() != before {
            self.save(&records)?;
        }
        Ok(())
    }
}
