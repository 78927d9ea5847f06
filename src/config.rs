//! Configuration management for projctl
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ProjctlError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the persisted connection registry inside the config directory
pub const CONNECTIONS_FILE_NAME: &str = "connections.json";

/// File name of the insecure keyring inside the config directory
pub const INSECURE_KEYRING_FILE_NAME: &str = "insecure-keyring.json";

/// Main configuration structure for projctl
///
/// This structure holds everything the core needs that is not part of the
/// connection registry itself: where files live, which credential backend to
/// use, how the authorization server signals a rejected bearer token, and
/// how long network calls may take.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,
    /// Credential backend selection
    #[serde(default)]
    pub keyring: KeyringConfig,
    /// Authorization behaviour
    #[serde(default)]
    pub auth: AuthConfig,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// File location configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the connection file and the insecure keyring
    ///
    /// When unset, the per-user configuration directory is used.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

/// Credential backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyringConfig {
    /// Store secrets in a plain JSON file instead of the OS keyring
    ///
    /// Only meant for headless environments without a keyring service.
    #[serde(default)]
    pub insecure: bool,

    /// Prefix of every keyring service name
    #[serde(default = "default_service_prefix")]
    pub service_prefix: String,
}

fn default_service_prefix() -> String {
    "org.projctl".to_string()
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            insecure: false,
            service_prefix: default_service_prefix(),
        }
    }
}

/// Authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Status code the deployment answers with when a bearer token is
    /// rejected
    ///
    /// The gatekeeper in front of a deployment redirects to its login page
    /// instead of answering 401, so the default is 302.
    #[serde(default = "default_rejected_token_status")]
    pub rejected_token_status: u16,
}

fn default_rejected_token_status() -> u16 {
    302
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            rejected_token_status: default_rejected_token_status(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every request (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl HttpConfig {
    /// Builds the HTTP client used for every outgoing call
    ///
    /// Redirects are never followed: a redirect is how a deployment reports
    /// a rejected bearer token, and following it would hide that signal.
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::Http`] if the TLS backend cannot be initialized.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ProjctlError::Http)?;
        Ok(client)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Parse a YAML configuration file
    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProjctlError::Config(format!("Failed to read {}: {}", path, e)))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(dir) = std::env::var("PROJCTL_CONFIG_DIR") {
            if !dir.trim().is_empty() {
                self.paths.config_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(insecure) = std::env::var("PROJCTL_INSECURE_KEYRING") {
            match insecure.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.keyring.insecure = true,
                "0" | "false" | "no" => self.keyring.insecure = false,
                _ => tracing::warn!("Invalid PROJCTL_INSECURE_KEYRING: {}", insecure),
            }
        }

        if let Ok(prefix) = std::env::var("PROJCTL_KEYRING_SERVICE_PREFIX") {
            self.keyring.service_prefix = prefix;
        }

        if let Ok(status) = std::env::var("PROJCTL_REJECTED_TOKEN_STATUS") {
            if let Ok(value) = status.parse() {
                self.auth.rejected_token_status = value;
            } else {
                tracing::warn!("Invalid PROJCTL_REJECTED_TOKEN_STATUS: {}", status);
            }
        }

        if let Ok(timeout) = std::env::var("PROJCTL_HTTP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.http.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid PROJCTL_HTTP_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if cli.insecure_keyring {
            self.keyring.insecure = true;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.keyring.service_prefix.trim().is_empty() {
            return Err(
                ProjctlError::Config("keyring.service_prefix cannot be empty".to_string()).into(),
            );
        }

        match reqwest::StatusCode::from_u16(self.auth.rejected_token_status) {
            Ok(status) if status.is_success() => {
                return Err(ProjctlError::Config(format!(
                    "auth.rejected_token_status cannot be a success status: {}",
                    status
                ))
                .into());
            }
            Ok(_) => {}
            Err(_) => {
                return Err(ProjctlError::Config(format!(
                    "auth.rejected_token_status is not a valid HTTP status: {}",
                    self.auth.rejected_token_status
                ))
                .into());
            }
        }

        if self.http.timeout_seconds == 0 {
            return Err(ProjctlError::Config(
                "http.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Directory holding the connection file and the insecure keyring
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::Config`] if no directory is configured and the
    /// per-user configuration directory cannot be determined.
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.paths.config_dir {
            return Ok(dir.clone());
        }
        let proj_dirs = ProjectDirs::from("org", "projctl", "projctl").ok_or_else(|| {
            ProjctlError::Config("Could not determine configuration directory".into())
        })?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Path of the persisted connection registry
    pub fn connections_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(CONNECTIONS_FILE_NAME))
    }

    /// Path of the insecure keyring file
    pub fn insecure_keyring_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(INSECURE_KEYRING_FILE_NAME))
    }

    /// Status code signalling a rejected bearer token
    pub fn rejected_token_status(&self) -> reqwest::StatusCode {
        reqwest::StatusCode::from_u16(self.auth.rejected_token_status)
            .unwrap_or(reqwest::StatusCode::FOUND)
    }
}
