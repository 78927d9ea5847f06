//! Gatekeeper environment discovery
//!
//! Every remote deployment sits behind a gatekeeper that reports which
//! authorization server, realm, and client id the deployment trusts. The
//! connection registry queries it whenever a connection is added or updated
//! so that the stored auth parameters always come from the deployment
//! itself.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ProjctlError, Result};

/// Path of the discovery endpoint relative to a connection url
pub const ENVIRONMENT_PATH: &str = "/api/v1/gatekeeper/environment";

/// Authorization parameters reported by a deployment's gatekeeper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatekeeperEnvironment {
    /// Base url of the authorization server
    pub auth_url: String,
    /// Realm the deployment's users live in
    pub realm: String,
    /// OAuth client id the CLI must present
    pub client_id: String,
}

/// Builds the discovery url for a connection url
///
/// Trailing slashes on the connection url are ignored.
///
/// # Errors
///
/// Returns [`ProjctlError::ConnectionDiscovery`] if the result is not a
/// valid absolute url.
pub fn environment_url(connection_url: &str) -> Result<Url> {
    let raw = format!("{}{}", connection_url.trim_end_matches('/'), ENVIRONMENT_PATH);
    Url::parse(&raw).map_err(|e| {
        ProjctlError::ConnectionDiscovery(format!("invalid connection url '{}': {}", connection_url, e))
            .into()
    })
}

/// Queries a deployment's gatekeeper for its authorization parameters
///
/// # Arguments
///
/// * `http` - HTTP client honoring the caller's timeout
/// * `connection_url` - Base url of the deployment
///
/// # Errors
///
/// Returns [`ProjctlError::ConnectionDiscovery`] if the gatekeeper cannot be
/// reached, answers with a non-success status, or returns a body that does
/// not describe an environment.
///
/// # Examples
///
/// ```no_run
/// use projctl::connections::gatekeeper::fetch_environment;
///
/// # async fn example() -> projctl::Result<()> {
/// let http = reqwest::Client::new();
/// let env = fetch_environment(&http, "https://staging.example.com").await?;
/// println!("realm: {}", env.realm);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_environment(
    http: &reqwest::Client,
    connection_url: &str,
) -> Result<GatekeeperEnvironment> {
    let url = environment_url(connection_url)?;
    tracing::debug!("Discovering gatekeeper environment at {}", url);

    let resp = http
        .get(url.clone())
        .send()
        .await
        .map_err(|e| ProjctlError::ConnectionDiscovery(format!("{} unreachable: {}", url, e)))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProjctlError::ConnectionDiscovery(format!(
            "{} returned {}: {}",
            url, status, body
        ))
        .into());
    }

    let env: GatekeeperEnvironment = resp.json().await.map_err(|e| {
        ProjctlError::ConnectionDiscovery(format!("failed to parse response from {}: {}", url, e))
    })?;

    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_url_appends_path() {
        let url = environment_url("https://staging.example.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://staging.example.com/api/v1/gatekeeper/environment"
        );
    }

    #[test]
    fn test_environment_url_ignores_trailing_slash() {
        let url = environment_url("https://staging.example.com/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://staging.example.com/api/v1/gatekeeper/environment"
        );
    }

    #[test]
    fn test_environment_url_rejects_relative_url() {
        let err = environment_url("not a url").unwrap_err();
        let typed = err.downcast_ref::<ProjctlError>().unwrap();
        assert_eq!(typed.tag(), "con_discovery");
    }

    #[test]
    fn test_environment_deserializes() {
        let json = r#"{"auth_url":"https://auth.example.com","realm":"dev","client_id":"projctl-cli"}"#;
        let env: GatekeeperEnvironment = serde_json::from_str(json).unwrap();
        assert_eq!(env.auth_url, "https://auth.example.com");
        assert_eq!(env.realm, "dev");
        assert_eq!(env.client_id, "projctl-cli");
    }
}
