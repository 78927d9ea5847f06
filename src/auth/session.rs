//! Password and refresh-token grants against a connection's authorization
//! server
//!
//! Both grants POST a form to
//! `{auth_url}/auth/realms/{realm}/protocol/openid-connect/token` and share
//! one response mapping:
//!
//! | Status      | Result                                                        |
//! |-------------|---------------------------------------------------------------|
//! | 200         | [`AuthToken`] decoded from the body                           |
//! | 400, 401    | [`ProjctlError::AuthRejected`] tagged with the server's error |
//! | 404         | [`ProjctlError::AuthEndpointNotFound`]                        |
//! | 503         | [`ProjctlError::AuthServiceDown`]                             |
//! | other       | [`ProjctlError::AuthResponse`]                                |
//!
//! Successful grants tied to a known connection are written to the
//! [`CredentialStore`] before the token is returned.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::connections::{Connection, ConnectionRegistry};
use crate::credentials::{CredentialStore, ACCESS_TOKEN, REFRESH_TOKEN};
use crate::error::{ProjctlError, Result};

/// Token endpoint response
///
/// Never persisted as a whole; its two token strings are written to the
/// credential store under the issuing connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Short-lived bearer token
    pub access_token: String,
    /// Long-lived token used to mint new access tokens
    #[serde(default)]
    pub refresh_token: String,
    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: i64,
    /// Token type, normally `bearer`
    #[serde(default)]
    pub token_type: String,
    /// Space-separated granted scopes
    #[serde(default)]
    pub scope: String,
}

/// Error body returned by the authorization server
#[derive(Debug, Deserialize)]
struct ServerError {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Parameters for a password grant
///
/// Explicit values take precedence over the named connection's stored
/// auth parameters; a missing password is looked up in the credential store
/// under the resolved username.
///
/// # Examples
///
/// ```
/// use projctl::auth::AuthParams;
///
/// let params = AuthParams::for_connection("k3x9").with_password("hunter2");
/// assert_eq!(params.connection_id.as_deref(), Some("k3x9"));
/// assert!(!params.is_complete());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthParams {
    /// Connection whose stored parameters fill in the gaps
    pub connection_id: Option<String>,
    /// Authorization server base url
    pub host: Option<String>,
    /// Authorization realm
    pub realm: Option<String>,
    /// OAuth client id
    pub client_id: Option<String>,
    /// User to authenticate as
    pub username: Option<String>,
    /// Password of `username`
    pub password: Option<String>,
}

impl AuthParams {
    /// Parameters resolved entirely from a stored connection
    pub fn for_connection<S: Into<String>>(connection_id: S) -> Self {
        Self {
            connection_id: Some(connection_id.into()),
            ..Self::default()
        }
    }

    /// Overrides the authorization server url
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Overrides the realm
    pub fn with_realm<S: Into<String>>(mut self, realm: S) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Overrides the client id
    pub fn with_client_id<S: Into<String>>(mut self, client_id: S) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Overrides the username
    pub fn with_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Supplies the password
    pub fn with_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Returns `true` when every grant parameter is given explicitly
    pub fn is_complete(&self) -> bool {
        [
            &self.host,
            &self.realm,
            &self.client_id,
            &self.username,
            &self.password,
        ]
        .iter()
        .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Fully resolved password grant
struct Grant {
    host: String,
    realm: String,
    client_id: String,
    username: String,
    password: String,
}

fn pick(explicit: &Option<String>, stored: Option<&str>) -> String {
    explicit
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or(stored)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Builds the token endpoint url of a realm
///
/// # Examples
///
/// ```
/// use projctl::auth::session::token_endpoint;
///
/// assert_eq!(
///     token_endpoint("https://auth.example.com/", "dev"),
///     "https://auth.example.com/auth/realms/dev/protocol/openid-connect/token"
/// );
/// ```
pub fn token_endpoint(auth_url: &str, realm: &str) -> String {
    format!(
        "{}/auth/realms/{}/protocol/openid-connect/token",
        auth_url.trim_end_matches('/'),
        realm
    )
}

/// Executes grants against authorization servers and persists the results
pub struct AuthSession {
    http: Arc<reqwest::Client>,
    registry: Arc<ConnectionRegistry>,
    store: Arc<CredentialStore>,
}

impl AuthSession {
    /// Creates a session over shared collaborators
    ///
    /// # Arguments
    ///
    /// * `http` - HTTP client honoring the caller's timeout
    /// * `registry` - Connection registry used to resolve stored parameters
    /// * `store` - Credential store receiving issued tokens
    pub fn new(
        http: Arc<reqwest::Client>,
        registry: Arc<ConnectionRegistry>,
        store: Arc<CredentialStore>,
    ) -> Self {
        Self {
            http,
            registry,
            store,
        }
    }

    /// Shared HTTP client
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Credential store
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Runs a password grant
    ///
    /// On success, and when the parameters name a known connection, the
    /// access and refresh tokens are stored under that connection, together
    /// with the username/password pair if the password was supplied
    /// explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::Config`] if neither a known connection nor a
    /// complete explicit parameter set is available,
    /// [`ProjctlError::MissingParameters`] if a parameter is still empty after
    /// resolution, or the mapped authorization server error.
    pub async fn authenticate(&self, params: &AuthParams) -> Result<AuthToken> {
        let connection = self.resolve_connection(params)?;
        if connection.is_none() && !params.is_complete() {
            return Err(ProjctlError::Config(match &params.connection_id {
                Some(id) => format!(
                    "no connection '{}' and explicit authentication parameters are incomplete",
                    id
                ),
                None => "no connection given and explicit authentication parameters are incomplete"
                    .to_string(),
            })
            .into());
        }

        let grant = self.resolve_grant(params, connection.as_ref())?;
        tracing::debug!(
            "Requesting password grant for '{}' in realm '{}'",
            grant.username,
            grant.realm
        );

        let token = self
            .request_token(
                &token_endpoint(&grant.host, &grant.realm),
                &[
                    ("grant_type", "password"),
                    ("client_id", grant.client_id.as_str()),
                    ("username", grant.username.as_str()),
                    ("password", grant.password.as_str()),
                ],
            )
            .await?;

        if let Some(connection) = &connection {
            self.store_tokens(&connection.id, &token)?;
            if let Some(password) = params.password.as_deref().filter(|p| !p.is_empty()) {
                self.store.put(&connection.id, &grant.username, password)?;
            }
            tracing::info!("Authenticated '{}' on connection '{}'", grant.username, connection.id);
        }

        Ok(token)
    }

    /// Exchanges a refresh token for new tokens
    ///
    /// New tokens are stored under the connection only on success. When the
    /// server issues no new refresh token the stored one is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::MissingParameters`] if the connection has no
    /// auth parameters, or the mapped authorization server error.
    pub async fn refresh_access_token(
        &self,
        connection: &Connection,
        refresh_token: &str,
    ) -> Result<AuthToken> {
        let missing: Vec<&str> = [
            ("auth url", connection.auth_url.as_str()),
            ("realm", connection.realm.as_str()),
            ("client id", connection.client_id.as_str()),
            ("refresh token", refresh_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(ProjctlError::MissingParameters(missing.join(", ")).into());
        }

        tracing::debug!("Refreshing access token for connection '{}'", connection.id);
        let token = self
            .request_token(
                &token_endpoint(&connection.auth_url, &connection.realm),
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", connection.client_id.as_str()),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        self.store_tokens(&connection.id, &token)?;
        Ok(token)
    }

    /// Drops the cached tokens of a connection
    ///
    /// The stored password is kept so the next request can re-authenticate.
    pub fn logout(&self, connection_id: &str) -> Result<()> {
        self.store.delete(connection_id, ACCESS_TOKEN)?;
        self.store.delete(connection_id, REFRESH_TOKEN)?;
        tracing::info!("Dropped cached tokens for connection '{}'", connection_id);
        Ok(())
    }

    fn resolve_connection(&self, params: &AuthParams) -> Result<Option<Connection>> {
        let Some(id) = params.connection_id.as_deref() else {
            return Ok(None);
        };
        match self.registry.get_by_id(id) {
            Ok(connection) => Ok(Some(connection)),
            Err(e) if matches!(
                e.downcast_ref::<ProjctlError>(),
                Some(ProjctlError::ConnectionNotFound(_))
            ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn resolve_grant(&self, params: &AuthParams, connection: Option<&Connection>) -> Result<Grant> {
        let host = pick(&params.host, connection.map(|c| c.auth_url.as_str()));
        let realm = pick(&params.realm, connection.map(|c| c.realm.as_str()));
        let client_id = pick(&params.client_id, connection.map(|c| c.client_id.as_str()));
        let username = pick(&params.username, connection.map(|c| c.username.as_str()));

        let password = match (params.password.as_deref(), connection) {
            (Some(password), _) if !password.is_empty() => password.to_string(),
            (_, Some(connection)) if !username.is_empty() => {
                self.store.get(&connection.id, &username).unwrap_or_default()
            }
            _ => String::new(),
        };

        let missing: Vec<&str> = [
            ("host", host.as_str()),
            ("realm", realm.as_str()),
            ("client id", client_id.as_str()),
            ("username", username.as_str()),
            ("password", password.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(ProjctlError::MissingParameters(missing.join(", ")).into());
        }

        Ok(Grant {
            host,
            realm,
            client_id,
            username,
            password,
        })
    }

    fn store_tokens(&self, connection_id: &str, token: &AuthToken) -> Result<()> {
        self.store.put(connection_id, ACCESS_TOKEN, &token.access_token)?;
        if !token.refresh_token.is_empty() {
            self.store
                .put(connection_id, REFRESH_TOKEN, &token.refresh_token)?;
        }
        Ok(())
    }

    async fn request_token(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<AuthToken> {
        let resp = self
            .http
            .post(endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| ProjctlError::AuthUnreachable(format!("{}: {}", endpoint, e)))?;

        let status = resp.status();
        match status {
            StatusCode::OK => {
                let body = resp
                    .text()
                    .await
                    .map_err(|e| ProjctlError::AuthUnreachable(format!("{}: {}", endpoint, e)))?;
                let token = serde_json::from_str::<AuthToken>(&body).map_err(|e| {
                    ProjctlError::AuthResponse {
                        status: status.as_u16(),
                        body: format!("invalid token response: {}", e),
                    }
                })?;
                Ok(token)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                let body = resp.text().await.unwrap_or_default();
                Err(match serde_json::from_str::<ServerError>(&body) {
                    Ok(server) => ProjctlError::AuthRejected {
                        tag: server.error,
                        description: server.error_description,
                    },
                    Err(_) => ProjctlError::AuthResponse {
                        status: status.as_u16(),
                        body,
                    },
                }
                .into())
            }
            StatusCode::NOT_FOUND => {
                Err(ProjctlError::AuthEndpointNotFound(endpoint.to_string()).into())
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                Err(ProjctlError::AuthServiceDown(endpoint.to_string()).into())
            }
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(ProjctlError::AuthResponse {
                    status: status.as_u16(),
                    body,
                }
                .into())
            }
        }
    }
}
