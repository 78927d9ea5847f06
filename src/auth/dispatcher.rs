//! Authenticated request dispatch
//!
//! [`RequestDispatcher::dispatch`] sends a caller-built request to a
//! connection. Requests to `local` go out once, unauthenticated. Requests to
//! any other connection walk a fixed cascade and stop at the first accepted
//! response:
//!
//! 1. Cached access token.
//! 2. Refresh token exchanged for a new access token, then resend.
//! 3. Password grant with the cached password, then resend. No cached
//!    password ends the dispatch with [`ProjctlError::NoPassword`]; a
//!    rejected grant with [`ProjctlError::AuthFailed`].
//! 4. Otherwise [`ProjctlError::AuthExhausted`].
//!
//! A response is accepted when it arrives and its status differs from the
//! configured rejected-token status. Each attempt is a fresh clone of the
//! original request, so authorization headers never accumulate.

use reqwest::header::{HeaderValue, AUTHORIZATION, CACHE_CONTROL};
use reqwest::{Request, Response, StatusCode};

use crate::auth::session::{AuthParams, AuthSession};
use crate::connections::{is_local, Connection};
use crate::credentials::{ACCESS_TOKEN, REFRESH_TOKEN};
use crate::error::{ProjctlError, Result};

/// Outcome of a single authenticated send
enum Attempt {
    Accepted(Response),
    Rejected(String),
}

/// Sends requests through the authentication cascade
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use projctl::auth::{AuthSession, RequestDispatcher};
/// use projctl::connections::ConnectionRegistry;
/// use projctl::credentials::CredentialStore;
/// use projctl::Config;
///
/// # async fn example() -> projctl::Result<()> {
/// let config = Config::default();
/// let http = Arc::new(config.http.build_client()?);
/// let registry = Arc::new(ConnectionRegistry::from_config(&config)?);
/// let store = Arc::new(CredentialStore::new(&config)?);
///
/// let dispatcher = RequestDispatcher::new(AuthSession::new(http.clone(), registry, store))
///     .with_rejected_status(config.rejected_token_status());
///
/// let request = http.get("https://staging.example.com/api/v1/projects").build()?;
/// let response = dispatcher.dispatch(request, "k3x9").await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
pub struct RequestDispatcher {
    session: AuthSession,
    rejected_status: StatusCode,
}

impl RequestDispatcher {
    /// Creates a dispatcher treating `302 Found` as a rejected bearer token
    pub fn new(session: AuthSession) -> Self {
        Self {
            session,
            rejected_status: StatusCode::FOUND,
        }
    }

    /// Overrides the status that signals a rejected bearer token
    pub fn with_rejected_status(mut self, status: StatusCode) -> Self {
        self.rejected_status = status;
        self
    }

    /// Underlying auth session
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Sends `request` to the connection, authenticating as needed
    ///
    /// # Arguments
    ///
    /// * `request` - Request to send; its body must be buffered
    /// * `connection_id` - Connection the request targets
    ///
    /// # Returns
    ///
    /// The first accepted response. For `local` the single response is
    /// returned whatever its status.
    ///
    /// # Errors
    ///
    /// - For `local`, the transport error, unchanged.
    /// - [`ProjctlError::RequestNotReplayable`] if the body is a stream.
    /// - [`ProjctlError::ConnectionNotFound`] for unknown connections.
    /// - [`ProjctlError::NoPassword`], [`ProjctlError::AuthFailed`] or
    ///   [`ProjctlError::AuthExhausted`] when the cascade ends without an
    ///   accepted response.
    pub async fn dispatch(&self, request: Request, connection_id: &str) -> Result<Response> {
        if is_local(connection_id) {
            tracing::debug!("Sending {} {} to local", request.method(), request.url());
            let response = self
                .session
                .http()
                .execute(request)
                .await
                .map_err(ProjctlError::Http)?;
            return Ok(response);
        }

        if request.try_clone().is_none() {
            return Err(ProjctlError::RequestNotReplayable(format!(
                "{} {} has a streaming body",
                request.method(),
                request.url()
            ))
            .into());
        }

        let connection = self.session.registry().get_by_id(connection_id)?;

        if let Some(access_token) = self.cached(&connection, ACCESS_TOKEN) {
            match self.send_with_token(&request, &access_token).await? {
                Attempt::Accepted(response) => return Ok(response),
                Attempt::Rejected(reason) => {
                    tracing::debug!("Cached access token not accepted: {}", reason)
                }
            }
        }

        if let Some(refresh_token) = self.cached(&connection, REFRESH_TOKEN) {
            match self
                .session
                .refresh_access_token(&connection, &refresh_token)
                .await
            {
                Ok(token) => match self.send_with_token(&request, &token.access_token).await? {
                    Attempt::Accepted(response) => return Ok(response),
                    Attempt::Rejected(reason) => {
                        tracing::debug!("Refreshed access token not accepted: {}", reason)
                    }
                },
                Err(e) => tracing::debug!("Token refresh failed: {}", e),
            }
        }

        self.reauthenticate_and_send(&request, &connection).await
    }

    /// Step 3 and 4 of the cascade
    async fn reauthenticate_and_send(
        &self,
        request: &Request,
        connection: &Connection,
    ) -> Result<Response> {
        if connection.username.trim().is_empty()
            || self.cached(connection, &connection.username).is_none()
        {
            return Err(ProjctlError::NoPassword {
                connection_id: connection.id.clone(),
                username: connection.username.clone(),
            }
            .into());
        }

        tracing::debug!(
            "Re-authenticating '{}' on connection '{}'",
            connection.username,
            connection.id
        );
        let token = self
            .session
            .authenticate(&AuthParams::for_connection(connection.id.clone()))
            .await
            .map_err(|e| ProjctlError::AuthFailed {
                connection_id: connection.id.clone(),
                source: Box::new(ProjctlError::from_auth_error(e)),
            })?;

        match self.send_with_token(request, &token.access_token).await? {
            Attempt::Accepted(response) => Ok(response),
            Attempt::Rejected(reason) => {
                tracing::debug!("Fresh access token not accepted: {}", reason);
                Err(ProjctlError::AuthExhausted(connection.id.clone()).into())
            }
        }
    }

    /// Looks up a cached secret, treating any lookup failure as absence
    fn cached(&self, connection: &Connection, principal: &str) -> Option<String> {
        match self.session.store().get(&connection.id, principal) {
            Ok(secret) if !secret.is_empty() => Some(secret),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("No usable '{}' for '{}': {}", principal, connection.id, e);
                None
            }
        }
    }

    async fn send_with_token(&self, request: &Request, token: &str) -> Result<Attempt> {
        let mut attempt = request.try_clone().ok_or_else(|| {
            ProjctlError::RequestNotReplayable(format!("{} {}", request.method(), request.url()))
        })?;

        let bearer = match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => value,
            Err(_) => return Ok(Attempt::Rejected("token is not a valid header value".into())),
        };
        let headers = attempt.headers_mut();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        match self.session.http().execute(attempt).await {
            Ok(response) if response.status() != self.rejected_status => {
                Ok(Attempt::Accepted(response))
            }
            Ok(response) => Ok(Attempt::Rejected(format!("status {}", response.status()))),
            Err(e) => Ok(Attempt::Rejected(e.to_string())),
        }
    }
}
