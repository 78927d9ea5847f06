//! Authenticated request command

use serde::Serialize;
use url::Url;

use crate::commands::{print_json, Context};
use crate::connections::Connection;
use crate::error::{ProjctlError, Result};

/// Response as printed with `--json`
#[derive(Debug, Serialize)]
struct ResponseOutput {
    status: u16,
    body: serde_json::Value,
}

/// Sends one request through the dispatcher and prints the response
///
/// # Arguments
///
/// * `ctx` - Shared command context
/// * `conid` - Target connection, the active one when `None`
/// * `method` - HTTP method
/// * `path` - Path relative to the connection url, or an absolute url
/// * `data` - Optional request body
///
/// # Errors
///
/// Transport failures against `local` are reported as
/// [`ProjctlError::LocalRequestFailed`]; remote failures keep the
/// dispatcher's authentication error.
pub async fn run_request(
    ctx: &Context,
    conid: Option<&str>,
    method: &str,
    path: &str,
    data: Option<String>,
) -> Result<()> {
    let connection = ctx.resolve_connection(conid)?;
    let url = resolve_url(&connection, path)?;
    let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|_| ProjctlError::MissingParameters(format!("invalid method '{}'", method)))?;

    tracing::info!("{} {} via connection '{}'", method, url, connection.id);

    let mut builder = ctx.http.request(method, url);
    if let Some(body) = data {
        builder = builder
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
    }
    let request = builder.build().map_err(ProjctlError::Http)?;

    let response = match ctx.dispatcher().dispatch(request, &connection.id).await {
        Ok(response) => response,
        Err(e) if connection.is_local() => {
            return Err(ProjctlError::LocalRequestFailed(format!("{:#}", e)).into())
        }
        Err(e) => return Err(e),
    };

    let status = response.status();
    let text = response.text().await.map_err(ProjctlError::Http)?;

    if ctx.json {
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        return print_json(&ResponseOutput {
            status: status.as_u16(),
            body,
        });
    }

    println!("{}", status);
    if !text.is_empty() {
        println!("{}", text);
    }
    Ok(())
}

/// Joins `path` onto the connection url unless it is already absolute
fn resolve_url(connection: &Connection, path: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(path) {
        return Ok(url);
    }
    if connection.url.is_empty() {
        return Err(ProjctlError::MissingParameters(format!(
            "connection '{}' has no url; pass an absolute url",
            connection.id
        ))
        .into());
    }

    let joined = format!(
        "{}/{}",
        connection.url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)
        .map_err(|e| ProjctlError::MissingParameters(format!("invalid url '{}': {}", joined, e)).into())
}
