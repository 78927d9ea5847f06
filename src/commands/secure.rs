//! Login, token refresh and logout commands

use colored::Colorize;
use serde::Serialize;

use crate::auth::{AuthParams, AuthToken};
use crate::cli::SecureCommand;
use crate::commands::{print_json, Context};
use crate::credentials::REFRESH_TOKEN;
use crate::error::{ProjctlError, Result};

/// Token summary printed after a grant
///
/// Token strings are never printed.
#[derive(Debug, Serialize)]
struct GrantSummary<'a> {
    connection_id: &'a str,
    token_type: &'a str,
    expires_in: i64,
    scope: &'a str,
    refresh_token_issued: bool,
}

impl<'a> GrantSummary<'a> {
    fn new(connection_id: &'a str, token: &'a AuthToken) -> Self {
        Self {
            connection_id,
            token_type: &token.token_type,
            expires_in: token.expires_in,
            scope: &token.scope,
            refresh_token_issued: !token.refresh_token.is_empty(),
        }
    }
}

/// Handle authentication commands
pub async fn handle_secure(ctx: &Context, command: SecureCommand) -> Result<()> {
    match command {
        SecureCommand::Login {
            conid,
            host,
            realm,
            client_id,
            username,
            password,
        } => {
            let connection_id = match conid {
                Some(id) => id,
                None => ctx.registry.active()?.id,
            };
            if crate::connections::is_local(&connection_id) {
                return Err(ProjctlError::Config(
                    "the local connection does not require authentication".to_string(),
                )
                .into());
            }

            let params = AuthParams {
                connection_id: Some(connection_id.clone()),
                host,
                realm,
                client_id,
                username,
                password,
            };

            let token = ctx.session().authenticate(&params).await?;
            output_grant(ctx, "Logged in to", &connection_id, &token)
        }
        SecureCommand::Refresh { conid } => {
            let connection = ctx.resolve_connection(conid.as_deref())?;
            let session = ctx.session();
            let refresh_token = ctx.store.get(&connection.id, REFRESH_TOKEN)?;

            let token = session
                .refresh_access_token(&connection, &refresh_token)
                .await?;
            output_grant(ctx, "Refreshed tokens for", &connection.id, &token)
        }
        SecureCommand::Logout { conid } => {
            let connection = ctx.resolve_connection(conid.as_deref())?;
            ctx.session().logout(&connection.id)?;

            if ctx.json {
                print_json(&serde_json::json!({ "connection_id": connection.id }))
            } else {
                println!(
                    "{}",
                    format!("Logged out of {}", connection.id).green()
                );
                Ok(())
            }
        }
    }
}

fn output_grant(ctx: &Context, action: &str, connection_id: &str, token: &AuthToken) -> Result<()> {
    let summary = GrantSummary::new(connection_id, token);
    if ctx.json {
        return print_json(&summary);
    }

    println!("{}", format!("{} {}", action, connection_id).green());
    println!("Token type:     {}", summary.token_type);
    println!("Expires in:     {}s", summary.expires_in);
    if !summary.scope.is_empty() {
        println!("Scope:          {}", summary.scope);
    }
    Ok(())
}
