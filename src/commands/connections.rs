//! Connection management commands

use colored::Colorize;
use prettytable::{format, row, Table};

use crate::cli::ConnectionCommand;
use crate::commands::{print_json, Context};
use crate::connections::Connection;
use crate::error::Result;

/// Handle connection management commands
pub async fn handle_connections(ctx: &Context, command: ConnectionCommand) -> Result<()> {
    match command {
        ConnectionCommand::List => list_connections(ctx),
        ConnectionCommand::Get { id } => {
            let connection = ctx.registry.get_by_id(&id)?;
            output_connection(ctx, &connection)
        }
        ConnectionCommand::Add {
            label,
            url,
            username,
        } => {
            let connection = ctx.registry.add(&ctx.http, &label, &url, &username).await?;
            if !ctx.json {
                println!(
                    "{}",
                    format!("Added connection {}", connection.id).green()
                );
            }
            output_connection(ctx, &connection)
        }
        ConnectionCommand::Update {
            id,
            label,
            url,
            username,
        } => {
            let before = ctx.registry.get_by_id(&id)?;
            let connection = ctx
                .registry
                .update(&ctx.http, &id, &label, &url, &username)
                .await?;

            // Cached tokens were issued for the old parameters
            if before.username != connection.username || before.url != connection.url {
                ctx.store.clear_connection(&connection.id, Some(&before.username));
            }

            if !ctx.json {
                println!(
                    "{}",
                    format!("Updated connection {}", connection.id).green()
                );
            }
            output_connection(ctx, &connection)
        }
        ConnectionCommand::Remove { id } => {
            let connection = ctx.registry.get_by_id(&id)?;
            ctx.registry.remove(&id)?;
            ctx.store
                .clear_connection(&connection.id, Some(&connection.username));

            if ctx.json {
                print_json(&connection)
            } else {
                println!(
                    "{}",
                    format!("Removed connection {}", connection.id).green()
                );
                Ok(())
            }
        }
        ConnectionCommand::Reset => {
            let previous = ctx.registry.list()?;
            ctx.registry.reset()?;
            for connection in previous.iter().filter(|c| !c.is_local()) {
                ctx.store
                    .clear_connection(&connection.id, Some(&connection.username));
            }

            if ctx.json {
                print_json(&ctx.registry.list()?)
            } else {
                println!("{}", "Connections reset to local only".green());
                Ok(())
            }
        }
        ConnectionCommand::Active => {
            let connection = ctx.registry.active()?;
            output_connection(ctx, &connection)
        }
        ConnectionCommand::Use { id } => {
            let connection = ctx.registry.set_active(&id)?;
            if !ctx.json {
                println!(
                    "{}",
                    format!("Active connection is now {}", connection.id).green()
                );
            }
            output_connection(ctx, &connection)
        }
    }
}

fn list_connections(ctx: &Context) -> Result<()> {
    let connections = ctx.registry.list()?;
    if ctx.json {
        return print_json(&connections);
    }

    let active = ctx.registry.active()?;
    output_connections_table(&connections, &active.id);
    Ok(())
}

fn output_connection(ctx: &Context, connection: &Connection) -> Result<()> {
    if ctx.json {
        return print_json(connection);
    }
    output_connection_detailed(connection);
    Ok(())
}

/// Output connections in table format
fn output_connections_table(connections: &[Connection], active_id: &str) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(row![
        "",
        "ID".bold(),
        "Label".bold(),
        "URL".bold(),
        "Username".bold(),
        "Realm".bold()
    ]);

    for connection in connections {
        let marker = if connection.id.to_lowercase() == active_id.to_lowercase() {
            "*"
        } else {
            ""
        };
        table.add_row(row![
            marker,
            connection.id.cyan(),
            connection.label,
            display_or_dash(&connection.url),
            display_or_dash(&connection.username),
            display_or_dash(&connection.realm)
        ]);
    }

    println!("\nConnections:");
    table.printstd();
    println!();
}

/// Output one connection in detailed format
fn output_connection_detailed(connection: &Connection) {
    println!("\nConnection {}\n", connection.id.cyan());
    println!("Label:          {}", connection.label);
    println!("URL:            {}", display_or_dash(&connection.url));
    println!("Auth URL:       {}", display_or_dash(&connection.auth_url));
    println!("Realm:          {}", display_or_dash(&connection.realm));
    println!("Client ID:      {}", display_or_dash(&connection.client_id));
    println!("Username:       {}", display_or_dash(&connection.username));
    println!();
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
