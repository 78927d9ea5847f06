//! Command-line interface definition for projctl
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for connection management, authentication, and
//! authenticated requests.

use clap::{Parser, Subcommand};

/// projctl - Developer CLI for project-control deployments
///
/// Manage named connections, authenticate against their authorization
/// servers, and send authenticated requests.
#[derive(Parser, Debug, Clone)]
#[command(name = "projctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Store secrets in a plain file instead of the OS keyring
    #[arg(long, global = true)]
    pub insecure_keyring: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for projctl
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage connections
    Connections {
        /// Connection management subcommand
        #[command(subcommand)]
        command: ConnectionCommand,
    },

    /// Authenticate against a connection
    Secure {
        /// Authentication subcommand
        #[command(subcommand)]
        command: SecureCommand,
    },

    /// Send an authenticated request to a connection
    Request {
        /// Connection to send to (defaults to the active connection)
        #[arg(long)]
        conid: Option<String>,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,

        /// Path relative to the connection url, or an absolute url
        path: String,
    },
}

/// Connection management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConnectionCommand {
    /// List all connections
    List,

    /// Show one connection
    Get {
        /// Connection id
        id: String,
    },

    /// Add a connection, discovering its authorization parameters
    Add {
        /// Human-readable name
        #[arg(short, long)]
        label: String,

        /// Base url of the deployment
        #[arg(long)]
        url: String,

        /// User to authenticate as
        #[arg(short, long)]
        username: String,
    },

    /// Update a connection, re-discovering its authorization parameters
    Update {
        /// Connection id
        id: String,

        /// Human-readable name
        #[arg(short, long)]
        label: String,

        /// Base url of the deployment
        #[arg(long)]
        url: String,

        /// User to authenticate as
        #[arg(short, long)]
        username: String,
    },

    /// Remove a connection and its stored secrets
    Remove {
        /// Connection id
        id: String,
    },

    /// Reset to the single local connection
    Reset,

    /// Show the active connection
    Active,

    /// Make a connection the active one
    Use {
        /// Connection id
        id: String,
    },
}

/// Authentication subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SecureCommand {
    /// Log in with a password and cache the issued tokens
    Login {
        /// Connection to log in to (defaults to the active connection)
        #[arg(long)]
        conid: Option<String>,

        /// Authorization server url override
        #[arg(long)]
        host: Option<String>,

        /// Realm override
        #[arg(long)]
        realm: Option<String>,

        /// Client id override
        #[arg(long)]
        client_id: Option<String>,

        /// Username override
        #[arg(short, long)]
        username: Option<String>,

        /// Password (looked up in the credential store when omitted)
        #[arg(short, long, env = "PROJCTL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Exchange the cached refresh token for new tokens
    Refresh {
        /// Connection to refresh (defaults to the active connection)
        #[arg(long)]
        conid: Option<String>,
    },

    /// Drop the cached tokens of a connection
    Logout {
        /// Connection to log out of (defaults to the active connection)
        #[arg(long)]
        conid: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json: false,
            insecure_keyring: false,
            command: Commands::Connections {
                command: ConnectionCommand::List,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(!cli.json);
        assert!(!cli.insecure_keyring);
    }

    #[test]
    fn test_cli_parse_connections_list() {
        let cli = Cli::try_parse_from(["projctl", "connections", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Connections {
                command: ConnectionCommand::List
            }
        ));
    }

    #[test]
    fn test_cli_parse_connections_add() {
        let cli = Cli::try_parse_from([
            "projctl",
            "connections",
            "add",
            "--label",
            "Staging",
            "--url",
            "https://staging.example.com",
            "--username",
            "alice",
        ])
        .unwrap();

        match cli.command {
            Commands::Connections {
                command:
                    ConnectionCommand::Add {
                        label,
                        url,
                        username,
                    },
            } => {
                assert_eq!(label, "Staging");
                assert_eq!(url, "https://staging.example.com");
                assert_eq!(username, "alice");
            }
            other => panic!("Expected connections add, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_connections_add_requires_url() {
        let result = Cli::try_parse_from([
            "projctl",
            "connections",
            "add",
            "--label",
            "Staging",
            "--username",
            "alice",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_connections_update() {
        let cli = Cli::try_parse_from([
            "projctl",
            "connections",
            "update",
            "k3x9",
            "-l",
            "Staging",
            "--url",
            "https://staging.example.com",
            "-u",
            "bob",
        ])
        .unwrap();

        match cli.command {
            Commands::Connections {
                command: ConnectionCommand::Update { id, username, .. },
            } => {
                assert_eq!(id, "k3x9");
                assert_eq!(username, "bob");
            }
            other => panic!("Expected connections update, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_connections_use() {
        let cli = Cli::try_parse_from(["projctl", "connections", "use", "k3x9"]).unwrap();
        match cli.command {
            Commands::Connections {
                command: ConnectionCommand::Use { id },
            } => assert_eq!(id, "k3x9"),
            other => panic!("Expected connections use, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "projctl",
            "connections",
            "list",
            "--json",
            "--insecure-keyring",
            "-v",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.insecure_keyring);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_secure_login_with_overrides() {
        let cli = Cli::try_parse_from([
            "projctl",
            "secure",
            "login",
            "--conid",
            "k3x9",
            "--realm",
            "dev",
            "--client-id",
            "projctl-cli",
            "-u",
            "alice",
            "-p",
            "hunter2",
        ])
        .unwrap();

        match cli.command {
            Commands::Secure {
                command:
                    SecureCommand::Login {
                        conid,
                        host,
                        realm,
                        client_id,
                        username,
                        password,
                    },
            } => {
                assert_eq!(conid.as_deref(), Some("k3x9"));
                assert_eq!(host, None);
                assert_eq!(realm.as_deref(), Some("dev"));
                assert_eq!(client_id.as_deref(), Some("projctl-cli"));
                assert_eq!(username.as_deref(), Some("alice"));
                assert_eq!(password.as_deref(), Some("hunter2"));
            }
            other => panic!("Expected secure login, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_secure_logout_without_conid() {
        let cli = Cli::try_parse_from(["projctl", "secure", "logout"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Secure {
                command: SecureCommand::Logout { conid: None }
            }
        ));
    }

    #[test]
    fn test_cli_parse_request_defaults_to_get() {
        let cli = Cli::try_parse_from(["projctl", "request", "/api/v1/projects"]).unwrap();
        match cli.command {
            Commands::Request {
                conid,
                method,
                data,
                path,
            } => {
                assert_eq!(conid, None);
                assert_eq!(method, "GET");
                assert_eq!(data, None);
                assert_eq!(path, "/api/v1/projects");
            }
            other => panic!("Expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_request_with_method_and_body() {
        let cli = Cli::try_parse_from([
            "projctl",
            "request",
            "--conid",
            "k3x9",
            "-X",
            "POST",
            "-d",
            r#"{"name":"demo"}"#,
            "/api/v1/projects",
        ])
        .unwrap();
        match cli.command {
            Commands::Request {
                conid,
                method,
                data,
                ..
            } => {
                assert_eq!(conid.as_deref(), Some("k3x9"));
                assert_eq!(method, "POST");
                assert_eq!(data.as_deref(), Some(r#"{"name":"demo"}"#));
            }
            other => panic!("Expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["projctl"]).is_err());
    }
}
