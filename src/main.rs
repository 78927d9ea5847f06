//! projctl - Developer CLI for project-control deployments
//!
#![doc = "projctl - Developer CLI for project-control deployments"]
#![doc = "Main entry point for the projctl application."]

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use projctl::cli::{Cli, Commands};
use projctl::commands::{self, Context, ErrorReport};
use projctl::config::Config;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    let json = cli.json;
    if let Err(e) = run(cli).await {
        tracing::debug!("Command failed: {:?}", e);
        eprintln!("{}", ErrorReport::from_error(&e).render(json));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let ctx = Context::new(config, cli.json)?;

    // Execute command
    match cli.command {
        Commands::Connections { command } => {
            tracing::debug!("Starting connection command");
            commands::connections::handle_connections(&ctx, command).await
        }
        Commands::Secure { command } => {
            tracing::debug!("Starting secure command");
            commands::secure::handle_secure(&ctx, command).await
        }
        Commands::Request {
            conid,
            method,
            data,
            path,
        } => {
            commands::request::run_request(&ctx, conid.as_deref(), &method, &path, data).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "projctl=debug" } else { "projctl=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
