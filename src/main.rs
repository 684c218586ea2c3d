//! hcchat - HealthConnect assistant chat client
//!
#![doc = "Main entry point for the hcchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hcchat::cli::{Cli, Commands};
use hcchat::commands;
use hcchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { session, model } => {
            if let Some(m) = &model {
                tracing::debug!("Using model override: {}", m);
            }
            if let Some(s) = &session {
                tracing::debug!("Opening conversation: {}", s);
            }

            // Moves `config` into the handler (match arms are exclusive)
            commands::chat::run_chat(config, session).await?;
            Ok(())
        }
        Commands::Send(args) => {
            tracing::debug!("Sending one message");
            commands::send::run_send(config, args).await?;
            Ok(())
        }
        Commands::History { command } => {
            commands::history::handle_history(command, &config)?;
            Ok(())
        }
    }
}

/// Initialize tracing; logs go to stderr so stdout stays clean for replies
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "hcchat=debug" } else { "hcchat=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
