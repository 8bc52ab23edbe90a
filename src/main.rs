use clap::Parser;
use personarag::cli::handle_ask;
use personarag::cli::handle_chat;
use personarag::cli::handle_config_command;
use personarag::cli::handle_serve;
use personarag::cli::Cli;
use personarag::cli::Commands;
use personarag::config::AppConfig;
use personarag::Result;
use tracing::info;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(&cli.config)?;

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Err(e) = personarag::logging::init_logging_with_config(&logging) {
        personarag::logging::init_console_logging(&logging.level)?;
        warn!("File logging unavailable, logging to the console only: {}", e);
    }
    info!("Configuration loaded from {}", cli.config.display());

    // Execute the requested command
    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve(&config, host, port, cors).await?;
        }
        Commands::Ask {
            question,
            top_k,
            show_sources,
        } => {
            handle_ask(&config, question, top_k, show_sources).await?;
        }
        Commands::Chat => {
            handle_chat(&config).await?;
        }
        Commands::Config => {
            handle_config_command(&config)?;
        }
    }

    Ok(())
}
