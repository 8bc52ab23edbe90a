//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "personarag")]
#[command(about = "Chat with a retrieval-augmented persona over the web or the terminal")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (built-in defaults if it does not exist)
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable verbose debug logging (default: config level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web chat server
    Serve {
        /// Host to bind to (default: server.host from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default: server.port from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS for all origins
        #[arg(long)]
        cors: bool,
    },
    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,
        /// Number of passages to retrieve (default: retrieval.top_k from config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print the retrieved sources after the answer
        #[arg(long)]
        show_sources: bool,
    },
    /// Start an interactive conversation in the terminal
    Chat,
    /// Show the effective configuration
    Config,
}
