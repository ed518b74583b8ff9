//! Troupe CLI — the main entry point.
//!
//! Commands:
//! - `init`     — Write the default config file
//! - `personas` — List the persona registry
//! - `chat`     — Send a single message to a persona
//! - `serve`    — Start the HTTP gateway

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "troupe",
    about = "Troupe — multi-persona LLM chat backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init,

    /// List the configured personas
    Personas,

    /// Send one message to a persona
    Chat {
        /// The persona to talk to (e.g. "hook-creator")
        #[arg(short, long)]
        persona: String,

        /// The message to send
        #[arg(short, long)]
        message: String,

        /// The user the conversation is tracked under
        #[arg(short, long, default_value = "anonymous")]
        user: String,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Personas => commands::personas::run().await?,
        Commands::Chat {
            persona,
            message,
            user,
        } => commands::chat::run(&persona, &message, &user).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
    }

    Ok(())
}
