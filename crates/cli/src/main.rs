//! TaskClaw CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Write a default config file
//! - `agent`: Run one task, or chat interactively
//! - `gateway`: Start the HTTP API server
//! - `tools`: List the agent's tools

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "taskclaw",
    about = "TaskClaw: a tool-using task agent with a streaming HTTP API",
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
    /// Write a default config file
    Onboard,

    /// Run a task with the agent
    Agent {
        /// Run a single task instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Session whose TODO list and history the run uses
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List available tools
    Tools,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing. `agent` prints its own log, so only warnings
    // reach the console unless --verbose is set.
    let filter = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Agent { .. } | Commands::Tools, false) => "warn",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Agent { message, session } => commands::agent::run(message, session).await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Tools => commands::tools::run().await?,
    }

    Ok(())
}
