//! PaperScout CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write the default config file
//! - `ask`      — Answer a question, researching papers when needed
//! - `tools`    — List the research tools the agent can call
//! - `cite`     — Extract (Author, Year) citations from a text file
//! - `compare`  — Compare two papers on one aspect

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "paperscout",
    about = "PaperScout — a research agent for scientific papers",
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
    Onboard,

    /// Ask the research agent a question
    Ask {
        /// The question to research
        question: String,

        /// Print each node's output as the run progresses
        #[arg(short, long)]
        stream: bool,
    },

    /// List the available research tools
    Tools,

    /// Extract citing sentences from a text file as JSON
    Cite {
        /// Text file to scan
        file: PathBuf,
    },

    /// Compare two papers (plain text or .pdf)
    Compare {
        /// First paper
        a: PathBuf,

        /// Second paper
        b: PathBuf,

        /// Aspect to focus the comparison on
        #[arg(short, long)]
        focus: Option<String>,
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
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask { question, stream } => commands::ask::run(question, stream).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Cite { file } => commands::cite::run(&file).await?,
        Commands::Compare { a, b, focus } => commands::compare::run(&a, &b, focus).await?,
    }

    Ok(())
}
