//! Catalogist CLI: the main entry point.
//!
//! Commands:
//! - `compensate`: Complete an extracted catalog and split it into module views
//! - `split`     : Split an annotated catalog into module views
//! - `validate`  : Check a catalog file for structural errors
//! - `template`  : Print a default module template
//! - `link`      : Link catalog leaves to a template library
//! - `doctor`    : Diagnose configuration and templates
//! - `init`      : Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "catalogist",
    about = "Catalogist: tender catalog compensation and module splitting",
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
    /// Complete an extracted catalog, then write the compensated catalog and its three views
    Compensate {
        /// Extracted catalog (JSON forest). Omit to start from the default templates
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to `[output] dir` from config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Write the repair transcript to this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Template library overriding the built-in one
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Split an annotated catalog into business, technical and pricing views
    Split {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Validate a catalog file
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the default template for a module (business, technical, pricing)
    Template {
        module_type: String,

        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Link catalog leaves to entries of a template library
    Link {
        /// Catalog to link (JSON forest)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Template library (JSON list of {id, name})
        #[arg(short, long)]
        templates: PathBuf,

        /// Where to write the linked catalog
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Diagnose configuration, API key and templates
    Doctor,

    /// Write a default config file
    Init,
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
        Commands::Compensate {
            input,
            output_dir,
            log_file,
            templates,
        } => commands::compensate::run(input, output_dir, log_file, templates).await?,
        Commands::Split { input, output_dir } => commands::split::run(input, output_dir).await?,
        Commands::Validate { input } => commands::validate::run(input).await?,
        Commands::Template {
            module_type,
            templates,
        } => commands::template::run(module_type, templates).await?,
        Commands::Link {
            catalog,
            templates,
            output,
        } => commands::link::run(catalog, templates, output).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Init => commands::init::run().await?,
    }

    Ok(())
}
