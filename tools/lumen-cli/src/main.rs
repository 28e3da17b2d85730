//! Lumen CLI: plan and run image exports from the command line.
//!
//! Usage:
//!   lumen plan <IMAGES>...       Print the job description without exporting
//!   lumen export <IMAGES>...     Export images through the configured engine
//!   lumen names <IMAGES>...      Show the file names a template produces
//!   lumen watermark              Show a normalized watermark and its placement
//!   lumen config                 Show or save the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lumen_common::config::AppConfig;

mod commands;

use commands::ExportArgs;

#[derive(Parser)]
#[command(
    name = "lumen",
    about = "Batch and single-image export for Lumen",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the job description for an export without running it
    Plan {
        /// Images to export, in sequence order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output file (single image) or directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        options: ExportArgs,
    },

    /// Export images through the processing engine
    Export {
        /// Images to export, in sequence order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output file (single image) or directory
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        options: ExportArgs,
    },

    /// Show the output file names a template produces
    Names {
        /// Images in sequence order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Filename template
        #[arg(short, long)]
        template: Option<String>,

        /// Output format, sets the extension
        #[arg(long)]
        format: Option<String>,
    },

    /// Show a normalized watermark and where it lands
    Watermark {
        /// Watermark spec (JSON). When omitted, the default text watermark is shown
        /// as if it were switched on.
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Image metadata (JSON) to fill text placeholders with
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Canvas size, e.g. 6000x4000
        #[arg(long, requires = "mark")]
        canvas: Option<String>,

        /// Rendered watermark size, e.g. 800x120
        #[arg(long, requires = "canvas")]
        mark: Option<String>,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the config file (--config, or the user config)
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    lumen_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Plan {
            images,
            output,
            options,
        } => commands::plan::run(images, output, options, &config),
        Commands::Export {
            images,
            output,
            options,
        } => commands::export::run(images, output, options, &config).await,
        Commands::Names {
            images,
            template,
            format,
        } => commands::names::run(images, template, format, &config),
        Commands::Watermark {
            spec,
            metadata,
            canvas,
            mark,
        } => commands::watermark::run(spec, metadata, canvas, mark),
        Commands::Config { save } => {
            commands::config::run(&config, cli.config.as_deref(), save)
        }
    }
}
