//! Reframe CLI: inspect and export timeline edit scripts.
//!
//! Usage:
//!   reframe compile <SCRIPT>            Print the compiled render expressions
//!   reframe preview <SCRIPT>            Sample the preview transform over time
//!   reframe validate <SCRIPT>           Apply a script and report its contents
//!   reframe export <SCRIPT> -i <VIDEO>  Render the timeline onto a video
//!   reframe check                       Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reframe_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reframe",
    about = "Zoom and pan timelines for recorded video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output where supported
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an edit script into render-time expressions
    Compile {
        /// Path to the edit script (JSON)
        script: PathBuf,

        /// Output width used for the zoompan filter
        #[arg(long)]
        width: Option<u32>,

        /// Output height used for the zoompan filter
        #[arg(long)]
        height: Option<u32>,

        /// Output frame rate used for the zoompan filter
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Sample the composed preview transform across the timeline
    Preview {
        /// Path to the edit script (JSON)
        script: PathBuf,

        /// Samples per second of timeline
        #[arg(long)]
        rate: Option<u32>,
    },

    /// Apply an edit script and report what it produces
    Validate {
        /// Path to the edit script (JSON)
        script: PathBuf,
    },

    /// Render an edit script onto a source video
    Export {
        /// Path to the edit script (JSON)
        script: PathBuf,

        /// Source video
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: mp4-h264|mp4-h265|webm|gif
        #[arg(long)]
        format: Option<String>,

        /// Output width
        #[arg(long)]
        width: Option<u32>,

        /// Output height
        #[arg(long)]
        height: Option<u32>,

        /// Output frame rate
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    reframe_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Compile {
            script,
            width,
            height,
            fps,
        } => {
            let defaults = &mut config.export;
            defaults.width = width.unwrap_or(defaults.width);
            defaults.height = height.unwrap_or(defaults.height);
            defaults.fps = fps.unwrap_or(defaults.fps);
            commands::compile::run(script, &config, cli.json)
        }
        Commands::Preview { script, rate } => {
            let rate = rate.unwrap_or(config.preview.sample_rate_hz);
            commands::preview::run(script, rate, cli.json)
        }
        Commands::Validate { script } => commands::validate::run(script),
        Commands::Export {
            script,
            input,
            output,
            format,
            width,
            height,
            fps,
        } => {
            let defaults = &mut config.export;
            if let Some(format) = format {
                defaults.format = format;
            }
            defaults.width = width.unwrap_or(defaults.width);
            defaults.height = height.unwrap_or(defaults.height);
            defaults.fps = fps.unwrap_or(defaults.fps);
            commands::export::run(script, input, output, &config).await
        }
        Commands::Check => commands::check::run(),
    }
}
