//! Reelwright CLI: command-line interface for building product reels.
//!
//! Usage:
//!   reelwright init <TITLE>            Create a job directory with a job.json
//!   reelwright validate <PATH>         Validate a job file and its sources
//!   reelwright render <PATH>           Render the reel, thumbnail and plan report
//!   reelwright thumbnail <IMAGE>       Draw a thumbnail from one photo
//!   reelwright captions convert <IN>   Convert between WebVTT, SRT and tick events
//!   reelwright captions show <IN>      Print normalized cues
//!   reelwright script <PATH>           Print the narration script for a job
//!   reelwright check [--write-config]  Check the encoder and fonts

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelwright_common::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelwright",
    about = "Turn product photos and a narration track into a vertical video reel",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/reelwright/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new job directory
    Init {
        /// Reel title
        title: String,

        /// Parent directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Photo reference (URL or path); repeat for more
        #[arg(short, long = "photo")]
        photos: Vec<String>,

        /// Narration audio, relative to the job directory
        #[arg(long, default_value = "narration.mp3")]
        narration: String,

        /// Measured narration length in seconds
        #[arg(long, default_value = "25.0")]
        duration: f64,
    },

    /// Validate a job file and the files it references
    Validate {
        /// Job directory or job.json
        path: PathBuf,
    },

    /// Render a job to video and thumbnail
    Render {
        /// Job directory or job.json
        path: PathBuf,

        /// Compile and write the plan report without encoding
        #[arg(long)]
        dry_run: bool,

        /// Output directory (overrides configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draw a thumbnail from a single photo
    Thumbnail {
        /// Hero photo
        image: PathBuf,

        /// Title text
        #[arg(short, long)]
        title: String,

        /// Brand badge text
        #[arg(short, long)]
        brand: Option<String>,

        /// Output JPEG
        #[arg(short, long, default_value = "thumbnail.jpg")]
        output: PathBuf,
    },

    /// Caption source utilities
    Captions {
        #[command(subcommand)]
        command: CaptionsCommand,
    },

    /// Print the narration script for a job's product
    Script {
        /// Job directory or job.json
        path: PathBuf,

        /// reviews_first | features_first | reviews_only | features_only
        #[arg(long)]
        source: Option<String>,
    },

    /// Check the encoder and fonts
    Check {
        /// Write the effective configuration to the standard config path
        #[arg(long)]
        write_config: bool,
    },
}

#[derive(Subcommand)]
enum CaptionsCommand {
    /// Convert a caption source to SRT or WebVTT
    Convert {
        /// Input caption file
        input: PathBuf,

        /// Target format: srt | vtt
        #[arg(long, default_value = "srt")]
        to: String,

        /// Input format when the extension is ambiguous: ticks | vtt | srt
        #[arg(long)]
        from: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print normalized cues
    Show {
        /// Input caption file
        input: PathBuf,

        /// Input format: ticks | vtt | srt
        #[arg(long)]
        from: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>, verbose: bool) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };
    let mut config = config.with_env_overrides()?;
    if verbose {
        config.logging.level = "debug".to_string();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref(), cli.verbose)?;
    reelwright_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init {
            title,
            output,
            photos,
            narration,
            duration,
        } => commands::init::run(title, output, photos, narration, duration),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Render {
            path,
            dry_run,
            output,
        } => commands::render::run(path, dry_run, output, config).await,
        Commands::Thumbnail {
            image,
            title,
            brand,
            output,
        } => commands::thumbnail::run(image, title, brand, output, &config),
        Commands::Captions { command } => match command {
            CaptionsCommand::Convert {
                input,
                to,
                from,
                output,
            } => commands::captions::convert(input, to, from, output),
            CaptionsCommand::Show { input, from, json } => {
                commands::captions::show(input, from, json)
            }
        },
        Commands::Script { path, source } => commands::script::run(path, source, &config),
        Commands::Check { write_config } => commands::check::run(&config, write_config).await,
    }
}
