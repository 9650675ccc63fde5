/// Nostalgia Player - play or probe a gallery source from the terminal
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nostalgia_audio_desktop::DesktopBackend;
use nostalgia_player::{session, PlayOptions, PlayerConfig};
use nostalgia_playback::{format_time, PlaybackController, SourceRef};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nostalgia-player")]
#[command(about = "Play gallery audio through a Nostalgia playback session", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./nostalgia.toml if present)
    #[arg(short, long, env = "NOSTALGIA_CONFIG")]
    config: Option<PathBuf>,

    /// Output device name (overrides the configuration)
    #[arg(short, long)]
    device: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a source to the end
    Play {
        /// File path or file:// URI
        uri: String,
        /// Volume between 0.0 and 1.0
        #[arg(long)]
        volume: Option<f32>,
        /// Start position as a fraction of the duration (0.0 - 1.0)
        #[arg(long)]
        start: Option<f64>,
    },
    /// Print the duration of a source
    Probe {
        /// File path or file:// URI
        uri: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "nostalgia_player=info,nostalgia_playback=info,nostalgia_audio_desktop=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = PlayerConfig::load(cli.config.as_deref())?;
    if cli.device.is_some() {
        config.output_device = cli.device;
    }

    let backend = DesktopBackend::open(config.output_device.as_deref())
        .context("failed to open audio output")?;
    let mut controller = PlaybackController::new(backend, config.playback.clone());

    match cli.command {
        Commands::Play { uri, volume, start } => {
            let source = SourceRef::parse(uri)?;
            let options = PlayOptions { volume, start };
            let report = session::play(&mut controller, source, options, config.poll_interval())?;
            println!(
                "finished at {} / {}",
                format_time(report.position_secs),
                format_time(report.duration_secs)
            );
        }
        Commands::Probe { uri } => {
            let source = SourceRef::parse(uri)?;
            let duration = session::probe(&mut controller, source, config.poll_interval())?;
            println!("{} ({:.3}s)", format_time(duration), duration);
        }
    }

    Ok(())
}
