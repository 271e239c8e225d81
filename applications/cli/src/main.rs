/// Encore - music library and player from the command line
use clap::{Parser, Subcommand};
use encore_cli::{app, commands, config::EncoreConfig};
use encore_core::TrackMetadata;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "encore=info,encore_cli=info,encore_sync=info,encore_playback=info,encore_client=info";

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Encore music library and player", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./encore.toml when present)
    #[arg(short, long, global = true, env = "ENCORE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the demo catalog and print player events
    Demo {
        /// How long to run the player
        #[arg(short, long, default_value_t = 5)]
        seconds: u64,
        /// Start near the end of the first track
        #[arg(long)]
        near_end: bool,
    },
    /// Show liked songs, playlists and uploads
    Library,
    /// Create a playlist
    CreatePlaylist {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a playlist
    DeletePlaylist { id: String },
    /// Like or unlike a track
    Like { track_id: String },
    /// Append a track to a playlist
    AddTrack {
        playlist_id: String,
        track_id: String,
    },
    /// Remove a track from a playlist
    RemoveTrack {
        playlist_id: String,
        track_id: String,
    },
    /// Upload an audio file
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: Option<String>,
        /// Duration in seconds
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },
    /// Add a track by URL
    AddUrl {
        url: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: Option<String>,
        /// Copy the audio into storage instead of streaming from the URL
        #[arg(long)]
        download: bool,
        /// Duration in seconds
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },
    /// Search tracks and playlists
    Search { query: String },
}

fn metadata(title: String, artist: String, album: Option<String>) -> TrackMetadata {
    TrackMetadata {
        album,
        ..TrackMetadata::new(title, artist)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = EncoreConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let app = app::connect(&config).await?;

    match cli.command {
        Commands::Demo { seconds, near_end } => {
            commands::demo(&app, &config, seconds, near_end).await?;
        }
        Commands::Library => {
            commands::library(&app).await?;
        }
        Commands::CreatePlaylist { name, description } => {
            commands::create_playlist(&app, &name, description.as_deref()).await?;
        }
        Commands::DeletePlaylist { id } => {
            commands::delete_playlist(&app, &id).await?;
        }
        Commands::Like { track_id } => {
            commands::like(&app, &track_id).await?;
        }
        Commands::AddTrack {
            playlist_id,
            track_id,
        } => {
            commands::add_track(&app, &playlist_id, &track_id).await?;
        }
        Commands::RemoveTrack {
            playlist_id,
            track_id,
        } => {
            commands::remove_track(&app, &playlist_id, &track_id).await?;
        }
        Commands::Upload {
            file,
            title,
            artist,
            album,
            duration,
        } => {
            commands::upload(&app, &file, metadata(title, artist, album), duration).await?;
        }
        Commands::AddUrl {
            url,
            title,
            artist,
            album,
            download,
            duration,
        } => {
            commands::add_url(&app, &url, metadata(title, artist, album), download, duration)
                .await?;
        }
        Commands::Search { query } => {
            commands::search(&app, &query).await?;
        }
    }

    Ok(())
}
