use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ConfigCommand, DestinationCommand, SyncCommand, TripCommand};
use travelog::sync::{ApiClient, PreloadOutcome, Preloader};
use travelog::{init_db, Config, DestinationRepository, SettingsRepository, TripRepository};

#[derive(Parser)]
#[command(name = "travelog")]
#[command(version)]
#[command(about = "Keep track of destinations and trips", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage destinations
    Destination(DestinationCommand),

    /// Manage trips
    Trip(TripCommand),

    /// Sync with the remote API
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travelog=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let pool = init_db(&config.database_path.value).await?;
    let preloader = Preloader::new(
        ApiClient::new(config.api_base_url.value.clone()),
        pool.clone(),
    );

    // Preload BEFORE data commands; the sync command drives it itself
    if config.preload.value && !matches!(command, Commands::Sync(_)) {
        try_preload(&preloader).await;
    }

    let destinations = DestinationRepository::new(pool.clone());
    let trips = TripRepository::new(pool.clone());

    match command {
        Commands::Destination(cmd) => cmd.run(&destinations, &trips).await,
        Commands::Trip(cmd) => cmd.run(&trips, &destinations).await,
        Commands::Sync(cmd) => {
            let settings = SettingsRepository::new(pool);
            cmd.run(&preloader, &settings, &config).await
        }
        Commands::Config(cmd) => cmd.run(&config),
    }
}

/// Runs the one-time preload. Failures never block the command; the flag
/// stays unset so the next launch tries again.
async fn try_preload(preloader: &Preloader) {
    match preloader.preload_if_needed().await {
        PreloadOutcome::Completed(report) => {
            let stored = report.images.wait().await;
            tracing::info!("Preload stored {} picture(s)", stored);
        }
        PreloadOutcome::Failed {
            stage,
            error,
            images,
        } => {
            eprintln!("Preload: failed syncing {}, will retry next launch ({})", stage, error);
            // Destinations committed before the failure still get their pictures
            images.wait().await;
        }
        PreloadOutcome::AlreadyPreloaded | PreloadOutcome::AlreadyRunning => {}
    }
}
