mod catalog;
mod config;
mod predict;
mod radio;
mod tracker;
mod web;

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogCache, CatalogError};
use crate::config::{check_split_frequency, Config, ConfigError};
use crate::predict::Sgp4Ephemeris;
use crate::radio::{list_devices, RigModel, RigctldProcess};
use crate::tracker::{ConsoleSink, Tracker, TrackerError};
use crate::web::AppState;

#[derive(Parser)]
#[command(name = "dplr-tracker")]
#[command(about = "Doppler correction for satellite contacts through rigctld")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "dplr.yaml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a satellite until Ctrl-C
    Track {
        /// Name as listed in the TLE catalog
        #[arg(short, long)]
        satellite: String,
        /// Only correct the receive channel
        #[arg(long, conflicts_with = "duplex")]
        listen_only: bool,
        /// Correct the transmit channel as well
        #[arg(long)]
        duplex: bool,
        /// Tick interval (100ms, 500ms, 1s, 3s, 5s or 10s)
        #[arg(short, long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,
    },
    /// Enable split operation on the transmit VFO
    Split {
        /// Transmit frequency in Hz
        #[arg(short, long)]
        frequency: Option<u64>,
    },
    /// List the satellites in the TLE catalog
    Satellites,
    /// List serial devices a radio may be attached to
    Devices {
        /// Substring the device name must contain
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// List supported transceivers
    Rigs,
    /// Run the HTTP control API
    Serve,
    /// Print the resolved configuration
    Info,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Tracker(#[from] TrackerError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout belongs to the status panel
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .format_timestamp_secs()
        .init();

    let config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Track {
            satellite,
            listen_only,
            duplex,
            interval,
        } => {
            let listen_only = match (listen_only, duplex) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            track(config, &satellite, listen_only, interval).await
        }
        Commands::Split { frequency } => split(config, frequency).await,
        Commands::Satellites => satellites(config).await,
        Commands::Devices { filter } => devices(&config, filter),
        Commands::Rigs => {
            rigs();
            Ok(())
        }
        Commands::Serve => serve(config).await,
        Commands::Info => {
            info(&config);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        Config::from_file(path)
    } else {
        log::warn!("{} not found, using defaults", path.display());
        Ok(Config::default())
    }
}

async fn refresh_catalog(cache: CatalogCache) -> Result<Catalog, CliError> {
    let catalog = tokio::task::spawn_blocking(move || cache.refresh()).await??;
    Ok(catalog)
}

/// Starts rigctld when the configuration asks for it. The process lives as
/// long as the returned handle.
fn start_rigctld(config: &Config) -> Result<Option<RigctldProcess>, CliError> {
    let Some(rigctld) = &config.radio.rigctld else {
        return Ok(None);
    };
    let device = config.radio.device_dir.join(&rigctld.device);
    let mut process = RigctldProcess::spawn(
        &rigctld.binary,
        config.radio.rig,
        &device,
        config.rigctld_port()?,
        config.radio.vfo_mode,
        &rigctld.log_dir,
    )?;
    process.wait_ready(&config.radio.address, rigctld.startup_timeout)?;
    Ok(Some(process))
}

fn build_tracker(config: &Config) -> Tracker {
    Tracker::new(
        Some(Box::new(config.rig_client())),
        Arc::new(Sgp4Ephemeris),
    )
}

async fn track(
    config: Config,
    satellite: &str,
    listen_only: Option<bool>,
    interval: Option<Duration>,
) -> Result<(), CliError> {
    let catalog = refresh_catalog(config.catalog_cache()).await?;
    let satellite = catalog.resolve(satellite)?;
    let session = config.session(satellite, listen_only, interval)?;

    let _rigctld = start_rigctld(&config)?;
    let mut tracker = build_tracker(&config);
    tracker.start(session, vec![Box::new(ConsoleSink)]).await?;

    tokio::signal::ctrl_c().await?;
    tracker.stop().await?;
    Ok(())
}

async fn split(config: Config, frequency: Option<u64>) -> Result<(), CliError> {
    let frequency_hz =
        check_split_frequency(frequency.unwrap_or(config.tracking.split_frequency_hz))?;
    let tx_vfo = config.tracking.split_vfo;

    let _rigctld = start_rigctld(&config)?;
    build_tracker(&config).set_split(tx_vfo, frequency_hz).await?;
    println!("Split enabled: {} on {} Hz", tx_vfo, frequency_hz);
    Ok(())
}

async fn satellites(config: Config) -> Result<(), CliError> {
    let cache = config.catalog_cache();
    if let Some(updated) = cache.modified() {
        log::info!("TLE file {} from {}", cache.path().display(), updated);
    }
    let catalog = refresh_catalog(cache).await?;
    for name in catalog.names() {
        println!("{}", name);
    }
    Ok(())
}

fn devices(config: &Config, filter: Option<String>) -> Result<(), CliError> {
    let filter = filter.unwrap_or_else(|| config.radio.device_filter.clone());
    let filter = (!filter.is_empty()).then_some(filter.as_str());
    for device in list_devices(&config.radio.device_dir, filter)? {
        println!("{}", device);
    }
    Ok(())
}

fn rigs() {
    for rig in RigModel::ALL {
        println!("{}\t{}", rig.hamlib_id(), rig.name());
    }
}

async fn serve(config: Config) -> Result<(), CliError> {
    let _rigctld = start_rigctld(&config)?;
    let state = AppState::new(config.clone(), build_tracker(&config), config.catalog_cache());
    web::run_server(state).await?;
    Ok(())
}

fn info(config: &Config) {
    let radio = &config.radio;
    let device = radio
        .rigctld
        .as_ref()
        .map(|r| radio.device_dir.join(&r.device).display().to_string())
        .unwrap_or_else(|| "(external rigctld)".to_string());
    let tle_date = config
        .catalog_cache()
        .modified()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "(missing)".to_string());

    println!("Device:\t\t{}", device);
    println!("rigctld:\t{}", radio.address);
    println!("Rig ID:\t\t{}", radio.rig.hamlib_id());
    println!("Rig:\t\t{}", radio.rig);
    println!("QRG:\t\t{} Hz", config.receive.frequency_hz);
    println!("VFO:\t\t{}", config.receive.vfo);
    println!("Mode:\t\t{}", config.receive.mode);
    println!("Passband:\t{} Hz", config.receive.passband_hz);
    println!(
        "Uplink:\t\t{} Hz on {}",
        config.transmit.frequency_hz, config.transmit.vfo
    );
    println!(
        "Interval:\t{}",
        humantime::format_duration(config.tracking.interval)
    );
    println!("Listen only:\t{}", config.tracking.listen_only);
    println!("TLE file:\t{} ({})", config.catalog.path.display(), tle_date);
    println!(
        "Station:\t{}{}, elevation {} m",
        config
            .station
            .name
            .as_deref()
            .map(|name| format!("{} at ", name))
            .unwrap_or_default(),
        config.station.coordinates,
        config.station.elevation_m
    );
}
