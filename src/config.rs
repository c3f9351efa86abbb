use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::{CatalogCache, DEFAULT_MAX_AGE, DEFAULT_URL};
use crate::predict::{GroundStation, PredictError, SatelliteTrack};
use crate::radio::{
    ChannelSetting, Mode, RigModel, RigctldClient, SettingError, Vfo, DEFAULT_DEVICE_DIR,
    DEFAULT_DEVICE_FILTER, DEFAULT_PASSBAND_HZ, DEFAULT_RECEIVE_HZ, DEFAULT_RIGCTLD_ADDRESS,
    DEFAULT_SPLIT_HZ, DEFAULT_TRANSMIT_HZ, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ,
};
use crate::tracker::{DopplerFormula, TrackingSession, DEFAULT_INTERVAL};

/// Tick intervals offered to the operator.
pub const ALLOWED_INTERVALS: [Duration; 6] = [
    Duration::from_millis(100),
    Duration::from_millis(500),
    Duration::from_secs(1),
    Duration::from_secs(3),
    Duration::from_secs(5),
    Duration::from_secs(10),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid setting: {0}")]
    Setting(#[from] SettingError),
    #[error("Invalid station: {0}")]
    Station(#[from] PredictError),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default = "default_receive")]
    pub receive: ChannelConfig,
    #[serde(default = "default_transmit")]
    pub transmit: ChannelConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub web: WebConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station: StationConfig::default(),
            catalog: CatalogConfig::default(),
            radio: RadioConfig::default(),
            receive: default_receive(),
            transmit: default_transmit(),
            tracking: TrackingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    /// `"lat, lon"` in degrees.
    pub coordinates: String,
    #[serde(default)]
    pub elevation_m: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        let station = GroundStation::default();
        Self {
            name: None,
            coordinates: format!("{}, {}", station.latitude_deg, station.longitude_deg),
            elevation_m: station.elevation_m,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
    #[serde(default = "default_catalog_url")]
    pub url: String,
    #[serde(default = "default_max_age", deserialize_with = "duration")]
    pub max_age: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            url: default_catalog_url(),
            max_age: default_max_age(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadioConfig {
    #[serde(default)]
    pub rig: RigModel,
    #[serde(default = "default_rigctld_address")]
    pub address: String,
    #[serde(default = "default_command_timeout", deserialize_with = "duration")]
    pub command_timeout: Duration,
    /// Set when rigctld runs with `--vfo`.
    #[serde(default)]
    pub vfo_mode: bool,
    #[serde(default = "default_device_dir")]
    pub device_dir: PathBuf,
    #[serde(default = "default_device_filter")]
    pub device_filter: String,
    pub rigctld: Option<RigctldConfig>,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            rig: RigModel::default(),
            address: default_rigctld_address(),
            command_timeout: default_command_timeout(),
            vfo_mode: false,
            device_dir: default_device_dir(),
            device_filter: default_device_filter(),
            rigctld: None,
        }
    }
}

/// Present when this program should start rigctld itself.
#[derive(Debug, Clone, Deserialize)]
pub struct RigctldConfig {
    #[serde(default = "default_rigctld_binary")]
    pub binary: String,
    /// Device name under `radio.device_dir`.
    pub device: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_startup_timeout", deserialize_with = "duration")]
    pub startup_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub vfo: Vfo,
    #[serde(default)]
    pub mode: Mode,
    pub frequency_hz: u64,
    #[serde(default = "default_passband")]
    pub passband_hz: u32,
}

impl ChannelConfig {
    pub fn setting(&self) -> Result<ChannelSetting, SettingError> {
        ChannelSetting::new(self.vfo, self.mode, self.frequency_hz, self.passband_hz)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_interval", deserialize_with = "duration")]
    pub interval: Duration,
    #[serde(default = "default_true")]
    pub listen_only: bool,
    #[serde(default)]
    pub formula: DopplerFormula,
    #[serde(default = "default_split_frequency")]
    pub split_frequency_hz: u64,
    #[serde(default = "default_split_vfo")]
    pub split_vfo: Vfo,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            listen_only: true,
            formula: DopplerFormula::default(),
            split_frequency_hz: default_split_frequency(),
            split_vfo: default_split_vfo(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

fn default_receive() -> ChannelConfig {
    ChannelConfig {
        vfo: Vfo::A,
        mode: Mode::Fm,
        frequency_hz: DEFAULT_RECEIVE_HZ,
        passband_hz: DEFAULT_PASSBAND_HZ,
    }
}

fn default_transmit() -> ChannelConfig {
    ChannelConfig {
        vfo: Vfo::B,
        mode: Mode::Fm,
        frequency_hz: DEFAULT_TRANSMIT_HZ,
        passband_hz: DEFAULT_PASSBAND_HZ,
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("tle.txt")
}

fn default_catalog_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_max_age() -> Duration {
    DEFAULT_MAX_AGE
}

fn default_rigctld_address() -> String {
    DEFAULT_RIGCTLD_ADDRESS.to_string()
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_device_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE_DIR)
}

fn default_device_filter() -> String {
    DEFAULT_DEVICE_FILTER.to_string()
}

fn default_rigctld_binary() -> String {
    "rigctld".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_startup_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_passband() -> u32 {
    DEFAULT_PASSBAND_HZ
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_true() -> bool {
    true
}

fn default_split_frequency() -> u64 {
    DEFAULT_SPLIT_HZ
}

fn default_split_vfo() -> Vfo {
    Vfo::B
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Rejects intervals outside [`ALLOWED_INTERVALS`].
pub fn check_interval(interval: Duration) -> Result<Duration, ConfigError> {
    if ALLOWED_INTERVALS.contains(&interval) {
        Ok(interval)
    } else {
        Err(ConfigError::Invalid(format!(
            "interval {} is not one of 100ms, 500ms, 1s, 3s, 5s, 10s",
            humantime::format_duration(interval)
        )))
    }
}

/// Rejects split frequencies the radio cannot be tuned to.
pub fn check_split_frequency(frequency_hz: u64) -> Result<u64, ConfigError> {
    if (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&frequency_hz) {
        Ok(frequency_hz)
    } else {
        Err(SettingError::FrequencyOutOfRange(frequency_hz).into())
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses and validates a YAML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.station()?;
        self.receive.setting()?;
        self.transmit.setting()?;
        check_interval(self.tracking.interval)?;
        check_split_frequency(self.tracking.split_frequency_hz)?;
        self.rigctld_port()?;
        Ok(())
    }

    pub fn station(&self) -> Result<GroundStation, ConfigError> {
        Ok(GroundStation::from_coordinates(
            &self.station.coordinates,
            self.station.elevation_m,
        )?)
    }

    /// Port rigctld listens on, taken from `radio.address`.
    pub fn rigctld_port(&self) -> Result<u16, ConfigError> {
        self.radio
            .address
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "rigctld address \"{}\" has no port",
                    self.radio.address
                ))
            })
    }

    pub fn rig_client(&self) -> RigctldClient {
        RigctldClient::new(
            self.radio.address.clone(),
            self.radio.command_timeout,
            self.radio.vfo_mode,
        )
    }

    pub fn catalog_cache(&self) -> CatalogCache {
        CatalogCache::new(
            self.catalog.path.clone(),
            self.catalog.url.clone(),
            self.catalog.max_age,
        )
    }

    /// Builds a session for `satellite` from the configured channels.
    ///
    /// `listen_only` and `interval` override the tracking section.
    pub fn session(
        &self,
        satellite: SatelliteTrack,
        listen_only: Option<bool>,
        interval: Option<Duration>,
    ) -> Result<TrackingSession, ConfigError> {
        let interval = check_interval(interval.unwrap_or(self.tracking.interval))?;
        let session = TrackingSession::new(satellite, self.station()?, self.receive.setting()?)
            .with_transmit(self.transmit.setting()?)
            .with_interval(interval)
            .with_formula(self.tracking.formula)
            .listen_only(listen_only.unwrap_or(self.tracking.listen_only));
        Ok(session)
    }
}
