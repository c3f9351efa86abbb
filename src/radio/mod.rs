mod devices;
mod process;
mod rigctld;
mod types;

use thiserror::Error;

pub use devices::{list_devices, DEFAULT_DEVICE_DIR, DEFAULT_DEVICE_FILTER};
pub use process::RigctldProcess;
pub use rigctld::{RigctldClient, DEFAULT_RIGCTLD_ADDRESS};
pub use types::{
    ChannelSetting, Mode, RigModel, SettingError, Vfo, DEFAULT_PASSBAND_HZ, DEFAULT_RECEIVE_HZ,
    DEFAULT_SPLIT_HZ, DEFAULT_TRANSMIT_HZ, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ,
};

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("cannot connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("radio connection is not open")]
    NotOpen,
    #[error("command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Control surface of a transceiver.
///
/// Every mutating call talks to the radio and may be rejected.
pub trait Rig: Send {
    fn open(&mut self) -> Result<(), RadioError>;
    fn close(&mut self) -> Result<(), RadioError>;
    fn set_vfo(&mut self, vfo: Vfo) -> Result<(), RadioError>;
    fn set_mode(&mut self, mode: Mode, passband_hz: u32) -> Result<(), RadioError>;
    /// Adapters that cannot address a VFO per command tune the selected one,
    /// so callers select `vfo` first.
    fn set_frequency(&mut self, vfo: Vfo, frequency_hz: u64) -> Result<(), RadioError>;
    fn set_split_mode(&mut self, enabled: bool, tx_vfo: Vfo) -> Result<(), RadioError>;
    fn set_split_frequency(&mut self, frequency_hz: u64) -> Result<(), RadioError>;
}

/// Selects the channel's VFO, sets mode and passband, then tunes it.
pub fn tune(
    rig: &mut dyn Rig,
    channel: &ChannelSetting,
    frequency_hz: u64,
) -> Result<(), RadioError> {
    rig.set_vfo(channel.vfo)?;
    rig.set_mode(channel.mode, channel.passband_hz)?;
    rig.set_frequency(channel.vfo, frequency_hz)
}

/// Turns split on and parks the transmit VFO on `frequency_hz`.
pub fn enable_split(
    rig: &mut dyn Rig,
    tx_vfo: Vfo,
    frequency_hz: u64,
) -> Result<(), RadioError> {
    rig.set_split_mode(true, tx_vfo)?;
    rig.set_split_frequency(frequency_hz)
}
