//! Fakes shared by the tracker tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::predict::{Ephemeris, GroundStation, Observation, PredictError, SatelliteTrack};
use crate::radio::{ChannelSetting, Mode, RadioError, Rig, Vfo};

use super::worker::Control;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RigCall {
    Open,
    Close,
    Vfo(Vfo),
    Mode(Mode, u32),
    Frequency(Vfo, u64),
    Split(bool, Vfo),
    SplitFrequency(u64),
}

#[derive(Default)]
pub struct FakeRig {
    pub calls: Arc<Mutex<Vec<RigCall>>>,
    pub fail_open: bool,
    pub panic_open: bool,
    /// Zero-based indices of `set_frequency` calls to reject.
    pub fail_frequency: HashSet<usize>,
    frequency_calls: usize,
}

impl FakeRig {
    pub fn new() -> (Self, Arc<Mutex<Vec<RigCall>>>) {
        let rig = Self::default();
        let calls = rig.calls.clone();
        (rig, calls)
    }

    fn record(&self, call: RigCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Rig for FakeRig {
    fn open(&mut self) -> Result<(), RadioError> {
        if self.panic_open {
            panic!("radio driver crashed");
        }
        if self.fail_open {
            return Err(RadioError::Connect {
                address: "fake".into(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }
        self.record(RigCall::Open);
        Ok(())
    }

    fn close(&mut self) -> Result<(), RadioError> {
        self.record(RigCall::Close);
        Ok(())
    }

    fn set_vfo(&mut self, vfo: Vfo) -> Result<(), RadioError> {
        self.record(RigCall::Vfo(vfo));
        Ok(())
    }

    fn set_mode(&mut self, mode: Mode, passband_hz: u32) -> Result<(), RadioError> {
        self.record(RigCall::Mode(mode, passband_hz));
        Ok(())
    }

    fn set_frequency(&mut self, vfo: Vfo, frequency_hz: u64) -> Result<(), RadioError> {
        let index = self.frequency_calls;
        self.frequency_calls += 1;
        if self.fail_frequency.contains(&index) {
            return Err(RadioError::CommandFailed {
                command: format!("F {}", frequency_hz),
                reason: "rejected".into(),
            });
        }
        self.record(RigCall::Frequency(vfo, frequency_hz));
        Ok(())
    }

    fn set_split_mode(&mut self, enabled: bool, tx_vfo: Vfo) -> Result<(), RadioError> {
        self.record(RigCall::Split(enabled, tx_vfo));
        Ok(())
    }

    fn set_split_frequency(&mut self, frequency_hz: u64) -> Result<(), RadioError> {
        self.record(RigCall::SplitFrequency(frequency_hz));
        Ok(())
    }
}

/// Satellite straight overhead at 1000 km, receding at a fixed rate.
pub struct FakeEphemeris {
    pub radial_velocity_km_s: f64,
    pub calls: AtomicUsize,
    /// Calls (zero-based) that report a degenerate geometry.
    pub degenerate: HashSet<usize>,
    /// Sends `Control::Stop` once this many observations were made.
    pub stop_after: Option<(usize, Mutex<Sender<Control>>)>,
}

impl FakeEphemeris {
    pub fn new(radial_velocity_km_s: f64) -> Self {
        Self {
            radial_velocity_km_s,
            calls: AtomicUsize::new(0),
            degenerate: HashSet::new(),
            stop_after: None,
        }
    }

    pub fn stopping_after(mut self, ticks: usize, control: Sender<Control>) -> Self {
        self.stop_after = Some((ticks, Mutex::new(control)));
        self
    }
}

impl Ephemeris for FakeEphemeris {
    fn observe(
        &self,
        _satellite: &SatelliteTrack,
        _station: &GroundStation,
        timestamp: DateTime<Utc>,
    ) -> Result<Observation, PredictError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((ticks, control)) = &self.stop_after {
            if call + 1 == *ticks {
                let _ = control.lock().unwrap().send(Control::Stop);
            }
        }
        let position = if self.degenerate.contains(&call) {
            [0.0; 3]
        } else {
            [0.0, 0.0, 1000.0]
        };
        Ok(Observation {
            timestamp,
            relative_position_km: position,
            relative_velocity_km_s: [0.0, 0.0, self.radial_velocity_km_s],
            elevation_deg: 90.0,
            azimuth_deg: 0.0,
            range_km: 1000.0,
        })
    }
}

pub fn receive_channel() -> ChannelSetting {
    ChannelSetting::new(Vfo::A, Mode::Fm, 437_800_000, 2_700).unwrap()
}

pub fn transmit_channel() -> ChannelSetting {
    ChannelSetting::new(Vfo::B, Mode::Fm, 145_990_000, 2_700).unwrap()
}
