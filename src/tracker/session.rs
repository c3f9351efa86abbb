use std::time::Duration;

use crate::predict::{GroundStation, SatelliteTrack};
use crate::radio::ChannelSetting;

use super::doppler::DopplerFormula;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Everything one tracking run needs, fixed when the run starts.
#[derive(Debug)]
pub struct TrackingSession {
    pub satellite: SatelliteTrack,
    pub station: GroundStation,
    pub receive: ChannelSetting,
    pub transmit: Option<ChannelSetting>,
    pub interval: Duration,
    pub listen_only: bool,
    pub formula: DopplerFormula,
}

impl TrackingSession {
    /// Listen-only session with a one second interval and the linear formula.
    pub fn new(
        satellite: SatelliteTrack,
        station: GroundStation,
        receive: ChannelSetting,
    ) -> Self {
        Self {
            satellite,
            station,
            receive,
            transmit: None,
            interval: DEFAULT_INTERVAL,
            listen_only: true,
            formula: DopplerFormula::default(),
        }
    }

    /// Adds an uplink channel and leaves listen-only mode.
    pub fn with_transmit(mut self, transmit: ChannelSetting) -> Self {
        self.transmit = Some(transmit);
        self.listen_only = false;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_formula(mut self, formula: DopplerFormula) -> Self {
        self.formula = formula;
        self
    }

    pub fn listen_only(mut self, listen_only: bool) -> Self {
        self.listen_only = listen_only;
        self
    }

    /// The uplink channel, unless the session only listens.
    pub fn transmit_channel(&self) -> Option<&ChannelSetting> {
        if self.listen_only {
            None
        } else {
            self.transmit.as_ref()
        }
    }
}
