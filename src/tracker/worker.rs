use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::predict::{Ephemeris, Observation, RelativeKinematics};
use crate::radio::{enable_split, tune, Rig, Vfo};

use super::doppler::radial_velocity;
use super::error::TrackerError;
use super::session::TrackingSession;
use super::status::{StatusSink, StatusSnapshot};

/// Requests delivered to a running worker between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Stop,
    SetSplit { tx_vfo: Vfo, frequency_hz: u64 },
}

/// What a worker hands back when its session ends.
pub struct WorkerExit {
    pub rig: Box<dyn Rig>,
    pub ticks: u64,
    pub failed_ticks: u64,
}

/// Runs one tracking session; owns the radio while it does.
pub struct Worker {
    session: TrackingSession,
    rig: Box<dyn Rig>,
    ephemeris: Arc<dyn Ephemeris>,
    sinks: Vec<Box<dyn StatusSink>>,
    clock: fn() -> DateTime<Utc>,
    ticks: u64,
    failed_ticks: u64,
}

impl Worker {
    pub fn new(
        session: TrackingSession,
        rig: Box<dyn Rig>,
        ephemeris: Arc<dyn Ephemeris>,
        sinks: Vec<Box<dyn StatusSink>>,
    ) -> Self {
        Self {
            session,
            rig,
            ephemeris,
            sinks,
            clock: Utc::now,
            ticks: 0,
            failed_ticks: 0,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Ticks until `Control::Stop` arrives or every sender is gone, then puts
    /// the receive VFO back on its base frequency and closes the radio.
    pub fn run(mut self, control: Receiver<Control>) -> WorkerExit {
        log::info!(
            "Tracking {} (NORAD {}) every {:?} ({})",
            self.session.satellite.name(),
            self.session.satellite.norad_id(),
            self.session.interval,
            if self.session.transmit_channel().is_some() {
                "duplex"
            } else {
                "listen only"
            }
        );

        'session: loop {
            let deadline = Instant::now() + self.session.interval;

            self.ticks += 1;
            if let Err(e) = self.tick() {
                self.failed_ticks += 1;
                log::warn!("Tick {} skipped: {}", self.ticks, e);
            }

            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match control.recv_timeout(remaining) {
                    Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break 'session,
                    Ok(Control::SetSplit {
                        tx_vfo,
                        frequency_hz,
                    }) => {
                        if let Err(e) = enable_split(self.rig.as_mut(), tx_vfo, frequency_hz) {
                            log::warn!("Failed to set split: {}", e);
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => break,
                }
            }
        }

        self.finish();
        WorkerExit {
            rig: self.rig,
            ticks: self.ticks,
            failed_ticks: self.failed_ticks,
        }
    }

    /// One pass: geometry, Doppler, radio, status.
    pub fn tick(&mut self) -> Result<StatusSnapshot, TrackerError> {
        let now = (self.clock)();
        let session = &self.session;
        let observation = self
            .ephemeris
            .observe(&session.satellite, &session.station, now)?;
        let kinematics = kinematics(&observation)?;
        let v = kinematics.radial_velocity_km_s;

        let receive = &session.receive;
        let receive_hz = session
            .formula
            .shifted_frequency(receive.frequency_hz as f64, v)?;
        tune(self.rig.as_mut(), receive, receive_hz.round() as u64)?;

        let transmit_hz = match session.transmit_channel() {
            Some(transmit) => {
                let hz = session
                    .formula
                    .precompensated_frequency(transmit.frequency_hz as f64, v)?;
                tune(self.rig.as_mut(), transmit, hz.round() as u64)?;
                Some(hz)
            }
            None => None,
        };

        let snapshot = StatusSnapshot {
            satellite: session.satellite.name().to_string(),
            timestamp: kinematics.timestamp,
            receive_hz,
            transmit_hz,
            elevation_deg: kinematics.elevation_deg,
            azimuth_deg: kinematics.azimuth_deg,
            range_km: kinematics.range_km,
            radial_velocity_km_s: v,
        };
        for sink in self.sinks.iter_mut() {
            sink.publish(&snapshot);
        }
        Ok(snapshot)
    }

    fn finish(&mut self) {
        let receive = self.session.receive;
        let restore = self
            .rig
            .set_vfo(receive.vfo)
            .and_then(|_| self.rig.set_frequency(receive.vfo, receive.frequency_hz));
        if let Err(e) = restore {
            log::warn!(
                "Failed to restore {} to {} Hz: {}",
                receive.vfo,
                receive.frequency_hz,
                e
            );
        }
        if let Err(e) = self.rig.close() {
            log::warn!("Failed to close radio: {}", e);
        }
        log::info!(
            "Stopped tracking {} after {} ticks ({} skipped)",
            self.session.satellite.name(),
            self.ticks,
            self.failed_ticks
        );
    }
}

fn kinematics(observation: &Observation) -> Result<RelativeKinematics, TrackerError> {
    Ok(RelativeKinematics {
        timestamp: observation.timestamp,
        elevation_deg: observation.elevation_deg,
        azimuth_deg: observation.azimuth_deg,
        range_km: observation.range_km,
        radial_velocity_km_s: radial_velocity(
            observation.relative_position_km,
            observation.relative_velocity_km_s,
        )?,
    })
}
