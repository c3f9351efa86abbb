use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// What the operator sees after each tick.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusSnapshot {
    pub satellite: String,
    pub timestamp: DateTime<Utc>,
    pub receive_hz: f64,
    pub transmit_hz: Option<f64>,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
    pub radial_velocity_km_s: f64,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Satellite:\t{}", self.satellite)?;
        writeln!(f, "Frequency:\t{:.6} MHz", self.receive_hz / 1_000_000.0)?;
        if let Some(tx) = self.transmit_hz {
            writeln!(f, "Uplink:\t\t{:.6} MHz", tx / 1_000_000.0)?;
        }
        writeln!(f, "Elevation:\t{}°", self.elevation_deg.round() as i64)?;
        writeln!(f, "Azimuth:\t{}°", self.azimuth_deg.round() as i64)?;
        write!(f, "Distance:\t{} km", self.range_km.round() as i64)
    }
}

/// Receives one snapshot per successful tick. Each one replaces the last.
pub trait StatusSink: Send {
    fn publish(&mut self, snapshot: &StatusSnapshot);
}

/// Latest snapshot, readable from other tasks.
#[derive(Debug, Clone, Default)]
pub struct SharedStatus {
    latest: Arc<Mutex<Option<StatusSnapshot>>>,
}

impl SharedStatus {
    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.latest.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.latest.lock().unwrap().take();
    }
}

impl StatusSink for SharedStatus {
    fn publish(&mut self, snapshot: &StatusSnapshot) {
        *self.latest.lock().unwrap() = Some(snapshot.clone());
    }
}

/// Redraws the snapshot in place on stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn publish(&mut self, snapshot: &StatusSnapshot) {
        let mut out = std::io::stdout().lock();
        // clear screen, cursor home
        let _ = writeln!(out, "\x1B[2J\x1B[H{}", snapshot);
        let _ = out.flush();
    }
}
