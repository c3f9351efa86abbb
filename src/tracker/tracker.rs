use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::predict::Ephemeris;
use crate::radio::{enable_split, Rig, Vfo};

use super::error::TrackerError;
use super::session::TrackingSession;
use super::status::{SharedStatus, StatusSink, StatusSnapshot};
use super::worker::{Control, Worker, WorkerExit};

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackerMode {
    Idle,
    Tracking {
        satellite: String,
        start: DateTime<Utc>,
        listen_only: bool,
    },
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TrackerStatus {
    pub mode: TrackerMode,
    pub last_snapshot: Option<StatusSnapshot>,
}

struct WorkerHandle {
    control: Sender<Control>,
    join: JoinHandle<WorkerExit>,
}

/// Owns the radio between sessions and at most one running worker.
pub struct Tracker {
    rig: Option<Box<dyn Rig>>,
    ephemeris: Arc<dyn Ephemeris>,
    status: SharedStatus,
    mode: TrackerMode,
    worker: Option<WorkerHandle>,
}

impl Tracker {
    pub fn new(rig: Option<Box<dyn Rig>>, ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self {
            rig,
            ephemeris,
            status: SharedStatus::default(),
            mode: TrackerMode::Idle,
            worker: None,
        }
    }

    pub fn mode(&self) -> &TrackerMode {
        &self.mode
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn last_snapshot(&self) -> Option<StatusSnapshot> {
        self.status.latest()
    }

    pub fn status(&self) -> TrackerStatus {
        TrackerStatus {
            mode: self.mode.clone(),
            last_snapshot: self.last_snapshot(),
        }
    }

    /// Opens the radio and hands it to a new worker.
    ///
    /// Returns `TrackerError::Worker` if opening panics; the radio is lost
    /// then and later calls fail with `NoRadio`.
    ///
    /// `sinks` receive every snapshot in addition to the tracker's own
    /// status. When the radio cannot be opened it stays with the tracker.
    pub async fn start(
        &mut self,
        session: TrackingSession,
        sinks: Vec<Box<dyn StatusSink>>,
    ) -> Result<(), TrackerError> {
        if self.is_running() {
            return Err(TrackerError::AlreadyRunning);
        }
        let mut rig = self.rig.take().ok_or(TrackerError::NoRadio)?;

        let (rig, opened) = tokio::task::spawn_blocking(move || {
            let opened = rig.open();
            (rig, opened)
        })
        .await
        .map_err(radio_lost)?;
        if let Err(e) = opened {
            self.rig = Some(rig);
            return Err(TrackerError::RadioOpenFailed(e));
        }

        self.status.clear();
        let mut all_sinks: Vec<Box<dyn StatusSink>> = vec![Box::new(self.status.clone())];
        all_sinks.extend(sinks);

        self.mode = TrackerMode::Tracking {
            satellite: session.satellite.name().to_string(),
            start: Utc::now(),
            listen_only: session.transmit_channel().is_none(),
        };

        let worker = Worker::new(session, rig, self.ephemeris.clone(), all_sinks);
        let (control, control_rx) = mpsc::channel();
        let join = tokio::task::spawn_blocking(move || worker.run(control_rx));
        self.worker = Some(WorkerHandle { control, join });
        Ok(())
    }

    /// Stops the running worker and takes the radio back. Does nothing when idle.
    pub async fn stop(&mut self) -> Result<(), TrackerError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.mode = TrackerMode::Idle;

        // a worker that already exited dropped its receiver
        let _ = worker.control.send(Control::Stop);
        let exit = worker.join.await.map_err(radio_lost)?;
        log::debug!(
            "Worker finished after {} ticks, {} skipped",
            exit.ticks,
            exit.failed_ticks
        );
        self.rig = Some(exit.rig);
        Ok(())
    }

    /// Enables split operation with `tx_vfo` on `frequency_hz`.
    ///
    /// While tracking, the request is queued to the worker and applied
    /// between ticks. Otherwise the radio is opened just for this.
    pub async fn set_split(&mut self, tx_vfo: Vfo, frequency_hz: u64) -> Result<(), TrackerError> {
        if let Some(worker) = &self.worker {
            return worker
                .control
                .send(Control::SetSplit {
                    tx_vfo,
                    frequency_hz,
                })
                .map_err(|_| TrackerError::Worker("worker is gone".to_string()));
        }

        let mut rig = self.rig.take().ok_or(TrackerError::NoRadio)?;
        let (rig, result) = tokio::task::spawn_blocking(move || {
            let result = split_once(rig.as_mut(), tx_vfo, frequency_hz);
            (rig, result)
        })
        .await
        .map_err(radio_lost)?;
        self.rig = Some(rig);
        result
    }
}

/// A task that panicked while holding the radio took it down with it. The
/// tracker stays idle without a radio and reports `NoRadio` until restarted.
fn radio_lost(e: tokio::task::JoinError) -> TrackerError {
    log::error!("Radio task failed, tracker left without a radio: {}", e);
    TrackerError::Worker(e.to_string())
}

fn split_once(rig: &mut dyn Rig, tx_vfo: Vfo, frequency_hz: u64) -> Result<(), TrackerError> {
    rig.open().map_err(TrackerError::RadioOpenFailed)?;
    let result = enable_split(rig, tx_vfo, frequency_hz);
    if let Err(e) = rig.close() {
        log::warn!("Failed to close radio: {}", e);
    }
    result.map_err(TrackerError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::fixtures;
    use crate::predict::GroundStation;
    use crate::tracker::testing::{receive_channel, FakeEphemeris, FakeRig, RigCall};
    use std::time::Duration;

    fn session() -> TrackingSession {
        TrackingSession::new(fixtures::iss(), GroundStation::default(), receive_channel())
            .with_interval(Duration::from_millis(5))
    }

    fn tracker(rig: FakeRig) -> Tracker {
        Tracker::new(Some(Box::new(rig)), Arc::new(FakeEphemeris::new(3.0)))
    }

    async fn wait_for_snapshot(tracker: &Tracker) -> StatusSnapshot {
        for _ in 0..200 {
            if let Some(snapshot) = tracker.last_snapshot() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no snapshot published");
    }

    #[tokio::test]
    async fn start_and_stop() {
        let (rig, calls) = FakeRig::new();
        let mut tracker = tracker(rig);
        assert_eq!(tracker.mode(), &TrackerMode::Idle);

        tracker.start(session(), Vec::new()).await.unwrap();
        assert!(matches!(
            tracker.mode(),
            TrackerMode::Tracking { satellite, listen_only: true, .. } if satellite == "ISS (ZARYA)"
        ));
        let snapshot = wait_for_snapshot(&tracker).await;
        assert_eq!(snapshot.radial_velocity_km_s, 3.0);

        tracker.stop().await.unwrap();
        assert_eq!(tracker.mode(), &TrackerMode::Idle);
        assert!(!tracker.is_running());

        let calls = calls.lock().unwrap();
        assert_eq!(calls.first(), Some(&RigCall::Open));
        assert_eq!(calls.last(), Some(&RigCall::Close));
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (rig, _) = FakeRig::new();
        let mut tracker = tracker(rig);
        tracker.start(session(), Vec::new()).await.unwrap();

        let err = tracker.start(session(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyRunning));

        tracker.stop().await.unwrap();
    }

    #[tokio::test]
    async fn radio_comes_back_for_next_session() {
        let (rig, calls) = FakeRig::new();
        let mut tracker = tracker(rig);

        for _ in 0..2 {
            tracker.start(session(), Vec::new()).await.unwrap();
            wait_for_snapshot(&tracker).await;
            tracker.stop().await.unwrap();
        }

        let opens = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == RigCall::Open)
            .count();
        assert_eq!(opens, 2);
    }

    #[tokio::test]
    async fn start_without_radio() {
        let mut tracker = Tracker::new(None, Arc::new(FakeEphemeris::new(0.0)));
        let err = tracker.start(session(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, TrackerError::NoRadio));
    }

    #[tokio::test]
    async fn failed_open_keeps_radio_and_idle_mode() {
        let (mut rig, calls) = FakeRig::new();
        rig.fail_open = true;
        let mut tracker = tracker(rig);

        let err = tracker.start(session(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, TrackerError::RadioOpenFailed(_)));
        assert_eq!(tracker.mode(), &TrackerMode::Idle);
        assert!(calls.lock().unwrap().is_empty());

        // radio is still owned by the tracker
        let err = tracker.start(session(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, TrackerError::RadioOpenFailed(_)));
    }

    #[tokio::test]
    async fn panicking_open_leaves_tracker_idle_without_radio() {
        let (mut rig, _) = FakeRig::new();
        rig.panic_open = true;
        let mut tracker = tracker(rig);

        let err = tracker.start(session(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, TrackerError::Worker(_)));
        assert_eq!(tracker.mode(), &TrackerMode::Idle);
        assert!(!tracker.is_running());

        let err = tracker.start(session(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, TrackerError::NoRadio));
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_no_op() {
        let (rig, calls) = FakeRig::new();
        let mut tracker = tracker(rig);
        tracker.stop().await.unwrap();
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn split_while_idle_opens_and_closes() {
        let (rig, calls) = FakeRig::new();
        let mut tracker = tracker(rig);

        tracker.set_split(Vfo::B, 145_500_000).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                RigCall::Open,
                RigCall::Split(true, Vfo::B),
                RigCall::SplitFrequency(145_500_000),
                RigCall::Close,
            ]
        );
    }

    #[tokio::test]
    async fn split_while_tracking_goes_through_worker() {
        let (rig, calls) = FakeRig::new();
        let mut tracker = tracker(rig);
        tracker.start(session(), Vec::new()).await.unwrap();
        wait_for_snapshot(&tracker).await;

        tracker.set_split(Vfo::B, 145_500_000).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tracker.stop().await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|c| **c == RigCall::Open).count(), 1);
        assert!(calls.contains(&RigCall::SplitFrequency(145_500_000)));
    }

    #[tokio::test]
    async fn split_without_radio() {
        let mut tracker = Tracker::new(None, Arc::new(FakeEphemeris::new(0.0)));
        let err = tracker.set_split(Vfo::B, 145_500_000).await.unwrap_err();
        assert!(matches!(err, TrackerError::NoRadio));
    }
}
