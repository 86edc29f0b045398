// src/worker.rs
//! Single-threaded pipeline worker
//!
//! One dedicated thread owns the whole pipeline; the transport callback
//! and the UI reach it only through message passing. This keeps the
//! delivery callback non-blocking and makes every mutation single-owner,
//! with no shared mutable state to tear.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::processing::pipeline::{PipelineSnapshot, SignalPipeline};
use crate::utils::time::TimeProvider;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

// Commands accepted by the worker thread.
enum Command {
    Notification { payload: Vec<u8>, arrival_time: f64 },
    SampleBatch { values: Vec<f32>, arrival_time: f64 },
    Connected,
    Disconnected,
    StartRecording,
    StopRecording { reply: Sender<String> },
    StartCalibration,
    EndCalibration { reply: Sender<f32> },
    Snapshot { reply: Sender<PipelineSnapshot> },
    Reset,
    Shutdown,
}

// Mailbox depth; the delivery path drops rather than blocks when full.
const MAILBOX_CAPACITY: usize = 1024;

// Idle tick driving the calibration countdown and SAR cadence.
const IDLE_TICK: Duration = Duration::from_millis(100);

/// Cloneable handle feeding commands to the worker.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: Sender<Command>,
    published: Arc<RwLock<PipelineSnapshot>>,
}

impl PipelineHandle {
    /// Deliver a raw transport notification.
    ///
    /// Never blocks: when the mailbox is full the payload is dropped,
    /// which surfaces downstream as ordinary packet loss.
    pub fn on_notification(&self, payload: Vec<u8>, arrival_time: f64) {
        let cmd = Command::Notification {
            payload,
            arrival_time,
        };
        if self.tx.try_send(cmd).is_err() {
            debug!("mailbox full, notification dropped");
        }
    }

    /// Deliver a pre-decoded sample batch.
    pub fn on_sample_batch(&self, values: Vec<f32>, arrival_time: f64) {
        let cmd = Command::SampleBatch {
            values,
            arrival_time,
        };
        if self.tx.try_send(cmd).is_err() {
            debug!("mailbox full, sample batch dropped");
        }
    }

    /// Signal that the transport link came up.
    pub fn on_connected(&self) -> Result<()> {
        self.send(Command::Connected)
    }

    /// Signal that the transport link went down.
    pub fn on_disconnected(&self) -> Result<()> {
        self.send(Command::Disconnected)
    }

    /// Start (or resume) recording.
    pub fn start_recording(&self) -> Result<()> {
        self.send(Command::StartRecording)
    }

    /// Stop recording and fetch the export text.
    pub fn stop_recording(&self) -> Result<String> {
        let (reply, rx) = bounded(1);
        self.send(Command::StopRecording { reply })?;
        rx.recv().map_err(|_| PipelineError::WorkerUnavailable)
    }

    /// Begin a timed calibration capture.
    pub fn start_calibration(&self) -> Result<()> {
        self.send(Command::StartCalibration)
    }

    /// Finish calibration early, returning the MVE reference.
    pub fn end_calibration(&self) -> Result<f32> {
        let (reply, rx) = bounded(1);
        self.send(Command::EndCalibration { reply })?;
        rx.recv().map_err(|_| PipelineError::WorkerUnavailable)
    }

    /// Fetch a fresh snapshot of the observable state.
    pub fn snapshot(&self) -> Result<PipelineSnapshot> {
        let (reply, rx) = bounded(1);
        self.send(Command::Snapshot { reply })?;
        rx.recv().map_err(|_| PipelineError::WorkerUnavailable)
    }

    /// Most recently published snapshot, without a worker round trip.
    ///
    /// Suited to display refresh: always available, at most one worker
    /// loop iteration stale.
    pub fn latest_snapshot(&self) -> PipelineSnapshot {
        self.published.read().clone()
    }

    /// Clear all pipeline state.
    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(cmd)
            .map_err(|_| PipelineError::WorkerUnavailable)
    }
}

/// Owns the worker thread for the lifetime of the acquisition session.
pub struct PipelineWorker {
    handle: PipelineHandle,
    thread: Option<JoinHandle<()>>,
}

impl PipelineWorker {
    /// Spawn the worker thread with the given configuration and clock.
    pub fn spawn(config: PipelineConfig, time: Arc<dyn TimeProvider>) -> Result<Self> {
        let mut pipeline = SignalPipeline::new(config, time)?;
        let published = Arc::new(RwLock::new(pipeline.snapshot()));
        let (tx, rx) = bounded(MAILBOX_CAPACITY);

        let worker_published = published.clone();
        let thread = std::thread::Builder::new()
            .name("emg-stream-worker".to_string())
            .spawn(move || run_loop(&mut pipeline, rx, worker_published))
            .map_err(|e| {
                error!(error = %e, "failed to spawn worker thread");
                PipelineError::WorkerUnavailable
            })?;

        Ok(Self {
            handle: PipelineHandle { tx, published },
            thread: Some(thread),
        })
    }

    /// Handle for submitting commands.
    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        let _ = self.handle.tx.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_loop(
    pipeline: &mut SignalPipeline,
    rx: Receiver<Command>,
    published: Arc<RwLock<PipelineSnapshot>>,
) {
    info!("pipeline worker started");
    loop {
        match rx.recv_timeout(IDLE_TICK) {
            Ok(Command::Notification {
                payload,
                arrival_time,
            }) => {
                if let Err(e) = pipeline.on_notification(&payload, arrival_time) {
                    // degraded input is not fatal; drop and continue
                    debug!(error = %e, "notification dropped");
                }
            }
            Ok(Command::SampleBatch {
                values,
                arrival_time,
            }) => {
                if let Err(e) = pipeline.ingest(values, arrival_time) {
                    debug!(error = %e, "sample batch dropped");
                }
            }
            Ok(Command::Connected) => pipeline.on_connected(),
            Ok(Command::Disconnected) => pipeline.on_disconnected(),
            Ok(Command::StartRecording) => pipeline.start_recording(),
            Ok(Command::StopRecording { reply }) => {
                let _ = reply.send(pipeline.stop_recording());
            }
            Ok(Command::StartCalibration) => pipeline.start_calibration(),
            Ok(Command::EndCalibration { reply }) => {
                let _ = reply.send(pipeline.end_calibration());
            }
            Ok(Command::Snapshot { reply }) => {
                let _ = reply.send(pipeline.snapshot());
            }
            Ok(Command::Reset) => pipeline.reset(),
            Ok(Command::Shutdown) => break,
            Err(RecvTimeoutError::Timeout) => pipeline.tick(),
            Err(RecvTimeoutError::Disconnected) => break,
        }
        *published.write() = pipeline.snapshot();
    }
    info!("pipeline worker stopped");
}
