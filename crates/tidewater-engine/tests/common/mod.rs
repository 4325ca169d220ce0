//! Software GPU timeline for driving a `SceneRenderer` without a device.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tidewater_engine::device::DeviceError;
use tidewater_engine::logging::{init_logging, LoggingConfig};
use tidewater_engine::render::FrameBackend;
use tidewater_engine::scene::DrawList;
use tidewater_engine::sync::{FenceSignal, FrameResourceSlot};

pub fn init_test_logging() {
    init_logging(LoggingConfig {
        is_test: true,
        ..LoggingConfig::default()
    });
}

enum Job {
    Frame { signal: FenceSignal, value: u64 },
    Lose { signal: FenceSignal },
}

/// Observations shared between the test and the GPU thread.
#[derive(Debug, Default)]
pub struct GpuLog {
    /// Highest fence value the GPU thread has finished.
    pub retired: AtomicU64,
    /// Submissions that reused a slot the GPU had not retired yet.
    pub reuse_violations: AtomicUsize,
    pub submitted: AtomicUsize,
}

/// Executes each submission on a worker thread after `latency`, in order.
pub struct SoftwareGpu {
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    log: Arc<GpuLog>,
    lose_after: Option<u64>,
}

impl SoftwareGpu {
    pub fn new(latency: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let log = Arc::new(GpuLog::default());

        let worker = {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for job in rx {
                    thread::sleep(latency);
                    match job {
                        Job::Frame { signal, value } => {
                            log.retired.store(value, Ordering::SeqCst);
                            signal.signal(value);
                        }
                        Job::Lose { signal } => signal.device_lost("software gpu hung"),
                    }
                }
            })
        };

        Self {
            tx: Some(tx),
            worker: Some(worker),
            log,
            lose_after: None,
        }
    }

    /// Loses the device instead of completing submissions past `value`.
    pub fn losing_after(mut self, value: u64) -> Self {
        self.lose_after = Some(value);
        self
    }

    pub fn log(&self) -> Arc<GpuLog> {
        Arc::clone(&self.log)
    }
}

impl FrameBackend for SoftwareGpu {
    fn submit_frame(
        &mut self,
        slot: &mut FrameResourceSlot,
        _draws: &DrawList,
        signal: &FenceSignal,
        fence_value: u64,
    ) -> Result<(), DeviceError> {
        if let Some(reason) = signal.lost() {
            return Err(DeviceError::Lost(reason));
        }
        if slot.pending_fence() > self.log.retired.load(Ordering::SeqCst) {
            self.log.reuse_violations.fetch_add(1, Ordering::SeqCst);
        }

        // What a real queue would copy out of the slot.
        slot.objects.take_dirty();
        slot.materials.take_dirty();
        slot.pass.take_dirty();
        slot.vertices.take_dirty();

        let job = match self.lose_after {
            Some(limit) if fence_value > limit => Job::Lose { signal: signal.clone() },
            _ => Job::Frame { signal: signal.clone(), value: fence_value },
        };
        let Some(tx) = self.tx.as_ref() else {
            return Err(DeviceError::SubmissionRejected("software gpu stopped".into()));
        };
        tx.send(job)
            .map_err(|_| DeviceError::SubmissionRejected("software gpu stopped".into()))?;

        self.log.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for SoftwareGpu {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
