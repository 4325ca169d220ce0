use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::device::DeviceError;

/// Makes progress on a device timeline on behalf of a blocked waiter.
///
/// Some backends (wgpu among them) only deliver completion callbacks while the
/// device is being polled. A driver is given the chance to block inside the
/// device before the fence falls back to its condition variable.
pub trait FenceDriver: Send + Sync {
    /// Blocks until the device has finished the work stamped with `value`,
    /// or until it reports that it never will.
    fn drive_until(&self, value: u64) -> Result<(), DeviceError>;
}

#[derive(Debug, Default)]
struct FenceState {
    completed: u64,
    lost: Option<String>,
}

#[derive(Debug, Default)]
struct FenceShared {
    state: Mutex<FenceState>,
    cond: Condvar,
}

impl FenceShared {
    // Fence state is two plain values; a panicking signaller cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, FenceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// GPU-side handle of a [`SyncFence`].
///
/// Handed to the backend so completion callbacks running on the device
/// timeline can advance the completed value.
#[derive(Debug, Clone)]
pub struct FenceSignal {
    shared: Arc<FenceShared>,
}

impl FenceSignal {
    /// Raises the completed value to at least `value` and wakes all waiters.
    ///
    /// Values at or below the current completed value are ignored, so the
    /// completed value never decreases.
    pub fn signal(&self, value: u64) {
        let mut state = self.shared.lock();
        if value > state.completed {
            state.completed = value;
            drop(state);
            self.shared.cond.notify_all();
        }
    }

    /// Marks the device as lost. Every pending and future wait fails.
    pub fn device_lost(&self, reason: impl Into<String>) {
        let reason = reason.into();
        log::error!("fence observed device loss: {reason}");
        let mut state = self.shared.lock();
        if state.lost.is_none() {
            state.lost = Some(reason);
        }
        drop(state);
        self.shared.cond.notify_all();
    }

    /// Completed value as seen from the GPU side. Never blocks.
    pub fn completed(&self) -> u64 {
        self.shared.lock().completed
    }

    /// Returns the loss reason if the device has been lost.
    pub fn lost(&self) -> Option<String> {
        self.shared.lock().lost.clone()
    }
}

/// Monotonic counter shared between the CPU submission timeline and the GPU.
///
/// The CPU stamps each submission with the next target value; the GPU raises
/// the completed value once it reaches that point in its command stream.
pub struct SyncFence {
    current_target: u64,
    shared: Arc<FenceShared>,
    driver: Option<Arc<dyn FenceDriver>>,
}

impl SyncFence {
    pub fn new() -> Self {
        Self {
            current_target: 0,
            shared: Arc::new(FenceShared::default()),
            driver: None,
        }
    }

    pub fn with_driver(driver: Arc<dyn FenceDriver>) -> Self {
        let mut fence = Self::new();
        fence.set_driver(driver);
        fence
    }

    /// Installs the driver used to make device progress while waiting.
    pub fn set_driver(&mut self, driver: Arc<dyn FenceDriver>) {
        self.driver = Some(driver);
    }

    /// Returns a handle the GPU timeline uses to signal this fence.
    pub fn signal_handle(&self) -> FenceSignal {
        FenceSignal {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Value of the most recent successful submission (0 before any).
    #[inline]
    pub fn current_target(&self) -> u64 {
        self.current_target
    }

    /// Value the next submission will be stamped with. Does not commit it.
    #[inline]
    pub fn next_target(&self) -> u64 {
        self.current_target + 1
    }

    /// Commits the next target value after a submission was accepted.
    pub fn advance_target(&mut self) -> u64 {
        self.current_target += 1;
        self.current_target
    }

    /// Current completed value. Never blocks.
    pub fn completed_value(&self) -> u64 {
        self.shared.lock().completed
    }

    /// Returns true once the GPU has passed `value`.
    #[inline]
    pub fn is_complete(&self, value: u64) -> bool {
        self.completed_value() >= value
    }

    /// Blocks the calling thread until the completed value reaches `value`.
    ///
    /// Waiting is done on a condition variable keyed to the fence state, so
    /// the thread wakes when the signal arrives rather than on a poll tick.
    pub fn wait_until(&self, value: u64) -> Result<(), DeviceError> {
        {
            let state = self.shared.lock();
            if let Some(reason) = &state.lost {
                return Err(DeviceError::Lost(reason.clone()));
            }
            if state.completed >= value {
                return Ok(());
            }
        }

        if let Some(driver) = &self.driver {
            if let Err(err) = driver.drive_until(value) {
                self.signal_handle().device_lost(err.to_string());
                return Err(err);
            }
        }

        let mut state = self.shared.lock();
        loop {
            if let Some(reason) = &state.lost {
                return Err(DeviceError::Lost(reason.clone()));
            }
            if state.completed >= value {
                return Ok(());
            }
            state = self
                .shared
                .cond
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Waits for every submission made so far.
    pub fn flush(&self) -> Result<(), DeviceError> {
        self.wait_until(self.current_target)
    }
}

impl Default for SyncFence {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyncFence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncFence")
            .field("current_target", &self.current_target)
            .field("completed", &self.completed_value())
            .field("driven", &self.driver.is_some())
            .finish()
    }
}
