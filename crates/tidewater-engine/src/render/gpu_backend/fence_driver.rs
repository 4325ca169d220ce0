use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::device::DeviceError;
use crate::sync::FenceDriver;

/// Fence values paired with the queue submission that signals them, oldest first.
#[derive(Debug)]
pub(super) struct SubmissionLog<I> {
    entries: VecDeque<(u64, I)>,
}

impl<I: Clone> SubmissionLog<I> {
    pub(super) fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    pub(super) fn record(&mut self, value: u64, index: I) {
        self.entries.push_back((value, index));
    }

    /// Drops submissions the fence has already seen complete.
    pub(super) fn retire(&mut self, completed: u64) {
        while self.entries.front().is_some_and(|(v, _)| *v <= completed) {
            self.entries.pop_front();
        }
    }

    /// Submission whose completion implies `value` is reached.
    ///
    /// Entries older than that submission are dropped; the queue completes in
    /// order, so they are implied as well.
    pub(super) fn covering(&mut self, value: u64) -> Option<I> {
        while self.entries.front().is_some_and(|(v, _)| *v < value) {
            self.entries.pop_front();
        }
        self.entries.front().map(|(_, i)| i.clone())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Makes device progress on behalf of a blocked fence wait.
///
/// wgpu only runs `on_submitted_work_done` callbacks while the device is
/// polled, so a waiter polls until the submission carrying its value retires.
pub struct WgpuFenceDriver {
    device: wgpu::Device,
    log: Mutex<SubmissionLog<wgpu::SubmissionIndex>>,
}

impl WgpuFenceDriver {
    pub fn new(device: wgpu::Device) -> Arc<Self> {
        Arc::new(Self {
            device,
            log: Mutex::new(SubmissionLog::new()),
        })
    }

    /// Logs a submission, forgetting those at or below `completed`.
    pub fn record(&self, value: u64, index: wgpu::SubmissionIndex, completed: u64) {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.retire(completed);
        log.record(value, index);
    }
}

impl FenceDriver for WgpuFenceDriver {
    fn drive_until(&self, value: u64) -> Result<(), DeviceError> {
        let submission_index = self
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .covering(value);

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index,
                timeout: None,
            })
            .map(|_| ())
            .map_err(|e| DeviceError::Lost(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covering_picks_first_submission_at_or_after_value() {
        let mut log = SubmissionLog::new();
        log.record(1, 'a');
        log.record(2, 'b');
        log.record(4, 'c');

        assert_eq!(log.covering(2), Some('b'));
        assert_eq!(log.len(), 2);
        assert_eq!(log.covering(3), Some('c'));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn retired_submissions_do_not_accumulate() {
        let mut log = SubmissionLog::new();
        let mut completed = 0;
        for v in 1..=10_000u64 {
            log.retire(completed);
            log.record(v, v);
            // GPU trails the CPU by two frames.
            completed = v.saturating_sub(2);
        }
        assert!(log.len() <= 3, "log holds {} entries", log.len());
        assert_eq!(log.covering(10_000), Some(10_000));
    }

    #[test]
    fn retire_keeps_submissions_still_in_flight() {
        let mut log = SubmissionLog::new();
        log.record(1, 'a');
        log.record(2, 'b');
        log.record(3, 'c');
        log.retire(2);
        assert_eq!(log.len(), 1);
        assert_eq!(log.covering(3), Some('c'));
    }

    #[test]
    fn covering_past_the_newest_submission_is_none() {
        let mut log = SubmissionLog::new();
        log.record(1, 'a');
        assert_eq!(log.covering(5), None);
        assert_eq!(log.len(), 0);
    }
}
