//! crates/engine/src/progress.rs
//!
//! Progress reporting and cancellation for the read pipelines.

/// Retired reads between consecutive progress callbacks.
pub const PROGRESS_READ_INTERVAL: u64 = 10;

/// Snapshot handed to progress callbacks.
///
/// `bytes_hashed` counts the bytes dispatched to the digests before the
/// read being reported, so a callback that cancels knows exactly how much
/// of the stream was consumed.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Caller tag echoed from the request.
    pub tag: u64,
    /// Bytes hashed so far.
    pub bytes_hashed: u64,
    /// Declared total stream length.
    pub total_bytes: u64,
}

impl ProgressUpdate {
    /// Returns the progress as a percentage (0.0 to 100.0).
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            100.0
        } else {
            (self.bytes_hashed as f64 / self.total_bytes as f64) * 100.0
        }
    }
}

/// Verdict returned by progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressAction {
    /// Keep hashing.
    Continue,
    /// Abandon the operation; the engine reports `Cancelled`.
    Cancel,
}

/// Applies the retired-read cadence shared by both pipelines.
///
/// The callback fires on the first retired read and every `interval`
/// retirements after that, plus one final call after the stream drains
/// whose verdict is ignored.
pub(crate) struct ProgressGate<F> {
    callback: F,
    interval: u64,
    retired: u64,
}

impl<F> ProgressGate<F>
where
    F: FnMut(&ProgressUpdate) -> ProgressAction,
{
    pub(crate) fn new(callback: F, interval: u64) -> Self {
        Self {
            callback,
            interval: interval.max(1),
            retired: 0,
        }
    }

    pub(crate) fn on_read_retired(&mut self, update: &ProgressUpdate) -> ProgressAction {
        let fire = self.retired % self.interval == 0;
        self.retired += 1;
        if fire {
            (self.callback)(update)
        } else {
            ProgressAction::Continue
        }
    }

    pub(crate) fn on_complete(&mut self, update: &ProgressUpdate) {
        let _ = (self.callback)(update);
    }
}
