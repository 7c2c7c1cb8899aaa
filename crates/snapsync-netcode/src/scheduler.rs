//! Tick scheduling
//!
//! Interpolators never drive themselves. Each converging interpolator asks a
//! `TickScheduler` for exactly one tick at a time and asks again after that
//! tick runs. The host decides when ticks actually fire, which keeps the
//! interpolation testable by single-stepping frames.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snapsync_core::ObjectId;
use std::fmt;

/// Handle for one requested tick
///
/// Handles are never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickHandle(pub u64);

impl fmt::Display for TickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick#{}", self.0)
    }
}

/// A tick that is due to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    pub handle: TickHandle,
    pub id: ObjectId,
}

/// Host-side scheduler interface
pub trait TickScheduler {
    /// Request one tick for `id` at the next refresh opportunity
    fn schedule_next_tick(&mut self, id: ObjectId) -> TickHandle;

    /// Cancel a pending tick
    ///
    /// Returns `false` if the handle was not pending.
    fn cancel(&mut self, handle: TickHandle) -> bool;
}

/// Scheduler stepped by hand, one frame at a time
///
/// `take_due` hands back every tick requested so far, in request order.
/// Ticks requested while those run land in the following frame.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: IndexMap<TickHandle, ObjectId>,
    next_handle: u64,
}

impl ManualScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every pending tick
    pub fn take_due(&mut self) -> Vec<ScheduledTick> {
        self.pending
            .drain(..)
            .map(|(handle, id)| ScheduledTick { handle, id })
            .collect()
    }

    /// Check if a handle is still pending
    pub fn is_pending(&self, handle: TickHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    /// Number of pending ticks
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Check if no ticks are pending
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_next_tick(&mut self, id: ObjectId) -> TickHandle {
        let handle = TickHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(handle, id);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) -> bool {
        self.pending.shift_remove(&handle).is_some()
    }
}
