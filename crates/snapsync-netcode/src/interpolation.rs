//! Position interpolation for smooth rendering
//!
//! Server updates arrive at irregular intervals. Each entity's interpolator
//! moves its displayed position a fixed fraction of the remaining distance
//! per tick (exponential smoothing) and snaps once both axes are within
//! epsilon of the target. No velocity is stored; the server is the only
//! source of targets.

use crate::config::InterpolationConfig;
use crate::error::{Error, Result};
use crate::scheduler::{TickHandle, TickScheduler};
use snapsync_core::{ObjectId, Position};

/// Interpolator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationState {
    /// Resting at the target, no tick pending
    Idle,
    /// Moving toward the target, waiting for the given tick
    Converging(TickHandle),
}

/// Result of running one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Still converging; another tick was requested
    Moved(Position),
    /// Reached the target and went idle
    Settled(Position),
}

impl TickOutcome {
    /// The displayed position after the tick
    pub fn position(&self) -> Position {
        match self {
            TickOutcome::Moved(p) | TickOutcome::Settled(p) => *p,
        }
    }

    /// Check if the interpolator went idle
    pub fn is_settled(&self) -> bool {
        matches!(self, TickOutcome::Settled(_))
    }
}

/// Per-entity position interpolator
///
/// `Converging` holds exactly one pending tick handle. Ticks with any other
/// handle are rejected as stale.
#[derive(Debug, Clone)]
pub struct Interpolator {
    id: ObjectId,
    current: Position,
    target: Position,
    state: InterpolationState,
    config: InterpolationConfig,
}

impl Interpolator {
    /// Create an idle interpolator resting at `position`
    pub fn new(id: ObjectId, position: Position, config: InterpolationConfig) -> Self {
        Self {
            id,
            current: position,
            target: position,
            state: InterpolationState::Idle,
            config,
        }
    }

    /// Push a new target
    ///
    /// An idle interpolator starts converging and requests a tick. A
    /// converging one only updates its target; its pending tick stays.
    pub fn set_target<S: TickScheduler>(&mut self, target: Position, scheduler: &mut S) {
        self.target = target;
        if self.state == InterpolationState::Idle {
            let handle = scheduler.schedule_next_tick(self.id);
            self.state = InterpolationState::Converging(handle);
        }
    }

    /// Place the interpolator at `position` with no transition
    pub fn snap<S: TickScheduler>(&mut self, position: Position, scheduler: &mut S) {
        self.cancel(scheduler);
        self.current = position;
        self.target = position;
    }

    /// Cancel the pending tick, if any, and go idle where it stands
    ///
    /// Returns the cancelled handle.
    pub fn cancel<S: TickScheduler>(&mut self, scheduler: &mut S) -> Option<TickHandle> {
        match std::mem::replace(&mut self.state, InterpolationState::Idle) {
            InterpolationState::Converging(handle) => {
                scheduler.cancel(handle);
                Some(handle)
            }
            InterpolationState::Idle => None,
        }
    }

    /// Run the tick identified by `handle`
    ///
    /// Fails with `Error::StaleTick` unless `handle` is the pending tick.
    pub fn tick<S: TickScheduler>(
        &mut self,
        handle: TickHandle,
        scheduler: &mut S,
    ) -> Result<TickOutcome> {
        if self.state != InterpolationState::Converging(handle) {
            return Err(Error::StaleTick {
                id: self.id,
                handle,
            });
        }

        if self.step() {
            self.state = InterpolationState::Idle;
            Ok(TickOutcome::Settled(self.current))
        } else {
            let next = scheduler.schedule_next_tick(self.id);
            self.state = InterpolationState::Converging(next);
            Ok(TickOutcome::Moved(self.current))
        }
    }

    /// Advance one smoothing step, snapping when both axes are close
    ///
    /// Also snaps when the step moves neither axis: at large magnitudes the
    /// step can fall below f32 precision while the gap is still over epsilon.
    ///
    /// Returns true once `current == target`.
    fn step(&mut self) -> bool {
        let before = self.current;
        let alpha = self.config.alpha;
        self.current.x += (self.target.x - self.current.x) * alpha;
        self.current.y += (self.target.y - self.current.y) * alpha;

        let epsilon = self.config.epsilon;
        let close = (self.target.x - self.current.x).abs() < epsilon
            && (self.target.y - self.current.y).abs() < epsilon;
        let settled = close || self.current == before;
        if settled {
            self.current = self.target;
        }
        settled
    }

    /// The object this interpolator belongs to
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The displayed position
    pub fn current(&self) -> Position {
        self.current
    }

    /// The position being converged on
    pub fn target(&self) -> Position {
        self.target
    }

    /// Current state
    pub fn state(&self) -> InterpolationState {
        self.state
    }

    /// Check if a tick is pending
    pub fn is_active(&self) -> bool {
        matches!(self.state, InterpolationState::Converging(_))
    }

    /// The pending tick, if converging
    pub fn pending_tick(&self) -> Option<TickHandle> {
        match self.state {
            InterpolationState::Converging(handle) => Some(handle),
            InterpolationState::Idle => None,
        }
    }

    /// The smoothing parameters
    pub fn config(&self) -> InterpolationConfig {
        self.config
    }
}
