//! Presentation seam
//!
//! The reconciler never draws anything. It tells a `Presentation` when a
//! visual must be created, moved, or destroyed, and keeps whatever handle
//! the presentation hands back inside the owning entity.

use snapsync_core::{ObjectId, ObjectKind, Position};

/// Host-side visual layer
pub trait Presentation {
    /// Opaque handle to one visual
    type Handle;

    /// Create the visual for a new entity
    fn create_visual(&mut self, id: ObjectId, kind: ObjectKind) -> Self::Handle;

    /// Destroy a visual; the handle is consumed
    fn destroy_visual(&mut self, handle: Self::Handle);

    /// Move a visual to its new displayed position
    fn set_visual_position(&mut self, handle: &Self::Handle, position: Position);
}

/// A call made against a `RecordingPresentation`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresentationEvent {
    Created { id: ObjectId, kind: ObjectKind },
    Moved { id: ObjectId, position: Position },
    Destroyed { id: ObjectId },
}

/// Presentation that records every call instead of drawing
///
/// Used by headless hosts and tests. Handles are the object ids.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    events: Vec<PresentationEvent>,
}

impl RecordingPresentation {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, oldest first
    pub fn events(&self) -> &[PresentationEvent] {
        &self.events
    }

    /// Take the recorded calls, leaving the recorder empty
    pub fn drain(&mut self) -> Vec<PresentationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of visuals created for `id`
    pub fn created_count(&self, id: ObjectId) -> usize {
        self.count(|e| matches!(e, PresentationEvent::Created { id: i, .. } if *i == id))
    }

    /// Number of visuals destroyed for `id`
    pub fn destroyed_count(&self, id: ObjectId) -> usize {
        self.count(|e| matches!(e, PresentationEvent::Destroyed { id: i } if *i == id))
    }

    /// Last position shown for `id`
    pub fn last_position(&self, id: ObjectId) -> Option<Position> {
        self.events.iter().rev().find_map(|e| match e {
            PresentationEvent::Moved { id: i, position } if *i == id => Some(*position),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&PresentationEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Presentation for RecordingPresentation {
    type Handle = ObjectId;

    fn create_visual(&mut self, id: ObjectId, kind: ObjectKind) -> ObjectId {
        self.events.push(PresentationEvent::Created { id, kind });
        id
    }

    fn destroy_visual(&mut self, handle: ObjectId) {
        self.events.push(PresentationEvent::Destroyed { id: handle });
    }

    fn set_visual_position(&mut self, handle: &ObjectId, position: Position) {
        self.events.push(PresentationEvent::Moved {
            id: *handle,
            position,
        });
    }
}
