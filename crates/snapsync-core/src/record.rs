//! Per-object snapshot records

use crate::{ObjectId, ObjectKind, Position};
use serde::{Deserialize, Serialize};

/// One world object as reported by a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Which object this record describes
    pub id: ObjectId,
    /// The object's kind
    pub kind: ObjectKind,
    /// The reported position
    pub position: Position,
}

impl ObjectRecord {
    /// Create a new record
    pub fn new(id: impl Into<ObjectId>, kind: ObjectKind, position: impl Into<Position>) -> Self {
        Self {
            id: id.into(),
            kind,
            position: position.into(),
        }
    }
}
