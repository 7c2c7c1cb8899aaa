//! Decoded server messages

use crate::{ObjectId, ObjectKind, ObjectRecord, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type of a server message
///
/// Independent of `ObjectKind`. Tags outside the supported set are kept in
/// `Unrecognized` so they can be reported and dropped downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Batch of new target positions ("position_update")
    PositionUpdate,
    /// A participant appeared ("player_joined")
    PlayerJoined,
    /// A participant left ("player_left")
    PlayerLeft,
    /// Any other tag
    Unrecognized(String),
}

impl MessageKind {
    pub const POSITION_UPDATE: &'static str = "position_update";
    pub const PLAYER_JOINED: &'static str = "player_joined";
    pub const PLAYER_LEFT: &'static str = "player_left";

    /// Parse a wire tag
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            Self::POSITION_UPDATE => MessageKind::PositionUpdate,
            Self::PLAYER_JOINED => MessageKind::PlayerJoined,
            Self::PLAYER_LEFT => MessageKind::PlayerLeft,
            other => MessageKind::Unrecognized(other.to_string()),
        }
    }

    /// Get the wire tag
    pub fn as_tag(&self) -> &str {
        match self {
            MessageKind::PositionUpdate => Self::POSITION_UPDATE,
            MessageKind::PlayerJoined => Self::PLAYER_JOINED,
            MessageKind::PlayerLeft => Self::PLAYER_LEFT,
            MessageKind::Unrecognized(tag) => tag.as_str(),
        }
    }

    /// Check if this tag is outside the supported set
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, MessageKind::Unrecognized(_))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A decoded server message
///
/// Records keep wire order so that application is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The kind of message
    pub kind: MessageKind,
    /// Object records in wire order
    pub records: Vec<ObjectRecord>,
}

impl Message {
    /// Create an empty message of the given kind
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    /// Create a position update carrying the given records
    pub fn position_update(records: impl IntoIterator<Item = ObjectRecord>) -> Self {
        Self {
            kind: MessageKind::PositionUpdate,
            records: records.into_iter().collect(),
        }
    }

    /// Create a join announcement for one object
    pub fn player_joined(id: impl Into<ObjectId>, kind: ObjectKind, position: Position) -> Self {
        Self::new(MessageKind::PlayerJoined).with_record(ObjectRecord::new(id, kind, position))
    }

    /// Create a departure announcement for one object
    ///
    /// The binary layout always carries a full record, so the kind and
    /// position are filled with defaults.
    pub fn player_left(id: impl Into<ObjectId>) -> Self {
        Self::new(MessageKind::PlayerLeft).with_record(ObjectRecord::new(
            id,
            ObjectKind::default(),
            Position::ORIGIN,
        ))
    }

    /// Add a record
    pub fn with_record(mut self, record: ObjectRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the message carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the ids named by this message
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.records.iter().map(|r| r.id)
    }
}
