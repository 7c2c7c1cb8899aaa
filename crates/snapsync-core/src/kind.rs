//! Object kind table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind names in wire-code order: code 0 is `character`, 1 `enemy`, 2 `item`.
pub const KIND_TABLE: [&str; 3] = ["character", "enemy", "item"];

/// The classification of a world object
///
/// Fixed at entity creation. Codes outside the kind table decode to
/// `Unknown` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A player-controlled character
    #[default]
    Character,
    /// A hostile non-player object
    Enemy,
    /// A pickup or static item
    Item,
    /// Any code or name outside the kind table
    Unknown,
}

impl ObjectKind {
    /// Wire code written for `Unknown`
    pub const UNKNOWN_CODE: u8 = 0xFF;

    /// Map a wire code to a kind, falling back to `Unknown`
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ObjectKind::Character,
            1 => ObjectKind::Enemy,
            2 => ObjectKind::Item,
            _ => ObjectKind::Unknown,
        }
    }

    /// Get the wire code for this kind
    pub fn code(&self) -> u8 {
        match self {
            ObjectKind::Character => 0,
            ObjectKind::Enemy => 1,
            ObjectKind::Item => 2,
            ObjectKind::Unknown => Self::UNKNOWN_CODE,
        }
    }

    /// Map a kind name (as used by the text protocol) to a kind
    pub fn from_name(name: &str) -> Self {
        match KIND_TABLE.iter().position(|k| *k == name) {
            Some(code) => Self::from_code(code as u8),
            None => ObjectKind::Unknown,
        }
    }

    /// Get the kind name
    pub fn name(&self) -> &'static str {
        KIND_TABLE
            .get(self.code() as usize)
            .copied()
            .unwrap_or("unknown")
    }

    /// Check if this kind is outside the kind table
    pub fn is_unknown(&self) -> bool {
        matches!(self, ObjectKind::Unknown)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
