//! Snapsync Core - World-object and message types
//!
//! This crate holds the plain data shared by the rest of snapsync:
//! - Object identifiers (`ObjectId`) stable across snapshots
//! - The closed object kind table (`ObjectKind`)
//! - Positions and per-object records (`Position`, `ObjectRecord`)
//! - Decoded server messages (`Message`, `MessageKind`)
//!
//! Nothing here performs I/O. Decoding bytes into these types lives in
//! `snapsync-netcode`.

mod identity;
mod kind;
mod msg;
mod position;
mod record;

pub use identity::ObjectId;
pub use kind::{ObjectKind, KIND_TABLE};
pub use msg::{Message, MessageKind};
pub use position::Position;
pub use record::ObjectRecord;
