//! Snapsync Netcode - Client-side snapshot synchronization
//!
//! This crate turns server snapshots into smoothly moving local entities:
//!
//! - **Wire**: Decode binary snapshots (and encode them for tooling)
//! - **Envelope**: Accept binary or JSON text frames as one `Message` shape
//! - **Reconciliation**: Map each message onto create/update/remove
//! - **Interpolation**: Ease displayed positions toward server targets
//! - **Scheduling**: Step interpolation ticks one render frame at a time
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Connection │──▶│ Envelope │──▶│  Reconciler  │──▶│ Presentation │
//! └────────────┘   │  / Wire  │   │ (EntityTable)│   └──────────────┘
//!                  └──────────┘   └──────────────┘          ▲
//!                                        │                  │
//!                                        ▼                  │
//!                                 ┌──────────────┐   ┌──────────────┐
//!                                 │ Interpolator │◀──│  Scheduler   │
//!                                 └──────────────┘   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use snapsync_netcode::{SyncClient, SyncConfig};
//!
//! let config = SyncConfig::load("snapsync.ron")?;
//! let mut client = SyncClient::new(my_presentation, &config)?;
//!
//! // Host render loop
//! loop {
//!     // Apply whatever the server sent since the last frame
//!     client.pump(&connection)?;
//!
//!     // Advance every converging entity by one tick
//!     client.run_frame();
//! }
//! ```

mod client;
mod config;
mod entity;
pub mod envelope;
mod error;
mod interpolation;
mod presentation;
mod reconciliation;
mod scheduler;
mod transport;
pub mod wire;

pub use client::{ClientStats, SyncClient};
pub use config::{InterpolationConfig, SyncConfig};
pub use entity::{Entity, EntityState, EntityTable};
pub use envelope::Inbound;
pub use error::{Error, MalformedMessage, Result};
pub use interpolation::{InterpolationState, Interpolator, TickOutcome};
pub use presentation::{Presentation, PresentationEvent, RecordingPresentation};
pub use reconciliation::{ApplySummary, Reconciler};
pub use scheduler::{ManualScheduler, ScheduledTick, TickHandle, TickScheduler};
pub use transport::{Connection, QueuedConnection};
