//! Sync client
//!
//! Ties decoding, reconciliation and frame-stepped ticking together on one
//! execution timeline. Messages are applied between frames, never during
//! one, so the entity table needs no locking.

use crate::config::SyncConfig;
use crate::entity::EntityTable;
use crate::envelope::Inbound;
use crate::error::Result;
use crate::presentation::Presentation;
use crate::reconciliation::{ApplySummary, Reconciler};
use crate::scheduler::ManualScheduler;
use crate::transport::Connection;
use serde::{Deserialize, Serialize};
use snapsync_core::{Message, ObjectId, Position};
use tracing::{debug, warn};

/// Running counters for a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStats {
    /// Messages decoded and applied
    pub messages_applied: u64,
    /// Messages that failed to decode
    pub messages_rejected: u64,
    /// Messages dropped for an unrecognized kind
    pub messages_dropped: u64,
    /// Interpolator ticks run
    pub ticks_run: u64,
    /// Ticks rejected as stale
    pub stale_ticks: u64,
}

/// A client-side state synchronizer
///
/// # Example
///
/// ```
/// use snapsync_core::{Message, ObjectId, ObjectKind, ObjectRecord, Position};
/// use snapsync_netcode::{wire, Inbound, RecordingPresentation, SyncClient, SyncConfig};
///
/// let config = SyncConfig::default();
/// let mut client = SyncClient::new(RecordingPresentation::new(), &config).unwrap();
///
/// let update = Message::position_update([ObjectRecord::new(1, ObjectKind::Enemy, (4.0, 0.0))]);
/// client.on_inbound(&Inbound::Binary(wire::encode(&update)));
/// assert_eq!(client.table().len(), 1);
///
/// let update = Message::position_update([ObjectRecord::new(1, ObjectKind::Enemy, (9.0, 0.0))]);
/// client.on_inbound(&Inbound::Binary(wire::encode(&update)));
/// while client.run_frame() > 0 {}
///
/// let entity = client.table().get(ObjectId::new(1)).unwrap();
/// assert_eq!(entity.position(), Position::new(9.0, 0.0));
/// ```
pub struct SyncClient<P: Presentation> {
    reconciler: Reconciler<P>,
    scheduler: ManualScheduler,
    stats: ClientStats,
}

impl<P: Presentation> SyncClient<P> {
    /// Create a client drawing through `presentation`
    ///
    /// Fails with `Error::InvalidConfig` if `config` does not validate.
    pub fn new(presentation: P, config: &SyncConfig) -> Result<Self> {
        Ok(Self {
            reconciler: Reconciler::with_config(presentation, config.interpolation)?,
            scheduler: ManualScheduler::new(),
            stats: ClientStats::default(),
        })
    }

    /// Decode and apply one inbound message
    ///
    /// A message that fails to decode leaves the entity table untouched.
    pub fn handle_inbound(&mut self, inbound: &Inbound) -> Result<ApplySummary> {
        let message = match inbound.decode() {
            Ok(message) => message,
            Err(e) => {
                self.stats.messages_rejected += 1;
                return Err(e);
            }
        };
        Ok(self.apply(&message))
    }

    /// Decode and apply one inbound message, logging any failure
    ///
    /// Failures are contained to the message that caused them.
    pub fn on_inbound(&mut self, inbound: &Inbound) {
        if let Err(e) = self.handle_inbound(inbound) {
            warn!(error = %e, bytes = inbound.len(), "discarding inbound message");
        }
    }

    /// Apply an already-decoded message
    pub fn apply(&mut self, message: &Message) -> ApplySummary {
        let summary = self.reconciler.apply(message, &mut self.scheduler);
        if summary.dropped {
            self.stats.messages_dropped += 1;
        } else {
            self.stats.messages_applied += 1;
        }
        debug!(kind = %message.kind, ?summary, "applied message");
        summary
    }

    /// Drain every ready message from `conn`, in arrival order
    ///
    /// Returns the number of messages received.
    pub fn pump<C: Connection>(&mut self, conn: &C) -> std::result::Result<usize, C::Error> {
        let mut received = 0;
        while let Some(inbound) = conn.recv()? {
            self.on_inbound(&inbound);
            received += 1;
        }
        Ok(received)
    }

    /// Run one render frame: every tick requested before this call
    ///
    /// Returns the number of ticks run. Stale ticks are logged and skipped.
    pub fn run_frame(&mut self) -> usize {
        let mut ran = 0;
        for tick in self.scheduler.take_due() {
            match self.reconciler.tick(tick, &mut self.scheduler) {
                Ok(_) => {
                    self.stats.ticks_run += 1;
                    ran += 1;
                }
                Err(e) => {
                    warn!(error = %e, "skipping tick");
                    self.stats.stale_ticks += 1;
                }
            }
        }
        ran
    }

    /// Create or claim the local player's own entity
    pub fn attach_local_player(&mut self, id: ObjectId, position: Position) -> bool {
        self.reconciler.insert_local(id, position)
    }

    /// Drop every entity so state can be rebuilt from scratch
    ///
    /// Returns the number of entities removed.
    pub fn reset(&mut self) -> usize {
        let removed = self.reconciler.clear(&mut self.scheduler);
        debug!(removed, "reset entity table");
        removed
    }

    /// Read access to the entity table
    pub fn table(&self) -> &EntityTable<P::Handle> {
        self.reconciler.table()
    }

    pub fn presentation(&self) -> &P {
        self.reconciler.presentation()
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        self.reconciler.presentation_mut()
    }

    pub fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> ClientStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpolationConfig;
    use crate::error::Error;
    use crate::presentation::RecordingPresentation;
    use crate::transport::QueuedConnection;
    use crate::wire;
    use snapsync_core::{ObjectKind, ObjectRecord};

    fn client() -> SyncClient<RecordingPresentation> {
        SyncClient::new(RecordingPresentation::new(), &SyncConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        for (alpha, epsilon) in [(0.2, 0.0), (1.0, 0.1), (0.0, 0.1), (f32::NAN, 0.1)] {
            let config = SyncConfig {
                interpolation: InterpolationConfig::new(alpha, epsilon),
            };
            let result = SyncClient::new(RecordingPresentation::new(), &config);
            assert!(
                matches!(result, Err(Error::InvalidConfig(_))),
                "accepted alpha={} epsilon={}",
                alpha,
                epsilon
            );
        }
    }

    #[test]
    fn test_malformed_message_is_contained() {
        let mut client = client();
        let seed = Message::player_joined(1, ObjectKind::Character, Position::new(1.0, 1.0));
        client.on_inbound(&Inbound::Binary(wire::encode(&seed)));
        let before = client.table().states();

        let mut bytes = wire::encode(&Message::position_update([ObjectRecord::new(
            1,
            ObjectKind::Character,
            (50.0, 50.0),
        )]));
        bytes.pop();
        assert!(client.handle_inbound(&Inbound::Binary(bytes.clone())).is_err());
        client.on_inbound(&Inbound::Binary(bytes));

        assert_eq!(client.table().states(), before);
        assert_eq!(client.stats().messages_rejected, 2);
        assert_eq!(client.stats().messages_applied, 1);
        assert!(client.scheduler().is_idle());
    }

    #[test]
    fn test_run_frame_counts_ticks() {
        let mut client = client();
        client.apply(&Message::position_update([
            ObjectRecord::new(1, ObjectKind::Character, (0.0, 0.0)),
            ObjectRecord::new(2, ObjectKind::Enemy, (0.0, 0.0)),
        ]));
        client.apply(&Message::position_update([
            ObjectRecord::new(1, ObjectKind::Character, (10.0, 0.0)),
            ObjectRecord::new(2, ObjectKind::Enemy, (0.0, 10.0)),
        ]));

        assert_eq!(client.run_frame(), 2);
        assert_eq!(client.table().active_count(), 2);

        let mut frames = 1;
        while client.run_frame() > 0 {
            frames += 1;
        }
        assert!(frames <= 40);
        assert_eq!(client.table().active_count(), 0);
        assert_eq!(client.stats().stale_ticks, 0);
    }

    #[test]
    fn test_pump_applies_in_order() {
        let mut client = client();
        let conn = QueuedConnection::new();
        conn.push(wire::encode(&Message::player_joined(
            3,
            ObjectKind::Item,
            Position::new(2.0, 2.0),
        )));
        conn.push(r#"{"type":"player_left","data":{"id":3}}"#);
        conn.push(r#"{"type":"emote","data":{}}"#);

        assert_eq!(client.pump(&conn).unwrap(), 3);
        assert!(client.table().is_empty());
        assert_eq!(client.presentation().created_count(ObjectId::new(3)), 1);
        assert_eq!(client.presentation().destroyed_count(ObjectId::new(3)), 1);
        assert_eq!(client.stats().messages_applied, 2);
        assert_eq!(client.stats().messages_dropped, 1);
    }

    #[test]
    fn test_reset() {
        let mut client = client();
        assert!(client.attach_local_player(ObjectId::new(1), Position::ORIGIN));
        client.apply(&Message::position_update([ObjectRecord::new(
            1,
            ObjectKind::Character,
            (5.0, 5.0),
        )]));

        assert_eq!(client.reset(), 1);
        assert!(client.table().is_empty());
        assert_eq!(client.run_frame(), 0);
    }
}
