//! Snapshot reconciliation
//!
//! Maps each decoded message onto create, update, and remove operations on
//! the entity table. The reconciler is the table's only writer.

use crate::config::InterpolationConfig;
use crate::entity::{Entity, EntityTable};
use crate::error::{Error, Result};
use crate::interpolation::{Interpolator, TickOutcome};
use crate::presentation::Presentation;
use crate::scheduler::{ScheduledTick, TickScheduler};
use snapsync_core::{Message, MessageKind, ObjectId, ObjectKind, ObjectRecord, Position};
use tracing::{debug, trace, warn};

/// What one `apply` call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Entities created, implicit creates included
    pub created: usize,
    /// Entities created by a position update for an unknown id
    pub implicit_creates: usize,
    /// Existing entities given a new target
    pub updated: usize,
    /// Entities removed
    pub removed: usize,
    /// Joins for ids already present
    pub duplicate_joins: usize,
    /// Removals for ids not present
    pub dangling_removals: usize,
    /// Records skipped for non-finite coordinates
    pub rejected_records: usize,
    /// Whole message dropped for an unrecognized kind
    pub dropped: bool,
}

/// Applies server messages to the entity table
///
/// Owns the table and the presentation so that every visual is created and
/// destroyed exactly once per entity lifetime.
pub struct Reconciler<P: Presentation> {
    table: EntityTable<P::Handle>,
    presentation: P,
    config: InterpolationConfig,
}

impl<P: Presentation> Reconciler<P> {
    /// Create a reconciler with default interpolation parameters
    pub fn new(presentation: P) -> Self {
        Self {
            table: EntityTable::new(),
            presentation,
            config: InterpolationConfig::default(),
        }
    }

    /// Create a reconciler with explicit interpolation parameters
    ///
    /// Fails with `Error::InvalidConfig` if `config` does not validate.
    pub fn with_config(presentation: P, config: InterpolationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table: EntityTable::new(),
            presentation,
            config,
        })
    }

    /// Apply one message
    ///
    /// - `PlayerJoined`: create each unknown id, snapped to its position.
    ///   Known ids are left alone.
    /// - `PlayerLeft`: remove each known id, cancelling its pending tick.
    /// - `PositionUpdate`: retarget known ids; create unknown ones as if
    ///   they had joined, since updates can outrun the join announcement.
    /// - `Unrecognized`: dropped with a warning.
    pub fn apply<S: TickScheduler>(
        &mut self,
        message: &Message,
        scheduler: &mut S,
    ) -> ApplySummary {
        let mut summary = ApplySummary::default();
        match &message.kind {
            MessageKind::PlayerJoined => {
                for record in &message.records {
                    self.join(record, &mut summary);
                }
            }
            MessageKind::PlayerLeft => {
                for id in message.ids() {
                    self.leave(id, scheduler, &mut summary);
                }
            }
            MessageKind::PositionUpdate => {
                for record in &message.records {
                    self.upsert(record, scheduler, &mut summary);
                }
            }
            MessageKind::Unrecognized(tag) => {
                warn!(
                    kind = %tag,
                    records = message.len(),
                    "dropping message of unrecognized kind"
                );
                summary.dropped = true;
            }
        }
        summary
    }

    fn join(&mut self, record: &ObjectRecord, summary: &mut ApplySummary) {
        if !Self::accept(record, summary) {
            return;
        }
        if self.table.contains(record.id) {
            debug!(id = %record.id, "join for known object ignored");
            summary.duplicate_joins += 1;
            return;
        }
        self.create(record.id, record.kind, record.position);
        summary.created += 1;
    }

    fn leave<S: TickScheduler>(
        &mut self,
        id: ObjectId,
        scheduler: &mut S,
        summary: &mut ApplySummary,
    ) {
        if self.remove(id, scheduler) {
            summary.removed += 1;
        } else {
            debug!(%id, "removal for unknown object ignored");
            summary.dangling_removals += 1;
        }
    }

    fn upsert<S: TickScheduler>(
        &mut self,
        record: &ObjectRecord,
        scheduler: &mut S,
        summary: &mut ApplySummary,
    ) {
        if !Self::accept(record, summary) {
            return;
        }
        match self.table.get_mut(record.id) {
            Some(entity) => {
                if entity.kind() != record.kind {
                    trace!(
                        id = %record.id,
                        kept = %entity.kind(),
                        reported = %record.kind,
                        "kind change ignored"
                    );
                }
                entity.interpolator.set_target(record.position, scheduler);
                summary.updated += 1;
            }
            None => {
                debug!(
                    id = %record.id,
                    kind = %record.kind,
                    "implicit create from position update"
                );
                self.create(record.id, record.kind, record.position);
                summary.created += 1;
                summary.implicit_creates += 1;
            }
        }
    }

    fn accept(record: &ObjectRecord, summary: &mut ApplySummary) -> bool {
        if record.position.is_finite() {
            return true;
        }
        warn!(
            id = %record.id,
            position = %record.position,
            "skipping record with non-finite position"
        );
        summary.rejected_records += 1;
        false
    }

    fn create(
        &mut self,
        id: ObjectId,
        kind: ObjectKind,
        position: Position,
    ) -> &mut Entity<P::Handle> {
        let visual = self.presentation.create_visual(id, kind);
        self.presentation.set_visual_position(&visual, position);
        let interpolator = Interpolator::new(id, position, self.config);
        self.table.insert(Entity::new(kind, interpolator, visual))
    }

    fn remove<S: TickScheduler>(&mut self, id: ObjectId, scheduler: &mut S) -> bool {
        let Some(mut entity) = self.table.remove(id) else {
            return false;
        };
        entity.interpolator.cancel(scheduler);
        self.presentation.destroy_visual(entity.visual);
        true
    }

    /// Create or claim the local player's own entity
    ///
    /// A new entity is a `Character` snapped to `position`. An entity the
    /// server already announced keeps its state and is only marked local.
    /// Returns true if a new entity was created.
    pub fn insert_local(&mut self, id: ObjectId, position: Position) -> bool {
        if let Some(entity) = self.table.get_mut(id) {
            entity.mark_local();
            return false;
        }
        self.create(id, ObjectKind::Character, position).mark_local();
        true
    }

    /// Run one due tick and show the result
    ///
    /// Fails with `Error::StaleTick` if the entity is gone or was not
    /// waiting for this tick; nothing is drawn in that case.
    pub fn tick<S: TickScheduler>(
        &mut self,
        tick: ScheduledTick,
        scheduler: &mut S,
    ) -> Result<TickOutcome> {
        let entity = self.table.get_mut(tick.id).ok_or(Error::StaleTick {
            id: tick.id,
            handle: tick.handle,
        })?;
        let outcome = entity.interpolator.tick(tick.handle, scheduler)?;
        self.presentation
            .set_visual_position(&entity.visual, outcome.position());
        if outcome.is_settled() {
            trace!(id = %tick.id, position = %outcome.position(), "converged");
        }
        Ok(outcome)
    }

    /// Remove every entity, cancelling ticks and destroying visuals
    ///
    /// Returns the number of entities removed.
    pub fn clear<S: TickScheduler>(&mut self, scheduler: &mut S) -> usize {
        let mut removed = 0;
        for mut entity in self.table.drain() {
            entity.interpolator.cancel(scheduler);
            self.presentation.destroy_visual(entity.visual);
            removed += 1;
        }
        removed
    }

    /// Read access to the entity table
    pub fn table(&self) -> &EntityTable<P::Handle> {
        &self.table
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Interpolation parameters given to new entities
    pub fn config(&self) -> InterpolationConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::RecordingPresentation;
    use crate::scheduler::ManualScheduler;

    fn setup() -> (Reconciler<RecordingPresentation>, ManualScheduler) {
        (
            Reconciler::new(RecordingPresentation::new()),
            ManualScheduler::new(),
        )
    }

    fn id(raw: u32) -> ObjectId {
        ObjectId::new(raw)
    }

    fn run_frames(
        reconciler: &mut Reconciler<RecordingPresentation>,
        scheduler: &mut ManualScheduler,
    ) -> usize {
        let mut frames = 0;
        while !scheduler.is_idle() {
            for tick in scheduler.take_due() {
                reconciler.tick(tick, scheduler).unwrap();
            }
            frames += 1;
            assert!(frames < 1000, "ticks never settled");
        }
        frames
    }

    #[test]
    fn test_with_config_validates() {
        let bad = InterpolationConfig::new(0.2, 0.0);
        let result = Reconciler::with_config(RecordingPresentation::new(), bad);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let good = InterpolationConfig::new(0.5, 0.05);
        let reconciler = Reconciler::with_config(RecordingPresentation::new(), good).unwrap();
        assert_eq!(reconciler.config(), good);
    }

    #[test]
    fn test_join_creates_snapped_entity() {
        let (mut reconciler, mut scheduler) = setup();
        let msg = Message::player_joined(4, ObjectKind::Enemy, Position::new(3.0, 9.0));

        let summary = reconciler.apply(&msg, &mut scheduler);
        assert_eq!(summary.created, 1);

        let entity = reconciler.table().get(id(4)).unwrap();
        assert_eq!(entity.kind(), ObjectKind::Enemy);
        assert_eq!(entity.position(), Position::new(3.0, 9.0));
        assert_eq!(entity.interpolator().target(), Position::new(3.0, 9.0));
        assert!(!entity.interpolator().is_active());
        assert!(scheduler.is_idle());

        let presentation = reconciler.presentation();
        assert_eq!(presentation.created_count(id(4)), 1);
        assert_eq!(presentation.last_position(id(4)), Some(Position::new(3.0, 9.0)));
    }

    #[test]
    fn test_join_is_idempotent() {
        let (mut reconciler, mut scheduler) = setup();
        let msg = Message::player_joined(1, ObjectKind::Character, Position::new(1.0, 1.0));

        reconciler.apply(&msg, &mut scheduler);
        let once = reconciler.table().states();

        let summary = reconciler.apply(&msg, &mut scheduler);
        assert_eq!(summary.created, 0);
        assert_eq!(summary.duplicate_joins, 1);
        assert_eq!(reconciler.table().states(), once);
        assert_eq!(reconciler.presentation().created_count(id(1)), 1);
    }

    #[test]
    fn test_join_does_not_move_known_entity() {
        let (mut reconciler, mut scheduler) = setup();
        reconciler.apply(
            &Message::player_joined(1, ObjectKind::Character, Position::new(1.0, 1.0)),
            &mut scheduler,
        );
        reconciler.apply(
            &Message::player_joined(1, ObjectKind::Item, Position::new(50.0, 50.0)),
            &mut scheduler,
        );

        let entity = reconciler.table().get(id(1)).unwrap();
        assert_eq!(entity.kind(), ObjectKind::Character);
        assert_eq!(entity.position(), Position::new(1.0, 1.0));
    }

    #[test]
    fn test_update_retargets_known_entity() {
        let (mut reconciler, mut scheduler) = setup();
        reconciler.apply(
            &Message::player_joined(1, ObjectKind::Character, Position::ORIGIN),
            &mut scheduler,
        );

        let update =
            Message::position_update([ObjectRecord::new(1, ObjectKind::Character, (10.0, 0.0))]);
        let summary = reconciler.apply(&update, &mut scheduler);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.created, 0);

        let entity = reconciler.table().get(id(1)).unwrap();
        assert!(entity.interpolator().is_active());
        assert_eq!(entity.position(), Position::ORIGIN);
        assert_eq!(scheduler.pending_len(), 1);

        let tick = scheduler.take_due()[0];
        let outcome = reconciler.tick(tick, &mut scheduler).unwrap();
        assert_eq!(outcome.position(), Position::new(2.0, 0.0));
        assert_eq!(
            reconciler.presentation().last_position(id(1)),
            Some(Position::new(2.0, 0.0))
        );

        run_frames(&mut reconciler, &mut scheduler);
        let entity = reconciler.table().get(id(1)).unwrap();
        assert_eq!(entity.position(), Position::new(10.0, 0.0));
        assert!(!entity.interpolator().is_active());
    }

    #[test]
    fn test_update_implicitly_creates() {
        let (mut reconciler, mut scheduler) = setup();
        let update = Message::position_update([
            ObjectRecord::new(1, ObjectKind::Character, (10.0, 20.0)),
            ObjectRecord::new(2, ObjectKind::Enemy, (5.0, 5.0)),
        ]);

        let summary = reconciler.apply(&update, &mut scheduler);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.implicit_creates, 2);
        assert!(scheduler.is_idle());

        let table = reconciler.table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(id(1)).unwrap().position(), Position::new(10.0, 20.0));
        assert_eq!(table.get(id(2)).unwrap().kind(), ObjectKind::Enemy);
    }

    #[test]
    fn test_update_keeps_creation_kind() {
        let (mut reconciler, mut scheduler) = setup();
        reconciler.apply(
            &Message::position_update([ObjectRecord::new(1, ObjectKind::Item, (0.0, 0.0))]),
            &mut scheduler,
        );
        reconciler.apply(
            &Message::position_update([ObjectRecord::new(1, ObjectKind::Enemy, (3.0, 0.0))]),
            &mut scheduler,
        );
        assert_eq!(reconciler.table().get(id(1)).unwrap().kind(), ObjectKind::Item);
    }

    #[test]
    fn test_leave_removes_and_cancels() {
        let (mut reconciler, mut scheduler) = setup();
        reconciler.apply(
            &Message::position_update([ObjectRecord::new(1, ObjectKind::Character, (0.0, 0.0))]),
            &mut scheduler,
        );
        reconciler.apply(
            &Message::position_update([ObjectRecord::new(1, ObjectKind::Character, (9.0, 9.0))]),
            &mut scheduler,
        );
        let pending = reconciler.table().get(id(1)).unwrap().interpolator().pending_tick();
        let pending = pending.unwrap();

        let summary = reconciler.apply(&Message::player_left(1), &mut scheduler);
        assert_eq!(summary.removed, 1);
        assert!(!reconciler.table().contains(id(1)));
        assert!(!scheduler.is_pending(pending));
        assert!(scheduler.is_idle());
        assert_eq!(reconciler.presentation().destroyed_count(id(1)), 1);
    }

    #[test]
    fn test_leave_unknown_is_noop() {
        let (mut reconciler, mut scheduler) = setup();
        let summary = reconciler.apply(&Message::player_left(77), &mut scheduler);
        assert_eq!(summary.removed, 0);
        assert_eq!(summary.dangling_removals, 1);
        assert!(reconciler.presentation().events().is_empty());
    }

    #[test]
    fn test_tick_after_removal_is_stale() {
        let (mut reconciler, mut scheduler) = setup();
        reconciler.apply(
            &Message::player_joined(1, ObjectKind::Character, Position::ORIGIN),
            &mut scheduler,
        );
        reconciler.apply(
            &Message::position_update([ObjectRecord::new(1, ObjectKind::Character, (4.0, 4.0))]),
            &mut scheduler,
        );
        let tick = ScheduledTick {
            handle: reconciler.table().get(id(1)).unwrap().interpolator().pending_tick().unwrap(),
            id: id(1),
        };
        reconciler.apply(&Message::player_left(1), &mut scheduler);

        let before = reconciler.presentation().events().len();
        let err = reconciler.tick(tick, &mut scheduler).unwrap_err();
        assert!(matches!(err, Error::StaleTick { .. }));
        assert_eq!(reconciler.presentation().events().len(), before);
    }

    #[test]
    fn test_unrecognized_kind_is_dropped() {
        let (mut reconciler, mut scheduler) = setup();
        let msg = Message::new(MessageKind::Unrecognized("chat".to_string())).with_record(
            ObjectRecord::new(1, ObjectKind::Character, (1.0, 1.0)),
        );

        let summary = reconciler.apply(&msg, &mut scheduler);
        assert!(summary.dropped);
        assert!(reconciler.table().is_empty());
    }

    #[test]
    fn test_non_finite_record_is_skipped() {
        let (mut reconciler, mut scheduler) = setup();
        let update = Message::position_update([
            ObjectRecord::new(1, ObjectKind::Character, (f32::NAN, 0.0)),
            ObjectRecord::new(2, ObjectKind::Character, (1.0, 2.0)),
        ]);

        let summary = reconciler.apply(&update, &mut scheduler);
        assert_eq!(summary.rejected_records, 1);
        assert_eq!(summary.created, 1);
        assert!(!reconciler.table().contains(id(1)));
        assert!(reconciler.table().contains(id(2)));
    }

    #[test]
    fn test_batch_order_independence() {
        let a = ObjectRecord::new(1, ObjectKind::Character, (12.0, -4.0));
        let b = ObjectRecord::new(2, ObjectKind::Enemy, (-7.5, 30.0));
        let seed = Message::position_update([
            ObjectRecord::new(1, ObjectKind::Character, (0.0, 0.0)),
            ObjectRecord::new(2, ObjectKind::Enemy, (1.0, 1.0)),
        ]);

        let (mut forward, mut forward_sched) = setup();
        forward.apply(&seed, &mut forward_sched);
        forward.apply(&Message::position_update([a, b]), &mut forward_sched);

        let (mut reverse, mut reverse_sched) = setup();
        reverse.apply(&seed, &mut reverse_sched);
        reverse.apply(&Message::position_update([b, a]), &mut reverse_sched);

        assert_eq!(forward.table().states(), reverse.table().states());

        run_frames(&mut forward, &mut forward_sched);
        run_frames(&mut reverse, &mut reverse_sched);
        assert_eq!(forward.table().states(), reverse.table().states());
    }

    #[test]
    fn test_insert_local() {
        let (mut reconciler, mut scheduler) = setup();
        assert!(reconciler.insert_local(id(5), Position::ORIGIN));
        let entity = reconciler.table().get(id(5)).unwrap();
        assert!(entity.is_local());
        assert_eq!(entity.kind(), ObjectKind::Character);

        reconciler.apply(
            &Message::position_update([ObjectRecord::new(6, ObjectKind::Character, (2.0, 2.0))]),
            &mut scheduler,
        );
        assert!(!reconciler.insert_local(id(6), Position::ORIGIN));
        let entity = reconciler.table().get(id(6)).unwrap();
        assert!(entity.is_local());
        assert_eq!(entity.position(), Position::new(2.0, 2.0));
        assert_eq!(reconciler.presentation().created_count(id(6)), 1);
    }

    #[test]
    fn test_clear() {
        let (mut reconciler, mut scheduler) = setup();
        reconciler.apply(
            &Message::position_update([
                ObjectRecord::new(1, ObjectKind::Character, (0.0, 0.0)),
                ObjectRecord::new(2, ObjectKind::Item, (0.0, 0.0)),
            ]),
            &mut scheduler,
        );
        reconciler.apply(
            &Message::position_update([ObjectRecord::new(1, ObjectKind::Character, (5.0, 0.0))]),
            &mut scheduler,
        );
        assert_eq!(scheduler.pending_len(), 1);

        assert_eq!(reconciler.clear(&mut scheduler), 2);
        assert!(reconciler.table().is_empty());
        assert!(scheduler.is_idle());
        assert_eq!(reconciler.presentation().destroyed_count(id(1)), 1);
        assert_eq!(reconciler.presentation().destroyed_count(id(2)), 1);
    }
}
