//! Local entities and the table that owns them

use crate::interpolation::Interpolator;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snapsync_core::{ObjectId, ObjectKind, Position};

/// Plain copy of one entity's observable state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub current: Position,
    pub target: Position,
    pub active: bool,
    pub is_local: bool,
}

/// The client's renderable copy of one server object
///
/// `kind` is fixed at creation. The interpolator and the visual handle live
/// and die with the entity.
#[derive(Debug)]
pub struct Entity<H> {
    id: ObjectId,
    kind: ObjectKind,
    is_local: bool,
    pub(crate) interpolator: Interpolator,
    pub(crate) visual: H,
}

impl<H> Entity<H> {
    pub(crate) fn new(kind: ObjectKind, interpolator: Interpolator, visual: H) -> Self {
        Self {
            id: interpolator.id(),
            kind,
            is_local: false,
            interpolator,
            visual,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Check if this is the local player's own entity
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub(crate) fn mark_local(&mut self) {
        self.is_local = true;
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    /// The displayed position
    pub fn position(&self) -> Position {
        self.interpolator.current()
    }

    pub fn visual(&self) -> &H {
        &self.visual
    }

    /// Copy out the observable state
    pub fn state(&self) -> EntityState {
        EntityState {
            id: self.id,
            kind: self.kind,
            current: self.interpolator.current(),
            target: self.interpolator.target(),
            active: self.interpolator.is_active(),
            is_local: self.is_local,
        }
    }
}

/// Mapping from object id to entity
///
/// Read access is public; every mutation goes through the `Reconciler`.
#[derive(Debug)]
pub struct EntityTable<H> {
    entities: IndexMap<ObjectId, Entity<H>>,
}

impl<H> EntityTable<H> {
    pub(crate) fn new() -> Self {
        Self {
            entities: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, entity: Entity<H>) -> &mut Entity<H> {
        match self.entities.entry(entity.id) {
            Entry::Occupied(mut slot) => {
                slot.insert(entity);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entity),
        }
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut Entity<H>> {
        self.entities.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<Entity<H>> {
        self.entities.shift_remove(&id)
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Entity<H>> + '_ {
        self.entities.drain(..).map(|(_, entity)| entity)
    }

    /// Get an entity by id
    pub fn get(&self, id: ObjectId) -> Option<&Entity<H>> {
        self.entities.get(&id)
    }

    /// Check if an id is present
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get all entity ids in creation order
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entities.keys().copied()
    }

    /// Get all entities in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Entity<H>> {
        self.entities.values()
    }

    /// Observable state of every entity, sorted by id
    ///
    /// Independent of insertion order, so two tables holding the same
    /// objects compare equal.
    pub fn states(&self) -> Vec<EntityState> {
        let mut states: Vec<_> = self.iter().map(Entity::state).collect();
        states.sort_by_key(|s| s.id);
        states
    }

    /// Number of entities with a pending tick
    pub fn active_count(&self) -> usize {
        self.iter().filter(|e| e.interpolator.is_active()).count()
    }

    /// Get the number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
