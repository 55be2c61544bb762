//! Diff-based marker reconciliation.
//!
//! [`RenderedState`] mirrors what the host surface is currently showing, one
//! map per entity kind plus the user marker. [`reconcile`] diffs a fresh
//! batch against that mirror and returns the minimal instruction list to
//! make the surface match:
//!
//! * ephemeral kinds (clusters, restaurants): remove stale ids, draw new ids
//! * persistent kinds (events): draw new ids only, never remove
//!
//! Identity is the entity id alone. A marker whose id survives a refresh is
//! left untouched even if its payload changed, so reconciling the same batch
//! twice is a no-op.

use std::collections::{BTreeMap, HashSet};

use crate::entity::{EntityBatch, EntityKind, SpatialEntity};
use crate::geo::LatLng;
use crate::surface::{IconSpec, MarkerKind};

/// Reserved marker id for the device-location marker.
pub const USER_MARKER_ID: &str = "user-location";

// ---------------------------------------------------------------------------
// Rendered state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub entity: SpatialEntity,
    pub icon: IconSpec,
}

/// Client-side mirror of every marker currently on the surface.
///
/// BTreeMaps keep instruction order deterministic, which keeps replay and
/// test assertions stable.
#[derive(Debug, Default)]
pub struct RenderedState {
    clusters: BTreeMap<String, MarkerRecord>,
    restaurants: BTreeMap<String, MarkerRecord>,
    events: BTreeMap<String, MarkerRecord>,
    user_marker: Option<LatLng>,
}

impl RenderedState {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, kind: EntityKind) -> &BTreeMap<String, MarkerRecord> {
        match kind {
            EntityKind::Cluster => &self.clusters,
            EntityKind::Restaurant => &self.restaurants,
            EntityKind::Event => &self.events,
        }
    }

    fn collection_mut(&mut self, kind: EntityKind) -> &mut BTreeMap<String, MarkerRecord> {
        match kind {
            EntityKind::Cluster => &mut self.clusters,
            EntityKind::Restaurant => &mut self.restaurants,
            EntityKind::Event => &mut self.events,
        }
    }

    pub fn marker_count(&self, kind: EntityKind) -> usize {
        self.collection(kind).len()
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.collection(kind).contains_key(id)
    }

    /// Looks an id up across every kind. Marker click resolution.
    pub fn entity(&self, id: &str) -> Option<&SpatialEntity> {
        [&self.clusters, &self.restaurants, &self.events]
            .into_iter()
            .find_map(|map| map.get(id))
            .map(|record| &record.entity)
    }

    pub fn user_marker(&self) -> Option<LatLng> {
        self.user_marker
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// One surface mutation. The engine applies these to its [`crate::surface::MarkerSink`];
/// they are also the unit tests assert on.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawInstruction {
    Draw {
        id: String,
        kind: MarkerKind,
        position: LatLng,
        icon: IconSpec,
    },
    Remove { id: String },
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Diffs `batch` against `state` and mutates `state` to match, returning the
/// instructions the surface needs. `batch.kind` must equal `kind`.
pub fn reconcile(
    kind: EntityKind,
    batch: &EntityBatch,
    state: &mut RenderedState,
) -> Vec<DrawInstruction> {
    debug_assert_eq!(kind, batch.kind);
    let mut instructions = Vec::new();

    if !kind.persistent() {
        let incoming: HashSet<&str> = batch.entities.iter().map(|e| e.id()).collect();
        let collection = state.collection_mut(kind);
        let stale: Vec<String> = collection
            .keys()
            .filter(|id| !incoming.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            collection.remove(&id);
            instructions.push(DrawInstruction::Remove { id });
        }
    }

    let collection = state.collection_mut(kind);
    for entity in &batch.entities {
        if collection.contains_key(entity.id()) {
            continue;
        }
        let icon = IconSpec::for_entity(entity);
        instructions.push(DrawInstruction::Draw {
            id: entity.id().to_string(),
            kind: kind.into(),
            position: entity.location(),
            icon: icon.clone(),
        });
        collection.insert(
            entity.id().to_string(),
            MarkerRecord {
                entity: entity.clone(),
                icon,
            },
        );
    }

    instructions
}

/// Removes every marker of `kind`. Used when switching between cluster and
/// point mode and at teardown.
pub fn clear_kind(kind: EntityKind, state: &mut RenderedState) -> Vec<DrawInstruction> {
    let collection = state.collection_mut(kind);
    let ids: Vec<String> = collection.keys().cloned().collect();
    collection.clear();
    ids.into_iter()
        .map(|id| DrawInstruction::Remove { id })
        .collect()
}

/// Wholesale replacement of the device-location marker. `None` removes it.
pub fn replace_user_marker(
    state: &mut RenderedState,
    location: Option<LatLng>,
) -> Vec<DrawInstruction> {
    let mut instructions = Vec::new();
    if state.user_marker.is_some() {
        instructions.push(DrawInstruction::Remove {
            id: USER_MARKER_ID.to_string(),
        });
    }
    if let Some(position) = location {
        instructions.push(DrawInstruction::Draw {
            id: USER_MARKER_ID.to_string(),
            kind: MarkerKind::User,
            position,
            icon: IconSpec::user(),
        });
    }
    state.user_marker = location;
    instructions
}
