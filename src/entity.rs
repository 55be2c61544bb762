//! Domain entities rendered as map markers.
//!
//! Persistence is a property of the kind, not of scattered code paths: the
//! reconciler asks [`EntityKind::persistent`] and applies one algorithm.

use crate::geo::LatLng;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Cluster,
    Restaurant,
    Event,
}

impl EntityKind {
    /// Persistent kinds are only ever appended to by reconciliation; a
    /// refresh cycle never removes their markers.
    pub fn persistent(self) -> bool {
        matches!(self, EntityKind::Event)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Cluster => "cluster",
            EntityKind::Restaurant => "restaurant",
            EntityKind::Event => "event",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Campaign metadata (joined onto restaurants by the point query)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub campaign_type: Option<String>,
    pub promotion: Option<String>,
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Tagged union over everything the engine can render as a marker.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialEntity {
    /// Aggregated group of restaurants; exists only in cluster mode.
    Cluster {
        id: String,
        location: LatLng,
        count: u32,
        cell_id: (i32, i32),
    },
    /// Individual restaurant; exists only in point mode.
    Restaurant {
        id: String,
        location: LatLng,
        is_available: bool,
        onboarded: bool,
        campaigns: Vec<Campaign>,
    },
    /// Street-food event; persistent (append-only across refresh cycles).
    Event {
        id: String,
        location: LatLng,
        schedule: String,
        is_active: bool,
    },
}

impl SpatialEntity {
    pub fn id(&self) -> &str {
        match self {
            SpatialEntity::Cluster { id, .. }
            | SpatialEntity::Restaurant { id, .. }
            | SpatialEntity::Event { id, .. } => id,
        }
    }

    pub fn location(&self) -> LatLng {
        match self {
            SpatialEntity::Cluster { location, .. }
            | SpatialEntity::Restaurant { location, .. }
            | SpatialEntity::Event { location, .. } => *location,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            SpatialEntity::Cluster { .. } => EntityKind::Cluster,
            SpatialEntity::Restaurant { .. } => EntityKind::Restaurant,
            SpatialEntity::Event { .. } => EntityKind::Event,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// A homogeneous set of entities produced by one query response (or, for
/// events, supplied by the host at session start).
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBatch {
    pub kind: EntityKind,
    pub entities: Vec<SpatialEntity>,
}

impl EntityBatch {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entities: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Event stalls (fetched on explicit selection, outside the refresh loop)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Stall {
    pub id: String,
    pub name: String,
}
