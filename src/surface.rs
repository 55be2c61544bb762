//! Boundary between the engine and whatever actually draws the map.
//!
//! The engine never talks to a rendering library. It consumes
//! [`SurfaceEvent`]s from the host, pushes marker mutations through a
//! [`MarkerSink`], and hands back [`SurfaceCommand`]s for the host to apply
//! to its map widget.

use crate::entity::{EntityKind, SpatialEntity};
use crate::geo::LatLng;

// ---------------------------------------------------------------------------
// Host → engine
// ---------------------------------------------------------------------------

/// Notifications the host surface feeds into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Pan or zoom settled on a new viewport.
    ViewportChanged,
    /// A map tile failed to load at the given zoom level.
    TileError { zoom: u8 },
    /// The user selected a marker.
    MarkerClicked { id: String },
}

// ---------------------------------------------------------------------------
// Engine → host
// ---------------------------------------------------------------------------

/// Imperative map adjustments the host should apply.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    SetZoom(u8),
    SetView { center: LatLng, zoom: u8 },
    FitBounds {
        south_west: LatLng,
        north_east: LatLng,
        padding_px: u32,
    },
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Cluster,
    Restaurant,
    Event,
    User,
}

impl From<EntityKind> for MarkerKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Cluster => MarkerKind::Cluster,
            EntityKind::Restaurant => MarkerKind::Restaurant,
            EntityKind::Event => MarkerKind::Event,
        }
    }
}

/// What the marker should look like. The host maps this to its own icon
/// assets; the engine only decides label and emphasis.
#[derive(Debug, Clone, PartialEq)]
pub struct IconSpec {
    pub kind: MarkerKind,
    pub label: Option<String>,
    pub dimmed: bool,
}

impl IconSpec {
    pub fn for_entity(entity: &SpatialEntity) -> Self {
        match entity {
            SpatialEntity::Cluster { count, .. } => Self {
                kind: MarkerKind::Cluster,
                label: Some(count.to_string()),
                dimmed: false,
            },
            SpatialEntity::Restaurant { is_available, .. } => Self {
                kind: MarkerKind::Restaurant,
                label: None,
                dimmed: !is_available,
            },
            SpatialEntity::Event { is_active, .. } => Self {
                kind: MarkerKind::Event,
                label: None,
                dimmed: !is_active,
            },
        }
    }

    pub fn user() -> Self {
        Self {
            kind: MarkerKind::User,
            label: None,
            dimmed: false,
        }
    }
}

/// Receives marker mutations. Implemented by the host rendering layer; tests
/// implement it with a recording stub.
pub trait MarkerSink: Send + 'static {
    fn draw_marker(&mut self, id: &str, kind: MarkerKind, position: LatLng, icon: &IconSpec);
    fn remove_marker(&mut self, id: &str);
}

#[cfg(test)]
mod tests {
    use super::{IconSpec, MarkerKind};
    use crate::entity::SpatialEntity;
    use crate::geo::LatLng;

    #[test]
    fn cluster_icon_carries_count_label() {
        let icon = IconSpec::for_entity(&SpatialEntity::Cluster {
            id: "c".into(),
            location: LatLng::new(52.5, 13.3),
            count: 42,
            cell_id: (0, 0),
        });
        assert_eq!(icon.kind, MarkerKind::Cluster);
        assert_eq!(icon.label.as_deref(), Some("42"));
    }

    #[test]
    fn unavailable_restaurant_is_dimmed() {
        let icon = IconSpec::for_entity(&SpatialEntity::Restaurant {
            id: "r".into(),
            location: LatLng::new(52.5, 13.3),
            is_available: false,
            onboarded: true,
            campaigns: vec![],
        });
        assert!(icon.dimmed);
    }
}
