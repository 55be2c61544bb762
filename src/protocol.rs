//! Wire types for the spatial query backend.
//!
//! Everything here is a transport shape; [`crate::entity`] holds the domain
//! shapes the engine actually works with. Conversion is lossy on purpose:
//! malformed records are skipped with a warning instead of failing the whole
//! response.
//!
//! | Response          | Produced by        | Converts into                |
//! |-------------------|--------------------|------------------------------|
//! | `ClusterResponse` | cluster query      | `EntityBatch` of clusters    |
//! | `PointResponse`   | point query        | `EntityBatch` of restaurants |
//! | `Vec<WireEvent>`  | host event feed    | `EntityBatch` of events      |
//! | `StallsResponse`  | event stall lookup | `Vec<Stall>`                 |
//!
//! Locations arrive GeoJSON-style: `coordinates` is `[lng, lat]`, and the
//! backend has been observed emitting coordinates as strings (and, rarely,
//! `"NaN"`). `WireLocation::to_lat_lng` absorbs all of that.

use std::collections::HashMap;

use serde::Deserialize;

use crate::entity::{Campaign, EntityBatch, EntityKind, SpatialEntity, Stall};
use crate::geo::LatLng;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WireLocation {
    #[serde(default)]
    pub coordinates: Vec<serde_json::Value>,
}

impl WireLocation {
    /// GeoJSON order: `coordinates[0]` is longitude, `[1]` is latitude.
    /// Returns `None` when either coordinate is missing, non-numeric, or
    /// non-finite.
    pub fn to_lat_lng(&self) -> Option<LatLng> {
        let lng = coerce_coord(self.coordinates.first()?)?;
        let lat = coerce_coord(self.coordinates.get(1)?)?;
        Some(LatLng::new(lat, lng))
    }
}

fn coerce_coord(value: &serde_json::Value) -> Option<f64> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// ---------------------------------------------------------------------------
// Cluster query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WireCellId {
    pub lon_cell: i32,
    pub lat_cell: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WireCluster {
    #[serde(default)]
    pub id: Option<String>,
    pub location: WireLocation,
    pub count: u32,
    pub cell_id: WireCellId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusterResponse {
    #[serde(default)]
    pub clusters: Vec<WireCluster>,
}

impl ClusterResponse {
    pub fn into_batch(self) -> EntityBatch {
        let mut batch = EntityBatch::new(EntityKind::Cluster);
        for wire in self.clusters {
            let Some(location) = wire.location.to_lat_lng() else {
                log::warn!(
                    "dropping cluster with unusable location: {:?}",
                    wire.location.coordinates
                );
                continue;
            };
            let id = wire
                .id
                .unwrap_or_else(|| format!("cell:{}:{}", wire.cell_id.lon_cell, wire.cell_id.lat_cell));
            batch.entities.push(SpatialEntity::Cluster {
                id,
                location,
                count: wire.count,
                cell_id: (wire.cell_id.lon_cell, wire.cell_id.lat_cell),
            });
        }
        batch
    }
}

// ---------------------------------------------------------------------------
// Point query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WireRestaurant {
    pub id: String,
    pub location: WireLocation,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub onboarded: bool,
}

/// Campaigns ride alongside restaurants in the point response and are joined
/// to their restaurant by id on the client side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WireCampaign {
    pub id: String,
    pub restaurant: String,
    pub name: String,
    #[serde(default)]
    pub campaign_type: Option<String>,
    #[serde(default)]
    pub promotion: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PointResponse {
    #[serde(default)]
    pub restaurants: Vec<WireRestaurant>,
    #[serde(default)]
    pub campaigns: Vec<WireCampaign>,
}

impl PointResponse {
    /// Joins active campaigns onto their restaurants. Campaigns referencing a
    /// restaurant absent from this response are dropped.
    pub fn into_batch(self) -> EntityBatch {
        let mut by_restaurant: HashMap<String, Vec<Campaign>> = HashMap::new();
        for wire in self.campaigns {
            if !wire.is_active {
                continue;
            }
            by_restaurant.entry(wire.restaurant).or_default().push(Campaign {
                id: wire.id,
                name: wire.name,
                campaign_type: wire.campaign_type,
                promotion: wire.promotion,
            });
        }

        let mut batch = EntityBatch::new(EntityKind::Restaurant);
        for wire in self.restaurants {
            let Some(location) = wire.location.to_lat_lng() else {
                log::warn!("dropping restaurant {} with unusable location", wire.id);
                continue;
            };
            let campaigns = by_restaurant.remove(&wire.id).unwrap_or_default();
            batch.entities.push(SpatialEntity::Restaurant {
                id: wire.id,
                location,
                is_available: wire.is_available,
                onboarded: wire.onboarded,
                campaigns,
            });
        }
        if !by_restaurant.is_empty() {
            log::debug!(
                "{} campaigns referenced restaurants outside this response",
                by_restaurant.values().map(Vec::len).sum::<usize>()
            );
        }
        batch
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WireEvent {
    pub id: String,
    pub location: WireLocation,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub is_active: bool,
}

pub fn events_batch(events: Vec<WireEvent>) -> EntityBatch {
    let mut batch = EntityBatch::new(EntityKind::Event);
    for wire in events {
        let Some(location) = wire.location.to_lat_lng() else {
            log::warn!("dropping event {} with unusable location", wire.id);
            continue;
        };
        batch.entities.push(SpatialEntity::Event {
            id: wire.id,
            location,
            schedule: wire.schedule,
            is_active: wire.is_active,
        });
    }
    batch
}

// ---------------------------------------------------------------------------
// Event stalls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WireStall {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StallsResponse {
    #[serde(default)]
    pub stalls: Vec<WireStall>,
}

impl StallsResponse {
    pub fn into_stalls(self) -> Vec<Stall> {
        self.stalls
            .into_iter()
            .map(|wire| Stall {
                id: wire.id,
                name: wire.name,
            })
            .collect()
    }
}
