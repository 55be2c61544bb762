//! Engine tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cluster-bucket boundaries, kilometres, ascending.
///
/// The first entry doubles as the point/cluster mode boundary: samples at or
/// below it query individual restaurants, samples above it query clusters.
pub const DEFAULT_RADIUS_THRESHOLDS_KM: [f64; 9] =
    [3.0, 5.02, 6.97, 9.67, 13.44, 18.66, 25.92, 36.0, 50.0];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Floor applied to every sampled radius.
    pub min_radius_km: f64,
    /// Hard ceiling on the sampled radius.
    pub max_radius_km: f64,
    /// Host-configured cap, applied as `min(max_current_radius_km, max_radius_km)`.
    pub max_current_radius_km: f64,
    /// Radii at or below this query individual restaurants ("point" mode).
    pub point_mode_max_km: f64,
    /// Hysteresis buckets for cluster granularity, ascending.
    pub radius_thresholds_km: Vec<f64>,
    /// Trailing-edge debounce window for viewport-driven fetches.
    pub debounce_ms: u64,
    /// Tile providers stop serving above this zoom; samples beyond it are
    /// corrected by stepping the surface back down.
    pub max_zoom: u8,
    /// Absolute entity cap requested on point queries.
    pub point_query_limit: u32,
    /// Zoom used for the one-time initial focus on the first event.
    pub focus_zoom: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_radius_km: 0.5,
            max_radius_km: 50.0,
            max_current_radius_km: 50.0,
            point_mode_max_km: 3.0,
            radius_thresholds_km: DEFAULT_RADIUS_THRESHOLDS_KM.to_vec(),
            debounce_ms: 500,
            max_zoom: 18,
            point_query_limit: 200,
            focus_zoom: 14,
        }
    }
}

impl EngineConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Effective radius ceiling for sampling.
    pub fn radius_ceiling_km(&self) -> f64 {
        self.max_radius_km.min(self.max_current_radius_km)
    }
}
