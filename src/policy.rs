//! Radius classification: the point/cluster mode boundary and the
//! hysteresis bucket table that keeps small pans from re-issuing queries.

use crate::config::EngineConfig;

// ---------------------------------------------------------------------------
// Query mode
// ---------------------------------------------------------------------------

/// Which representation of nearby entities to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Aggregated: many nearby restaurants summarized as counted markers.
    Cluster,
    /// Fine-grained: one marker per restaurant.
    Point,
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryMode::Cluster => write!(f, "cluster"),
            QueryMode::Point => write!(f, "point"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub mode: QueryMode,
    /// True when this sample lands in a different bucket than the previous
    /// one, or when the two samples straddle the point/cluster boundary.
    pub mode_changed: bool,
}

/// Classifies radius samples against the ordered threshold table.
///
/// Two overlapping rules, on purpose:
/// - bucket changes matter for cluster granularity (a pan from 12 km to
///   17 km wants a coarser cluster query);
/// - the point/cluster switch is governed solely by the boundary, so a move
///   from 2.9 km to 3.1 km always reports a change even though both sit in
///   the lowest buckets.
///
/// Tie-break: a radius exactly at the boundary is `Point`.
#[derive(Debug, Clone)]
pub struct RadiusThresholdPolicy {
    point_mode_max_km: f64,
    thresholds_km: Vec<f64>,
}

impl RadiusThresholdPolicy {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            point_mode_max_km: config.point_mode_max_km,
            thresholds_km: config.radius_thresholds_km.clone(),
        }
    }

    pub fn mode_for(&self, radius_km: f64) -> QueryMode {
        if radius_km <= self.point_mode_max_km {
            QueryMode::Point
        } else {
            QueryMode::Cluster
        }
    }

    /// Index of the first threshold at or above `radius_km`.
    fn bucket(&self, radius_km: f64) -> usize {
        self.thresholds_km
            .iter()
            .position(|t| radius_km <= *t)
            .unwrap_or(self.thresholds_km.len())
    }

    /// Classify the latest sample against the previous one.
    ///
    /// The first-ever sample always reports `mode_changed = true` so the
    /// initial fetch is never suppressed.
    pub fn classify(&self, prev_radius_km: Option<f64>, radius_km: f64) -> Classification {
        let mode = self.mode_for(radius_km);
        let mode_changed = match prev_radius_km {
            None => true,
            Some(prev) => {
                self.bucket(prev) != self.bucket(radius_km) || self.mode_for(prev) != mode
            }
        };
        Classification { mode, mode_changed }
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryMode, RadiusThresholdPolicy};
    use crate::config::EngineConfig;

    fn policy() -> RadiusThresholdPolicy {
        RadiusThresholdPolicy::new(&EngineConfig::default())
    }

    #[test]
    fn mode_is_point_at_or_below_boundary() {
        let p = policy();
        assert_eq!(p.mode_for(0.5), QueryMode::Point);
        assert_eq!(p.mode_for(3.0), QueryMode::Point);
        assert_eq!(p.mode_for(3.0001), QueryMode::Cluster);
        assert_eq!(p.mode_for(50.0), QueryMode::Cluster);
    }

    #[test]
    fn first_sample_always_reports_change() {
        let c = policy().classify(None, 10.0);
        assert_eq!(c.mode, QueryMode::Cluster);
        assert!(c.mode_changed);
    }

    #[test]
    fn pan_within_one_bucket_is_quiet() {
        // 10.0 and 12.0 both sit in the (9.67, 13.44] bucket.
        let c = policy().classify(Some(10.0), 12.0);
        assert_eq!(c.mode, QueryMode::Cluster);
        assert!(!c.mode_changed);
    }

    #[test]
    fn bucket_change_reports_change() {
        // 12.0 → 17.0 crosses the 13.44 edge.
        let c = policy().classify(Some(12.0), 17.0);
        assert!(c.mode_changed);
    }

    #[test]
    fn crossing_the_boundary_always_reports_change() {
        let p = policy();
        assert!(p.classify(Some(2.9), 3.1).mode_changed);
        assert!(p.classify(Some(3.1), 2.9).mode_changed);
        // Exactly at the boundary counts as point mode.
        assert_eq!(p.classify(Some(3.1), 3.0).mode, QueryMode::Point);
        assert!(p.classify(Some(3.1), 3.0).mode_changed);
    }

    #[test]
    fn radius_above_last_threshold_lands_in_overflow_bucket() {
        // Both above 50.0 (possible only if the host raises the ceiling).
        let c = policy().classify(Some(60.0), 70.0);
        assert!(!c.mode_changed);
    }
}
