//! Viewport sampling: converting raw rendering-surface state into a
//! normalized, clamped [`Viewport`] sample.
//!
//! The effective radius is derived from the great-circle distance between
//! the viewport center and the midpoint of its right edge — never from the
//! raw zoom level — so it stays correct at any latitude and aspect ratio.

use crate::config::EngineConfig;
use crate::geo::{haversine_km, LatLng};
use crate::surface::SurfaceCommand;

// ---------------------------------------------------------------------------
// Raw surface state
// ---------------------------------------------------------------------------

/// A snapshot of the rendering surface, queried on every viewport-changed
/// event (the events themselves carry no payload).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawViewport {
    pub center: LatLng,
    /// Geographic position under the midpoint of the container's right edge.
    pub right_edge: LatLng,
    pub zoom: u8,
}

// ---------------------------------------------------------------------------
// Normalized sample
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub radius_km: f64,
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

/// Clamps raw surface samples to policy bounds and corrects excessive zoom.
#[derive(Debug, Clone)]
pub struct ViewportSampler {
    min_radius_km: f64,
    radius_ceiling_km: f64,
    max_zoom: u8,
}

impl ViewportSampler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            min_radius_km: config.min_radius_km,
            radius_ceiling_km: config.radius_ceiling_km(),
            max_zoom: config.max_zoom,
        }
    }

    /// Normalize a raw surface snapshot.
    ///
    /// The radius is rounded to 0.1 km, then clamped to
    /// `[min_radius_km, radius_ceiling_km]`. If the surface reports a zoom
    /// above the configured ceiling, a corrective [`SurfaceCommand::SetZoom`]
    /// is returned alongside the sample — excessive zoom is recovered from,
    /// not treated as an error.
    pub fn sample(&self, raw: &RawViewport) -> (Viewport, Option<SurfaceCommand>) {
        let raw_km = haversine_km(raw.center, raw.right_edge);
        let rounded = (raw_km * 10.0).round() / 10.0;
        let radius_km = rounded.min(self.radius_ceiling_km).max(self.min_radius_km);

        let correction = self.zoom_correction(raw.zoom);
        if correction.is_some() {
            log::debug!(
                "surface zoom {} exceeds ceiling {}, stepping back down",
                raw.zoom,
                self.max_zoom
            );
        }

        (
            Viewport {
                center: raw.center,
                radius_km,
            },
            correction,
        )
    }

    /// Corrective command for an over-zoomed surface, if needed.
    pub fn zoom_correction(&self, zoom: u8) -> Option<SurfaceCommand> {
        (zoom > self.max_zoom).then(|| SurfaceCommand::SetZoom(self.max_zoom))
    }
}
