//! Restomap Engine
//!
//! Viewport-driven marker synchronization for a restaurant-discovery map.
//! The engine keeps the set of drawn map markers consistent with the
//! visible viewport, switching between clustered and individual restaurant
//! queries as the user zooms.
//!
//! ## Architecture
//!
//! ```text
//! MapEngine  (engine.rs)          ← async orchestration, debounce, fetch
//!   └── EngineCore  (engine.rs)   ← single-writer state machine
//!         ├── ViewportSampler       (viewport.rs)
//!         ├── RadiusThresholdPolicy (policy.rs)
//!         ├── SequenceGate          (dispatch.rs)
//!         └── RenderedState         (reconcile.rs)
//! ```
//!
//! Data flow per settled viewport: sample → classify mode → debounce →
//! query backend → distance guard → diff against rendered state → draw and
//! remove instructions pushed into the host's [`surface::MarkerSink`].

pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod engine;
pub mod entity;
pub mod geo;
pub mod policy;
pub mod protocol;
pub mod reconcile;
pub mod surface;
pub mod viewport;

// Convenience re-exports
pub use config::EngineConfig;
pub use dispatch::{FetchPlan, FetchTicket, QueryError, SpatialQueryService};
pub use engine::{EngineCore, EngineStats, MapEngine};
pub use entity::{EntityBatch, EntityKind, SpatialEntity};
pub use geo::LatLng;
pub use policy::QueryMode;
pub use reconcile::{DrawInstruction, RenderedState};
pub use surface::{IconSpec, MarkerKind, MarkerSink, SurfaceCommand, SurfaceEvent};
pub use viewport::{RawViewport, Viewport, ViewportSampler};
