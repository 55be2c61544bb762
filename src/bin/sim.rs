//! restomap-sim binary
//!
//! Drives the marker synchronization engine against a deterministic
//! in-process query service and logs every marker mutation. Useful for
//! eyeballing the debounce / mode-switch / reconciliation behavior without
//! a real backend or map widget.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                        | Default      | Description                      |
//! |----------------------------|--------------|----------------------------------|
//! | `RESTOMAP_DEBOUNCE_MS`     | `500`        | Trailing-edge debounce window    |
//! | `RESTOMAP_MAX_ZOOM`        | `18`         | Zoom ceiling correction          |
//! | `RESTOMAP_POINT_QUERY_LIMIT` | `200`      | Entity cap on point queries      |
//! | `--config <path>`          | none         | Optional TOML overriding the above |

use std::future::Future;

use anyhow::Result;
use clap::Parser;
use restomap::dispatch::{QueryError, SpatialQueryService};
use restomap::protocol::{
    ClusterResponse, PointResponse, StallsResponse, WireCellId, WireCluster, WireLocation,
    WireRestaurant, WireStall,
};
use restomap::{
    EngineConfig, EntityBatch, EntityKind, IconSpec, LatLng, MapEngine, MarkerKind, MarkerSink,
    RawViewport, SpatialEntity,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "restomap-sim", about = "Restomap engine simulator", version)]
struct Args {
    /// Starting viewport center latitude
    #[arg(long, env = "RESTOMAP_CENTER_LAT", default_value_t = 52.516267)]
    center_lat: f64,

    /// Starting viewport center longitude
    #[arg(long, env = "RESTOMAP_CENTER_LNG", default_value_t = 13.322455)]
    center_lng: f64,

    /// Seed for the deterministic fake backend
    #[arg(long, env = "RESTOMAP_SEED", default_value_t = 42)]
    seed: u64,

    /// Number of scripted pan/zoom steps
    #[arg(long, env = "RESTOMAP_STEPS", default_value_t = 6)]
    steps: u32,

    /// Optional TOML file with engine settings
    #[arg(long)]
    config: Option<String>,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(config::File::with_name(path));
    }
    let settings = builder
        .add_source(config::Environment::with_prefix("RESTOMAP"))
        .build()?;
    Ok(settings.try_deserialize()?)
}

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

/// Deterministic stand-in for the spatial backend: entities are scattered
/// around the query center by hashing the seed with a per-entity index.
struct FakeService {
    seed: u64,
}

impl FakeService {
    fn offset(&self, index: u64) -> (f64, f64) {
        let h = self
            .seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(index.wrapping_mul(1442695040888963407));
        let a = (h >> 16 & 0xffff) as f64 / 65535.0;
        let b = (h >> 32 & 0xffff) as f64 / 65535.0;
        ((a - 0.5) * 0.04, (b - 0.5) * 0.04)
    }

    fn location(&self, center: LatLng, index: u64) -> WireLocation {
        let (dlat, dlng) = self.offset(index);
        WireLocation {
            coordinates: vec![
                serde_json::json!(center.lng + dlng),
                serde_json::json!(center.lat + dlat),
            ],
        }
    }
}

impl SpatialQueryService for FakeService {
    fn cluster_query(
        &self,
        center: LatLng,
        radius_km: f64,
    ) -> impl Future<Output = Result<ClusterResponse, QueryError>> + Send {
        let clusters = (0..8)
            .map(|i| WireCluster {
                id: None,
                location: self.location(center, i),
                count: 3 + (i as u32 * 7) % 40,
                cell_id: WireCellId {
                    lon_cell: i as i32,
                    lat_cell: (radius_km as i32) % 10,
                },
            })
            .collect();
        async move { Ok(ClusterResponse { clusters }) }
    }

    fn point_query(
        &self,
        _user_location: Option<LatLng>,
        center: LatLng,
        _radius_km: f64,
        limit: u32,
    ) -> impl Future<Output = Result<PointResponse, QueryError>> + Send {
        let restaurants = (0..12.min(limit as u64))
            .map(|i| WireRestaurant {
                id: format!("r{i}"),
                location: self.location(center, 100 + i),
                is_available: i % 3 != 0,
                onboarded: true,
            })
            .collect();
        async move {
            Ok(PointResponse {
                restaurants,
                campaigns: Vec::new(),
            })
        }
    }

    fn event_stalls(
        &self,
        event_id: &str,
    ) -> impl Future<Output = Result<StallsResponse, QueryError>> + Send {
        let stalls = (0..3)
            .map(|i| WireStall {
                id: format!("{event_id}-stall-{i}"),
                name: format!("Stall {i}"),
            })
            .collect();
        async move { Ok(StallsResponse { stalls }) }
    }
}

// ---------------------------------------------------------------------------
// Logging sink
// ---------------------------------------------------------------------------

struct LoggingSink;

impl MarkerSink for LoggingSink {
    fn draw_marker(&mut self, id: &str, kind: MarkerKind, position: LatLng, icon: &IconSpec) {
        log::info!(
            "draw   {:?} {} @ {} label={:?}",
            kind,
            id,
            position,
            icon.label
        );
    }

    fn remove_marker(&mut self, id: &str) {
        log::info!("remove {}", id);
    }
}

// ---------------------------------------------------------------------------
// Scripted session
// ---------------------------------------------------------------------------

/// Approximate right-edge point for a given radius at the viewport center.
fn right_edge(center: LatLng, radius_km: f64) -> LatLng {
    let dlng = radius_km / (111.32 * center.lat.to_radians().cos());
    LatLng::new(center.lat, center.lng + dlng)
}

fn demo_events(center: LatLng) -> EntityBatch {
    let mut batch = EntityBatch::new(EntityKind::Event);
    batch.entities.push(SpatialEntity::Event {
        id: "street-food-thursday".into(),
        location: LatLng::new(center.lat + 0.01, center.lng + 0.01),
        schedule: "thu 16-22".into(),
        is_active: true,
    });
    batch
}

async fn run_session(args: Args, cfg: EngineConfig) -> Result<()> {
    let debounce = cfg.debounce();
    let mut engine = MapEngine::new(cfg, FakeService { seed: args.seed }, LoggingSink);

    let center = LatLng::new(args.center_lat, args.center_lng);
    for cmd in engine.supply_events(demo_events(center)) {
        log::info!("surface command: {:?}", cmd);
    }
    for cmd in engine.set_user_location(Some(center)) {
        log::info!("surface command: {:?}", cmd);
    }

    // Zoom out step by step, crossing the point/cluster boundary.
    let radii = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0];
    let mut raw = RawViewport {
        center,
        right_edge: right_edge(center, radii[0]),
        zoom: 16,
    };
    for cmd in engine.start(&raw) {
        log::info!("surface command: {:?}", cmd);
    }

    for step in 0..args.steps {
        tokio::time::sleep(debounce * 2).await;
        let radius = radii[(step as usize + 1) % radii.len()];
        raw.center = LatLng::new(raw.center.lat + 0.002, raw.center.lng + 0.002);
        raw.right_edge = right_edge(raw.center, radius);
        raw.zoom = if radius <= 2.0 { 16 } else { 12 };
        log::info!("step {step}: pan to {} (radius ~{radius} km)", raw.center);
        for cmd in engine.on_viewport_changed(&raw) {
            log::info!("surface command: {:?}", cmd);
        }
    }
    tokio::time::sleep(debounce * 2).await;

    if let Some(entity) = engine.on_marker_clicked("street-food-thursday") {
        log::info!("clicked entity: {:?}", entity.id());
        let stalls = engine.stalls_for_event(entity.id()).await?;
        for stall in stalls {
            log::info!("  stall {} ({})", stall.name, stall.id);
        }
    }

    let stats = engine.stats();
    log::info!(
        "session done: {} fetches, {} applied, {} stale dropped, {} failures",
        stats.fetches_dispatched,
        stats.batches_applied,
        stats.stale_responses_dropped,
        stats.fetch_failures,
    );
    engine.shutdown();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("restomap=debug".parse()?)
                .add_directive("restomap_sim=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;

    log::info!(
        "Starting restomap-sim (center=({}, {}), seed={}, steps={})",
        args.center_lat,
        args.center_lng,
        args.seed,
        args.steps,
    );

    tokio::select! {
        result = run_session(args, cfg) => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted, shutting down");
            Ok(())
        }
    }
}
