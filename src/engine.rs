//! The synchronization engine.
//!
//! Two layers:
//!
//! * [`EngineCore`] — synchronous state machine. Owns the rendered-state
//!   mirror, the sampler, the threshold policy, and the sequence gate.
//!   Every mutation happens inside one core call, so there is a single
//!   logical writer and no partial updates.
//! * [`MapEngine`] — async orchestrator. Wraps the core in
//!   `Arc<parking_lot::Mutex<_>>`, owns the query service and the debouncer,
//!   and drives fetch tasks. The lock is held only across synchronous core
//!   calls, never across an await.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::debounce::QueryDebouncer;
use crate::dispatch::{FetchPlan, FetchTicket, QueryError, SequenceGate, SpatialQueryService};
use crate::entity::{EntityBatch, EntityKind, SpatialEntity, Stall};
use crate::geo::{self, LatLng};
use crate::policy::{QueryMode, RadiusThresholdPolicy};
use crate::reconcile::{self, DrawInstruction, RenderedState};
use crate::surface::{MarkerSink, SurfaceCommand};
use crate::viewport::{RawViewport, ViewportSampler};

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// Padding applied when fitting the user radius on screen, so the circle
/// does not touch the container edge.
const FIT_BOUNDS_PADDING_PX: u32 = 50;

/// Counters for observability; cheap to copy out under the lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub fetches_dispatched: u64,
    pub batches_applied: u64,
    pub stale_responses_dropped: u64,
    pub fetch_failures: u64,
}

pub struct EngineCore<K: MarkerSink> {
    config: EngineConfig,
    sampler: ViewportSampler,
    policy: RadiusThresholdPolicy,
    state: RenderedState,
    sink: K,
    last_radius_km: Option<f64>,
    seq: SequenceGate,
    loading: bool,
    focus_done: bool,
    stats: EngineStats,
}

impl<K: MarkerSink> EngineCore<K> {
    pub fn new(config: EngineConfig, sink: K) -> Self {
        Self {
            sampler: ViewportSampler::new(&config),
            policy: RadiusThresholdPolicy::new(&config),
            config,
            state: RenderedState::new(),
            sink,
            last_radius_km: None,
            seq: SequenceGate::default(),
            loading: false,
            focus_done: false,
            stats: EngineStats::default(),
        }
    }

    /// Normalizes a raw viewport snapshot into the plan the next fetch
    /// should run with, plus any corrective surface commands.
    pub fn observe_viewport(&mut self, raw: &RawViewport) -> (FetchPlan, Vec<SurfaceCommand>) {
        let (viewport, correction) = self.sampler.sample(raw);
        let classification = self.policy.classify(self.last_radius_km, viewport.radius_km);
        self.last_radius_km = Some(viewport.radius_km);
        if classification.mode_changed {
            log::debug!(
                "query mode now {} at radius {:.1} km",
                classification.mode,
                viewport.radius_km
            );
        }
        let plan = FetchPlan {
            center: viewport.center,
            radius_km: viewport.radius_km,
            mode: classification.mode,
        };
        (plan, correction.into_iter().collect())
    }

    /// Stamps a plan with a fresh sequence number. Any earlier in-flight
    /// fetch is superseded from this moment on.
    pub fn begin_fetch(&mut self, plan: FetchPlan) -> FetchTicket {
        self.loading = true;
        self.stats.fetches_dispatched += 1;
        FetchTicket {
            seq: self.seq.issue(),
            plan,
        }
    }

    /// Applies an accepted response: distance-guards the batch, clears the
    /// sibling ephemeral kind, reconciles, and pushes instructions to the
    /// sink. A stale ticket leaves the state untouched.
    pub fn apply_batch(&mut self, ticket: &FetchTicket, batch: EntityBatch) {
        if !self.seq.is_current(ticket.seq) {
            self.stats.stale_responses_dropped += 1;
            log::debug!("dropping superseded response (seq {})", ticket.seq);
            return;
        }
        self.loading = false;
        self.stats.batches_applied += 1;

        let kind = batch.kind;
        let guarded = EntityBatch {
            kind,
            entities: geo::retain_within(
                batch.entities,
                ticket.plan.center,
                ticket.plan.radius_km,
                |e| e.location(),
            ),
        };

        let sibling = match ticket.plan.mode {
            QueryMode::Cluster => EntityKind::Restaurant,
            QueryMode::Point => EntityKind::Cluster,
        };
        let mut instructions = reconcile::clear_kind(sibling, &mut self.state);
        instructions.extend(reconcile::reconcile(kind, &guarded, &mut self.state));
        log::debug!(
            "applied {} {} markers ({} instructions)",
            guarded.len(),
            kind,
            instructions.len()
        );
        self.apply_instructions(instructions);
    }

    /// A failed fetch leaves every marker in place. The loading flag is
    /// cleared only if the failure belongs to the current fetch.
    pub fn fetch_failed(&mut self, ticket: &FetchTicket, err: &QueryError) {
        self.stats.fetch_failures += 1;
        log::warn!("{} query failed: {}", ticket.plan.mode, err);
        if self.seq.is_current(ticket.seq) {
            self.loading = false;
        }
    }

    /// Appends events to the rendered state. No distance guard and no
    /// removals apply to events. The first non-empty batch triggers a
    /// one-time focus command on its first event.
    pub fn ingest_events(&mut self, batch: EntityBatch) -> Vec<SurfaceCommand> {
        let first = batch.entities.first().map(SpatialEntity::location);
        let instructions = reconcile::reconcile(EntityKind::Event, &batch, &mut self.state);
        self.apply_instructions(instructions);

        let mut commands = Vec::new();
        if !self.focus_done {
            if let Some(center) = first {
                self.focus_done = true;
                commands.push(SurfaceCommand::SetView {
                    center,
                    zoom: self.config.focus_zoom,
                });
            }
        }
        commands
    }

    /// Installs (or removes) the device-location marker and, when set,
    /// asks the surface to fit the user's current radius on screen.
    pub fn set_user_location(&mut self, location: Option<LatLng>) -> Vec<SurfaceCommand> {
        let instructions = reconcile::replace_user_marker(&mut self.state, location);
        self.apply_instructions(instructions);

        let mut commands = Vec::new();
        if let Some(center) = location {
            let radius_km = self
                .last_radius_km
                .unwrap_or(self.config.point_mode_max_km);
            let (south_west, north_east) = geo::bounds_around(center, radius_km);
            commands.push(SurfaceCommand::FitBounds {
                south_west,
                north_east,
                padding_px: FIT_BOUNDS_PADDING_PX,
            });
        }
        commands
    }

    pub fn marker_entity(&self, id: &str) -> Option<SpatialEntity> {
        self.state.entity(id).cloned()
    }

    pub fn zoom_correction(&self, zoom: u8) -> Option<SurfaceCommand> {
        self.sampler.zoom_correction(zoom)
    }

    /// Detaches everything this engine owns from the surface. Event markers
    /// stay: the host surface disposes of those with the map itself.
    pub fn shutdown(&mut self) {
        let mut instructions = reconcile::clear_kind(EntityKind::Cluster, &mut self.state);
        instructions.extend(reconcile::clear_kind(EntityKind::Restaurant, &mut self.state));
        instructions.extend(reconcile::replace_user_marker(&mut self.state, None));
        self.apply_instructions(instructions);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn state(&self) -> &RenderedState {
        &self.state
    }

    fn apply_instructions(&mut self, instructions: Vec<DrawInstruction>) {
        for instruction in instructions {
            match instruction {
                DrawInstruction::Draw {
                    id,
                    kind,
                    position,
                    icon,
                } => self.sink.draw_marker(&id, kind, position, &icon),
                DrawInstruction::Remove { id } => self.sink.remove_marker(&id),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Async orchestrator
// ---------------------------------------------------------------------------

pub struct MapEngine<S: SpatialQueryService, K: MarkerSink> {
    core: Arc<Mutex<EngineCore<K>>>,
    service: Arc<S>,
    debouncer: QueryDebouncer,
    config: EngineConfig,
}

impl<S: SpatialQueryService, K: MarkerSink> MapEngine<S, K> {
    pub fn new(config: EngineConfig, service: S, sink: K) -> Self {
        Self {
            core: Arc::new(Mutex::new(EngineCore::new(config.clone(), sink))),
            service: Arc::new(service),
            debouncer: QueryDebouncer::new(config.debounce()),
            config,
        }
    }

    /// First sample at mount time. Same path as any later viewport change,
    /// so the initial fetch also rides the debounce window.
    pub fn start(&mut self, raw: &RawViewport) -> Vec<SurfaceCommand> {
        self.on_viewport_changed(raw)
    }

    /// Pan or zoom settled. Returns corrective commands for the host to
    /// apply immediately; the fetch itself is debounced.
    pub fn on_viewport_changed(&mut self, raw: &RawViewport) -> Vec<SurfaceCommand> {
        let (plan, commands) = self.core.lock().observe_viewport(raw);
        self.schedule(plan);
        commands
    }

    pub fn on_tile_error(&self, zoom: u8) -> Option<SurfaceCommand> {
        self.core.lock().zoom_correction(zoom)
    }

    /// Supplies the session's event list. May be called again later to
    /// append more events.
    pub fn supply_events(&self, batch: EntityBatch) -> Vec<SurfaceCommand> {
        self.core.lock().ingest_events(batch)
    }

    pub fn set_user_location(&self, location: Option<LatLng>) -> Vec<SurfaceCommand> {
        self.core.lock().set_user_location(location)
    }

    /// Resolves a clicked marker id back to its entity.
    pub fn on_marker_clicked(&self, id: &str) -> Option<SpatialEntity> {
        self.core.lock().marker_entity(id)
    }

    /// Stall lookup for a selected event. Outside the reconciliation loop,
    /// so neither debounced nor sequence-gated.
    pub async fn stalls_for_event(&self, event_id: &str) -> Result<Vec<Stall>, QueryError> {
        let response = self.service.event_stalls(event_id).await?;
        Ok(response.into_stalls())
    }

    /// Cancels any pending fetch timer and detaches the engine's markers.
    /// An in-flight fetch that lands afterwards is dropped by the sequence
    /// gate like any other stale response.
    pub fn shutdown(&mut self) {
        self.debouncer.cancel();
        let mut core = self.core.lock();
        // Invalidate whatever is still in flight.
        let _ = core.seq.issue();
        core.loading = false;
        core.shutdown();
    }

    pub fn stats(&self) -> EngineStats {
        self.core.lock().stats()
    }

    fn schedule(&mut self, plan: FetchPlan) {
        let core = Arc::clone(&self.core);
        let service = Arc::clone(&self.service);
        let limit = self.config.point_query_limit;
        self.debouncer.arm(async move {
            // Hold the lock only long enough to stamp the ticket.
            let (ticket, user_location) = {
                let mut core = core.lock();
                (core.begin_fetch(plan), core.state().user_marker())
            };

            let result = match plan.mode {
                QueryMode::Cluster => service
                    .cluster_query(plan.center, plan.radius_km)
                    .await
                    .map(|resp| resp.into_batch()),
                QueryMode::Point => service
                    .point_query(user_location, plan.center, plan.radius_km, limit)
                    .await
                    .map(|resp| resp.into_batch()),
            };

            let mut core = core.lock();
            match result {
                Ok(batch) => core.apply_batch(&ticket, batch),
                Err(err) => core.fetch_failed(&ticket, &err),
            }
        });
    }
}
