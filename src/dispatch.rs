//! Query dispatch bookkeeping.
//!
//! Every fetch carries a sequence number from [`SequenceGate`]. The rule is
//! "last dispatched wins": a response is applied only if its sequence is the
//! most recently issued one, so a slow early response can never overwrite a
//! newer viewport's markers. Superseded responses are dropped, never retried.

use std::future::Future;

use thiserror::Error;

use crate::geo::LatLng;
use crate::policy::QueryMode;
use crate::protocol::{ClusterResponse, PointResponse, StallsResponse};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum QueryError {
    /// The backend rejected or failed the request.
    #[error("query service error: {0}")]
    Service(String),
    /// The response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// The spatial backend. Implementations own transport details (HTTP,
/// GraphQL, in-process fakes); the engine only sees these three calls.
pub trait SpatialQueryService: Send + Sync + 'static {
    fn cluster_query(
        &self,
        center: LatLng,
        radius_km: f64,
    ) -> impl Future<Output = Result<ClusterResponse, QueryError>> + Send;

    fn point_query(
        &self,
        user_location: Option<LatLng>,
        center: LatLng,
        radius_km: f64,
        limit: u32,
    ) -> impl Future<Output = Result<PointResponse, QueryError>> + Send;

    fn event_stalls(
        &self,
        event_id: &str,
    ) -> impl Future<Output = Result<StallsResponse, QueryError>> + Send;
}

// ---------------------------------------------------------------------------
// Fetch plan and ticket
// ---------------------------------------------------------------------------

/// Everything a refresh needs to run: where, how far, and in which mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchPlan {
    pub center: LatLng,
    pub radius_km: f64,
    pub mode: QueryMode,
}

/// A dispatched fetch. The sequence decides whether its response still
/// matters by the time it lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub plan: FetchPlan,
}

// ---------------------------------------------------------------------------
// Sequence gate
// ---------------------------------------------------------------------------

/// Monotonic counter; only the most recently issued sequence is current.
#[derive(Debug, Default)]
pub struct SequenceGate {
    issued: u64,
}

impl SequenceGate {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::SequenceGate;

    #[test]
    fn only_latest_sequence_is_current() {
        let mut gate = SequenceGate::default();
        let a = gate.issue();
        let b = gate.issue();
        assert!(!gate.is_current(a));
        assert!(gate.is_current(b));
    }

    #[test]
    fn reissue_supersedes_even_same_plan() {
        let mut gate = SequenceGate::default();
        let a = gate.issue();
        assert!(gate.is_current(a));
        let b = gate.issue();
        assert_ne!(a, b);
        assert!(!gate.is_current(a));
    }
}
