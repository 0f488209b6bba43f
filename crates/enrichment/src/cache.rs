use std::collections::BTreeMap;

use clustering::ClusterKey;
use tracing::debug;

use crate::request::Request;
use crate::state::EnrichmentState;
use crate::summarizer::SummarizeError;

const NOT_REQUESTED: &EnrichmentState = &EnrichmentState::NotRequested;

/// Result of selecting a cluster.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A new outbound request must be sent.
    Issued(Request),
    AlreadyLoading,
    AlreadyLoaded,
    PreviouslyFailed,
}

impl Selection {
    pub fn request(self) -> Option<Request> {
        match self {
            Selection::Issued(req) => Some(req),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    UnknownRequest(Request),
}

impl std::fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentError::UnknownRequest(req) => {
                write!(f, "unknown or already completed request {req}")
            }
        }
    }
}

impl std::error::Error for EnrichmentError {}

/// Session-scoped summary cache with request de-duplication.
///
/// Notes:
/// - Entries are keyed in a `BTreeMap` for stable traversal order.
/// - There is no eviction. Keys orphaned by a grouping change stay until the
///   session ends; growth is bounded by the number of distinct clusters seen.
/// - At most one request is ever issued per key.
#[derive(Debug, Default)]
pub struct EnrichmentCache {
    next_request: u64,
    entries: BTreeMap<ClusterKey, EnrichmentState>,
    in_flight: BTreeMap<Request, ClusterKey>,
}

impl EnrichmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Unknown keys report `NotRequested`.
    pub fn state(&self, key: &ClusterKey) -> &EnrichmentState {
        self.entries.get(key).unwrap_or(NOT_REQUESTED)
    }

    pub fn summary(&self, key: &ClusterKey) -> Option<&str> {
        self.entries.get(key).and_then(EnrichmentState::summary)
    }

    /// User selected the cluster with `key`.
    ///
    /// Only `NotRequested` transitions (to `Loading`) and issues a request;
    /// every other state is a no-op.
    pub fn select(&mut self, key: ClusterKey) -> Selection {
        let state = self.entries.entry(key).or_default();
        match state {
            EnrichmentState::Loading => Selection::AlreadyLoading,
            EnrichmentState::Loaded(_) => Selection::AlreadyLoaded,
            EnrichmentState::Failed => Selection::PreviouslyFailed,
            EnrichmentState::NotRequested => {
                *state = EnrichmentState::Loading;
                self.next_request += 1;
                let req = Request(self.next_request);
                self.in_flight.insert(req, key);
                debug!(%key, %req, "enrichment requested");
                Selection::Issued(req)
            }
        }
    }

    /// Records the collaborator's answer for `req`.
    ///
    /// Blank summaries count as failures. Returns the key the request
    /// belonged to.
    pub fn complete(
        &mut self,
        req: Request,
        result: Result<String, SummarizeError>,
    ) -> Result<ClusterKey, EnrichmentError> {
        let key = self
            .in_flight
            .remove(&req)
            .ok_or(EnrichmentError::UnknownRequest(req))?;

        let next = match result {
            Ok(summary) if !summary.trim().is_empty() => {
                EnrichmentState::Loaded(summary.trim().to_string())
            }
            _ => EnrichmentState::Failed,
        };
        self.entries.insert(key, next);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::{EnrichmentCache, EnrichmentError, Selection};
    use crate::request::Request;
    use crate::state::EnrichmentState;
    use crate::summarizer::SummarizeError;
    use clustering::ClusterKey;
    use pretty_assertions::assert_eq;

    fn key_at(lat_e: i64, member_count: u32) -> ClusterKey {
        ClusterKey {
            lat_e,
            lng_e: 0,
            member_count,
            precision: 4,
        }
    }

    fn key() -> ClusterKey {
        key_at(407_050, 2)
    }

    #[test]
    fn unknown_keys_are_not_requested() {
        let cache = EnrichmentCache::new();
        assert_eq!(cache.state(&key()), &EnrichmentState::NotRequested);
        assert!(cache.is_empty());
    }

    #[test]
    fn selecting_twice_issues_one_request() {
        let mut cache = EnrichmentCache::new();
        let first = cache.select(key());
        assert!(matches!(first, Selection::Issued(_)));
        assert_eq!(cache.select(key()), Selection::AlreadyLoading);
        assert_eq!(cache.in_flight(), 1);
        assert_eq!(cache.state(&key()), &EnrichmentState::Loading);
    }

    #[test]
    fn success_is_terminal() {
        let mut cache = EnrichmentCache::new();
        let req = cache.select(key()).request().unwrap();
        assert_eq!(cache.complete(req, Ok("  lunch spots ".into())), Ok(key()));
        assert_eq!(cache.summary(&key()), Some("lunch spots"));
        assert_eq!(cache.select(key()), Selection::AlreadyLoaded);
        assert_eq!(cache.in_flight(), 0);
    }

    #[test]
    fn failure_is_terminal() {
        let mut cache = EnrichmentCache::new();
        let req = cache.select(key()).request().unwrap();
        cache.complete(req, Err(SummarizeError::Status(502))).unwrap();
        assert_eq!(cache.state(&key()), &EnrichmentState::Failed);
        assert_eq!(cache.select(key()), Selection::PreviouslyFailed);
        assert_eq!(cache.summary(&key()), None);
    }

    #[test]
    fn blank_summary_counts_as_failure() {
        let mut cache = EnrichmentCache::new();
        let req = cache.select(key()).request().unwrap();
        cache.complete(req, Ok("   ".into())).unwrap();
        assert_eq!(cache.state(&key()), &EnrichmentState::Failed);
    }

    #[test]
    fn independent_keys_do_not_share_state() {
        let mut cache = EnrichmentCache::new();
        let a = key_at(1, 2);
        let b = key_at(1, 3);
        let ra = cache.select(a).request().unwrap();
        let rb = cache.select(b).request().unwrap();
        assert_ne!(ra, rb);
        cache.complete(rb, Ok("b".into())).unwrap();
        assert_eq!(cache.state(&a), &EnrichmentState::Loading);
        assert_eq!(cache.summary(&b), Some("b"));
        cache.complete(ra, Ok("a".into())).unwrap();
        assert_eq!(cache.summary(&a), Some("a"));
    }

    #[test]
    fn completing_twice_or_unknown_is_an_error() {
        let mut cache = EnrichmentCache::new();
        let req = cache.select(key()).request().unwrap();
        cache.complete(req, Ok("x".into())).unwrap();
        assert_eq!(
            cache.complete(req, Ok("y".into())),
            Err(EnrichmentError::UnknownRequest(req))
        );
        assert!(cache.complete(Request(999), Ok("z".into())).is_err());
        assert_eq!(cache.summary(&key()), Some("x"));
    }
}
