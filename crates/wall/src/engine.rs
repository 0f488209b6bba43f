//! The memory-wall LOD engine.
//!
//! Owns the original point records, the viewport observer, the enrichment
//! cache and the current render snapshot. All mutation goes through
//! `&mut self`, so one logical thread drives recompute; multi-threaded hosts
//! share the engine as a [`SharedWall`].
//!
//! Flow per altitude sample:
//! observer (epsilon filter) → merge distance → clustering over the original
//! records → visuals → labels (cached summaries applied) → new `Arc<Snapshot>`.
//!
//! Selecting a cluster issues at most one summary request per cluster key. A
//! late result is stored in the cache but only shown if its key is still part
//! of the current snapshot.

use std::sync::Arc;

use clustering::{ClusterKey, Lod, PointRecord, Snapshot, WallConfig};
use enrichment::{Completion, Enricher, EnrichmentCache, EnrichmentState, Request, Selection};
use parking_lot::Mutex;
use runtime::{AltitudeSample, Metric, Metrics, SubscriptionId, ViewportObserver};
use tracing::{debug, info, warn};

pub type SharedWall = Arc<Mutex<MemoryWall>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Dispatched(Request),
    AlreadyLoading,
    AlreadyLoaded,
    PreviouslyFailed,
    /// The key is not part of the current snapshot.
    UnknownCluster,
}

#[derive(Debug)]
pub struct MemoryWall {
    lod: Lod,
    points: Vec<PointRecord>,
    observer: ViewportObserver,
    cache: EnrichmentCache,
    enricher: Enricher,
    snapshot: Arc<Snapshot>,
    metrics: Metrics,
    pass: u64,
}

impl MemoryWall {
    pub fn new(config: WallConfig, points: Vec<PointRecord>, enricher: Enricher) -> Self {
        let lod = Lod::new(config);
        let observer = ViewportObserver::new(lod.config().altitude_epsilon);
        Self {
            lod,
            points,
            observer,
            cache: EnrichmentCache::new(),
            enricher,
            snapshot: Arc::new(Snapshot::empty()),
            metrics: Metrics::new(),
            pass: 0,
        }
    }

    pub fn shared(self) -> SharedWall {
        Arc::new(Mutex::new(self))
    }

    pub fn points(&self) -> &[PointRecord] {
        &self.points
    }

    /// The current render snapshot. Each pass replaces it wholesale.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn enrichment_state(&self, key: &ClusterKey) -> &EnrichmentState {
        self.cache.state(key)
    }

    pub fn in_flight(&self) -> usize {
        self.enricher.in_flight()
    }

    pub fn on_altitude_sample(
        &mut self,
        callback: impl FnMut(AltitudeSample) + Send + 'static,
    ) -> SubscriptionId {
        self.observer.on_altitude_sample(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observer.unsubscribe(id)
    }

    /// Replaces the ingestion snapshot and reclusters at the last altitude.
    pub fn set_points(&mut self, points: Vec<PointRecord>) {
        self.points = points;
        if let Some(sample) = self.observer.force() {
            self.recompute(sample.altitude);
        }
    }

    /// Feeds one altitude reading from the renderer.
    ///
    /// Returns `true` if it produced a new snapshot.
    pub fn observe_altitude(&mut self, altitude: f64) -> bool {
        self.metrics.incr(Metric::SamplesReceived);
        match self.observer.sample(altitude) {
            Some(sample) => {
                self.recompute(sample.altitude);
                true
            }
            None => {
                self.metrics.incr(Metric::SamplesSuppressed);
                false
            }
        }
    }

    /// Runs one LOD pass over the original records at `altitude`.
    ///
    /// Only reached through an emitted observer sample, so the snapshot's
    /// altitude is always the observer's last altitude.
    fn recompute(&mut self, altitude: f64) {
        self.pass += 1;
        let cache = &self.cache;
        let snapshot = self
            .lod
            .build_snapshot(self.pass, &self.points, altitude, |key| cache.summary(key));

        self.metrics.incr(Metric::RecomputePasses);
        self.metrics
            .set_gauge(Metric::Clusters, snapshot.cluster_count() as u64);
        self.metrics
            .set_gauge(Metric::Singles, snapshot.single_count() as u64);

        self.snapshot = Arc::new(snapshot);
    }

    /// User clicked the cluster with `key`.
    pub fn select_cluster(&mut self, key: &ClusterKey) -> SelectOutcome {
        let Some(entity) = self.snapshot.find(key) else {
            debug!(%key, "selected cluster is not in the current snapshot");
            return SelectOutcome::UnknownCluster;
        };
        let texts = entity.member_texts().to_vec();

        match self.cache.select(*key) {
            Selection::Issued(req) => {
                self.metrics.incr(Metric::EnrichmentRequests);
                self.enricher.dispatch(req, *key, texts);
                SelectOutcome::Dispatched(req)
            }
            other => {
                self.metrics.incr(Metric::EnrichmentDeduplicated);
                match other {
                    Selection::AlreadyLoaded => SelectOutcome::AlreadyLoaded,
                    Selection::PreviouslyFailed => SelectOutcome::PreviouslyFailed,
                    _ => SelectOutcome::AlreadyLoading,
                }
            }
        }
    }

    /// Applies every completion that has arrived, without waiting.
    ///
    /// Returns the keys whose labels changed in the current snapshot.
    pub fn pump(&mut self) -> Vec<ClusterKey> {
        let done = self.enricher.drain();
        done.into_iter()
            .filter_map(|c| self.apply_completion(c))
            .collect()
    }

    /// Waits for all in-flight requests and applies them.
    pub async fn settle(&mut self) -> Vec<ClusterKey> {
        let mut applied = Vec::new();
        while let Some(c) = self.enricher.next().await {
            applied.extend(self.apply_completion(c));
        }
        applied
    }

    fn apply_completion(&mut self, completion: Completion) -> Option<ClusterKey> {
        let Completion {
            request, result, ..
        } = completion;
        let key = match self.cache.complete(request, result) {
            Ok(key) => key,
            Err(err) => {
                warn!("dropping completion: {err}");
                return None;
            }
        };

        let summary = match self.cache.state(&key) {
            EnrichmentState::Loaded(summary) => summary.clone(),
            _ => {
                self.metrics.incr(Metric::EnrichmentFailed);
                return None;
            }
        };
        self.metrics.incr(Metric::EnrichmentLoaded);

        if !self.snapshot.contains_key(&key) {
            // Grouping changed while the request was in flight. The summary
            // stays cached and reappears if the key recurs.
            self.metrics.incr(Metric::EnrichmentDiscarded);
            warn!(%key, "summary arrived for a cluster no longer displayed");
            return None;
        }

        // Readers holding the old Arc keep their snapshot untouched.
        let snapshot = Arc::make_mut(&mut self.snapshot);
        if let Some(entity) = snapshot.find_mut(&key) {
            entity.augment(&summary);
        }
        info!(%key, "cluster label enriched");
        Some(key)
    }
}
