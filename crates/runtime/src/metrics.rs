use std::collections::BTreeMap;

/// Engine counters and gauges.
///
/// Variant order is the snapshot order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    SamplesReceived,
    SamplesSuppressed,
    RecomputePasses,
    EnrichmentRequests,
    EnrichmentDeduplicated,
    EnrichmentLoaded,
    EnrichmentFailed,
    EnrichmentDiscarded,
    /// Gauge: clusters in the current snapshot.
    Clusters,
    /// Gauge: singles in the current snapshot.
    Singles,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::SamplesReceived => "viewport.samples_received",
            Metric::SamplesSuppressed => "viewport.samples_suppressed",
            Metric::RecomputePasses => "lod.recompute_passes",
            Metric::EnrichmentRequests => "enrichment.requests",
            Metric::EnrichmentDeduplicated => "enrichment.deduplicated",
            Metric::EnrichmentLoaded => "enrichment.loaded",
            Metric::EnrichmentFailed => "enrichment.failed",
            Metric::EnrichmentDiscarded => "enrichment.discarded",
            Metric::Clusters => "lod.clusters",
            Metric::Singles => "lod.singles",
        }
    }
}

/// Deterministic metrics aggregation.
///
/// Backed by sorted maps so snapshots have stable ordering and never depend on
/// wall-clock time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<Metric, u64>,
    gauges: BTreeMap<Metric, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, metric: Metric) {
        self.add(metric, 1);
    }

    pub fn add(&mut self, metric: Metric, by: u64) {
        *self.counters.entry(metric).or_insert(0) += by;
    }

    pub fn counter(&self, metric: Metric) -> u64 {
        self.counters.get(&metric).copied().unwrap_or(0)
    }

    pub fn set_gauge(&mut self, metric: Metric, value: u64) {
        self.gauges.insert(metric, value);
    }

    pub fn gauge(&self, metric: Metric) -> Option<u64> {
        self.gauges.get(&metric).copied()
    }

    /// Stable `(name, value)` pairs, counters first, for logs and JSON output.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counters
            .iter()
            .chain(self.gauges.iter())
            .map(|(m, v)| (m.name(), *v))
            .collect()
    }
}
