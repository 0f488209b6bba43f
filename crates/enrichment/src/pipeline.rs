use std::sync::Arc;

use clustering::ClusterKey;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::request::Request;
use crate::summarizer::{SummarizeError, Summarizer};

/// Outcome of one summarization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub request: Request,
    pub key: ClusterKey,
    pub result: Result<String, SummarizeError>,
}

/// Runs summarization requests off the recompute path.
///
/// Each dispatched request is spawned on the current tokio runtime and
/// reports exactly one [`Completion`] back through an unbounded channel.
/// There is no cancellation: every request resolves.
pub struct Enricher {
    summarizer: Arc<dyn Summarizer>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher")
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Enricher {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            summarizer,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Starts summarizing `texts` for `key`.
    ///
    /// Outside a tokio runtime the request fails immediately with a
    /// transport error instead of panicking.
    pub fn dispatch(&mut self, request: Request, key: ClusterKey, texts: Vec<String>) {
        self.in_flight += 1;
        let tx = self.tx.clone();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%key, %request, "no async runtime for enrichment: {err}");
                let _ = tx.send(Completion {
                    request,
                    key,
                    result: Err(SummarizeError::Transport("no async runtime".to_string())),
                });
                return;
            }
        };

        info!(%key, %request, members = texts.len(), "dispatching summary request");
        let summarizer = Arc::clone(&self.summarizer);
        handle.spawn(async move {
            let result = summarizer.summarize(&texts).await;
            if let Err(err) = &result {
                warn!(%key, %request, "summarization failed: {err}");
            }
            // The receiver lives as long as the Enricher; a send error only
            // means the engine is gone.
            let _ = tx.send(Completion {
                request,
                key,
                result,
            });
        });
    }

    /// Everything that finished since the last call, without waiting.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Ok(c) = self.rx.try_recv() {
            out.push(c);
        }
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }

    /// Waits for the next completion; `None` when nothing is in flight.
    pub async fn next(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        let c = self.rx.recv().await?;
        self.in_flight -= 1;
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::Enricher;
    use crate::request::Request;
    use crate::summarizer::{ExtractiveSummarizer, SummarizeError, Summarizer};
    use async_trait::async_trait;
    use clustering::ClusterKey;
    use std::sync::Arc;

    struct AlwaysFails;

    #[async_trait]
    impl Summarizer for AlwaysFails {
        async fn summarize(&self, _texts: &[String]) -> Result<String, SummarizeError> {
            Err(SummarizeError::Status(500))
        }
    }

    fn key(n: u32) -> ClusterKey {
        ClusterKey {
            lat_e: 0,
            lng_e: 0,
            member_count: n,
            precision: 4,
        }
    }

    #[tokio::test]
    async fn every_dispatch_resolves_once() {
        let mut e = Enricher::new(Arc::new(ExtractiveSummarizer::default()));
        e.dispatch(Request(1), key(2), vec!["a.".into(), "b.".into()]);
        e.dispatch(Request(2), key(3), vec!["c".into()]);
        assert_eq!(e.in_flight(), 2);

        let mut got = Vec::new();
        while let Some(c) = e.next().await {
            got.push(c);
        }
        got.sort_by_key(|c| c.request);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].result.as_deref(), Ok("a. / b."));
        assert_eq!(got[1].key, key(3));
        assert_eq!(e.in_flight(), 0);
        assert!(e.drain().is_empty());
    }

    #[tokio::test]
    async fn failures_are_reported_not_dropped() {
        let mut e = Enricher::new(Arc::new(AlwaysFails));
        e.dispatch(Request(7), key(2), vec!["x".into()]);
        let c = e.next().await.unwrap();
        assert_eq!(c.request, Request(7));
        assert_eq!(c.result, Err(SummarizeError::Status(500)));
    }

    #[test]
    fn dispatch_without_runtime_fails_fast() {
        let mut e = Enricher::new(Arc::new(ExtractiveSummarizer::default()));
        e.dispatch(Request(1), key(2), vec!["a".into()]);
        let done = e.drain();
        assert_eq!(done.len(), 1);
        assert!(matches!(done[0].result, Err(SummarizeError::Transport(_))));
        assert_eq!(e.in_flight(), 0);
    }
}
