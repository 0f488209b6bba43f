/// Per-cluster summary lifecycle.
///
/// ```text
/// NotRequested --select--> Loading --ok--> Loaded(summary)
///                                  \--err--> Failed
/// ```
/// `Loaded` and `Failed` are terminal for as long as the key recurs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnrichmentState {
    #[default]
    NotRequested,
    Loading,
    Loaded(String),
    Failed,
}

impl EnrichmentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrichmentState::Loaded(_) | EnrichmentState::Failed)
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            EnrichmentState::Loaded(s) => Some(s.as_str()),
            _ => None,
        }
    }
}
