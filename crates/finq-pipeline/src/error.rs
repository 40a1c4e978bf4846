use finq_core::{Error, SourceKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why one source produced no analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{kind} fetch failed: {error}")]
    Fetch {
        kind: SourceKind,
        #[source]
        error: Error,
    },

    #[error("{kind} returned no results")]
    NoResults { kind: SourceKind },

    #[error("{kind} analysis failed: {error}")]
    Service {
        kind: SourceKind,
        #[source]
        error: Error,
    },
}

impl AnalysisError {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            AnalysisError::Fetch { kind, .. }
            | AnalysisError::NoResults { kind }
            | AnalysisError::Service { kind, .. } => *kind,
        }
    }

    /// Short reason suitable for a "not available" placeholder.
    pub fn reason(&self) -> String {
        match self {
            AnalysisError::Fetch { error, .. } => format!("search failed: {}", error),
            AnalysisError::NoResults { .. } => "the source found no results".to_string(),
            AnalysisError::Service { error, .. } => format!("analysis failed: {}", error),
        }
    }

    pub fn to_failure(&self) -> SourceFailure {
        SourceFailure {
            source: self.source_kind(),
            reason: self.reason(),
        }
    }
}

/// A source that did not contribute to the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub reason: String,
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Terminal failure of a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("insufficient evidence: no source analysis succeeded ({})", join_failures(.failures))]
    InsufficientEvidence { failures: Vec<SourceFailure> },

    #[error("synthesis failed: {0}")]
    Synthesis(#[source] Error),

    #[error("pipeline cancelled")]
    Cancelled,
}

fn join_failures(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
