//! Synthesis of the per-source analyses into one answer.

use finq_core::{AnalysisResult, Question, SourceKind, Usage};
use finq_prompts::{compose, Slot, TaskInput, TaskKind};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::ReasoningClient;
use crate::error::{AnalysisError, PipelineError, SourceFailure};

/// One synthesis input slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence<'a> {
    Present(&'a AnalysisResult),
    /// Absent, with the reason shown to the reasoning service and the reader.
    Missing(String),
}

impl Default for Evidence<'_> {
    fn default() -> Self {
        Evidence::Missing(String::new())
    }
}

impl<'a> From<Option<&'a AnalysisResult>> for Evidence<'a> {
    fn from(value: Option<&'a AnalysisResult>) -> Self {
        match value {
            Some(result) => Evidence::Present(result),
            None => Evidence::default(),
        }
    }
}

impl<'a> From<&'a Result<AnalysisResult, AnalysisError>> for Evidence<'a> {
    fn from(value: &'a Result<AnalysisResult, AnalysisError>) -> Self {
        match value {
            Ok(result) => Evidence::Present(result),
            Err(e) => Evidence::Missing(e.reason()),
        }
    }
}

impl Evidence<'_> {
    fn slot(&self) -> Slot<'_> {
        match self {
            Evidence::Present(result) => Slot::Present(&result.text),
            Evidence::Missing(reason) => Slot::Missing(reason),
        }
    }
}

/// The three analyses the synthesizer combines.
#[derive(Debug, Clone, Default)]
pub struct SynthesisInput<'a> {
    pub google: Evidence<'a>,
    pub bing: Evidence<'a>,
    pub reddit: Evidence<'a>,
}

impl<'a> SynthesisInput<'a> {
    pub fn new(
        google: Option<&'a AnalysisResult>,
        bing: Option<&'a AnalysisResult>,
        reddit: Option<&'a AnalysisResult>,
    ) -> Self {
        Self {
            google: google.into(),
            bing: bing.into(),
            reddit: reddit.into(),
        }
    }

    /// Build from analyzer outcomes, carrying each failure's reason.
    pub fn from_outcomes(
        google: &'a Result<AnalysisResult, AnalysisError>,
        bing: &'a Result<AnalysisResult, AnalysisError>,
        reddit: &'a Result<AnalysisResult, AnalysisError>,
    ) -> Self {
        Self {
            google: google.into(),
            bing: bing.into(),
            reddit: reddit.into(),
        }
    }

    fn slots(&self) -> [(SourceKind, &Evidence<'a>); 3] {
        [
            (SourceKind::Google, &self.google),
            (SourceKind::Bing, &self.bing),
            (SourceKind::RedditContent, &self.reddit),
        ]
    }

    pub fn contributed(&self) -> Vec<SourceKind> {
        self.slots()
            .into_iter()
            .filter(|(_, e)| matches!(e, Evidence::Present(_)))
            .map(|(kind, _)| kind)
            .collect()
    }

    pub fn unavailable(&self) -> Vec<SourceFailure> {
        self.slots()
            .into_iter()
            .filter_map(|(kind, e)| match e {
                Evidence::Missing(reason) => Some(SourceFailure {
                    source: kind,
                    reason: if reason.is_empty() {
                        "not available".to_string()
                    } else {
                        reason.clone()
                    },
                }),
                Evidence::Present(_) => None,
            })
            .collect()
    }

    fn usage(&self) -> Usage {
        self.slots()
            .into_iter()
            .filter_map(|(_, e)| match e {
                Evidence::Present(result) => Some(result.usage),
                Evidence::Missing(_) => None,
            })
            .sum()
    }

    fn task_input(&self) -> TaskInput<'_> {
        TaskInput::Synthesis {
            google: self.google.slot(),
            bing: self.bing.slot(),
            reddit: self.reddit.slot(),
        }
    }
}

/// The terminal artifact of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub question: String,
    pub text: String,
    pub contributed: Vec<SourceKind>,
    pub unavailable: Vec<SourceFailure>,
    /// Usage of the analyses that contributed plus the synthesis call.
    pub usage: Usage,
}

impl FinalAnswer {
    /// Provenance footer naming the sources used and the ones missing.
    pub fn sources_footer(&self) -> String {
        let mut out = String::from("Sources:");
        for kind in &self.contributed {
            out.push_str(&format!("\n- {} ({}): used", kind.label(), kind.provenance()));
        }
        for failure in &self.unavailable {
            out.push_str(&format!(
                "\n- {} ({}): unavailable, {}",
                failure.source.label(),
                failure.source.provenance(),
                failure.reason
            ));
        }
        out
    }
}

impl std::fmt::Display for FinalAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n\n---\n{}", self.text.trim_end(), self.sources_footer())
    }
}

#[derive(Clone)]
pub struct Synthesizer {
    client: ReasoningClient,
}

impl Synthesizer {
    pub fn new(client: ReasoningClient) -> Self {
        Self { client }
    }

    /// Combine whichever analyses are present into a `FinalAnswer`.
    ///
    /// Fails with `InsufficientEvidence`, without calling the reasoning
    /// service, when all three are missing.
    pub async fn synthesize(
        &self,
        question: &Question,
        input: &SynthesisInput<'_>,
    ) -> Result<FinalAnswer, PipelineError> {
        let contributed = input.contributed();
        let unavailable = input.unavailable();

        if contributed.is_empty() {
            warn!("No analyses available, refusing to synthesize");
            return Err(PipelineError::InsufficientEvidence {
                failures: unavailable,
            });
        }

        info!(
            contributed = contributed.len(),
            unavailable = unavailable.len(),
            "Synthesizing answer"
        );
        let pair = compose(question, &input.task_input());
        let response = self
            .client
            .complete(TaskKind::Synthesis, pair)
            .await
            .map_err(PipelineError::Synthesis)?;

        Ok(FinalAnswer {
            question: question.to_string(),
            text: response.text,
            contributed,
            unavailable,
            usage: input.usage() + response.usage,
        })
    }
}
