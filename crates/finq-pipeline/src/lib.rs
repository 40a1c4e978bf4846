//! finq-pipeline: the multi-source research pipeline.
//!
//! A question fans out to Google, Bing and Reddit. Each source's raw results
//! are analyzed through its own lens, the runs are joined, and the surviving
//! analyses are synthesized into one answer that names where each claim came
//! from. A source that fails is reported as unavailable; the run fails only
//! when no source produced an analysis.

mod analyzer;
mod client;
mod config;
mod error;
mod pipeline;
mod reddit;
mod synthesizer;

pub use analyzer::Analyzer;
pub use client::{with_retry, ReasoningClient};
pub use config::{CallPolicy, PipelineConfig};
pub use error::{AnalysisError, PipelineError, SourceFailure};
pub use pipeline::{OutcomeStatus, Pipeline, PipelineReport, SourceOutcome};
pub use reddit::{select_threads, thread_urls};
pub use synthesizer::{Evidence, FinalAnswer, SynthesisInput, Synthesizer};
