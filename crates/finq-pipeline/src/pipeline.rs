//! Pipeline orchestration: fan out to the three sources, join, synthesize.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use finq_core::{
    AnalysisResult, Error, Provider, Question, RedditSource, SearchSource, SourceKind, Usage,
};
use serde::Serialize;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{info, info_span, warn, Instrument, Span};

use crate::analyzer::Analyzer;
use crate::client::{with_retry, ReasoningClient};
use crate::config::{CallPolicy, PipelineConfig};
use crate::error::{AnalysisError, PipelineError};
use crate::reddit::select_threads;
use crate::synthesizer::{FinalAnswer, SynthesisInput, Synthesizer};

/// What happened to one source during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Analyzed { chars: usize, usage: Usage },
    Failed { reason: String },
    NotRun,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: SourceKind,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl SourceOutcome {
    fn from_result(
        source: SourceKind,
        result: Option<&Result<AnalysisResult, AnalysisError>>,
    ) -> Self {
        let status = match result {
            Some(Ok(analysis)) => OutcomeStatus::Analyzed {
                chars: analysis.text.len(),
                usage: analysis.usage,
            },
            Some(Err(e)) => OutcomeStatus::Failed { reason: e.reason() },
            None => OutcomeStatus::NotRun,
        };
        Self { source, status }
    }
}

/// A finished run: the answer plus every per-source outcome.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub answer: FinalAnswer,
    pub outcomes: Vec<SourceOutcome>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Token usage across every reasoning call of the run.
    pub fn total_usage(&self) -> Usage {
        let triage = self
            .outcomes
            .iter()
            .filter(|o| o.source == SourceKind::RedditUrl)
            .filter_map(|o| match o.status {
                OutcomeStatus::Analyzed { usage, .. } => Some(usage),
                _ => None,
            })
            .sum::<Usage>();
        self.answer.usage + triage
    }
}

struct RedditOutcome {
    triage: Option<Result<AnalysisResult, AnalysisError>>,
    content: Result<AnalysisResult, AnalysisError>,
}

/// Per-source work, shared with the spawned track tasks.
struct Tracks {
    google: Arc<dyn SearchSource>,
    bing: Arc<dyn SearchSource>,
    reddit: Arc<dyn RedditSource>,
    analyzer: Analyzer,
    fetch_policy: CallPolicy,
    config: PipelineConfig,
}

/// The research pipeline. Cheap to share behind an `Arc`; holds no per-run state.
pub struct Pipeline {
    tracks: Arc<Tracks>,
    synthesizer: Synthesizer,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn Provider>,
        google: Arc<dyn SearchSource>,
        bing: Arc<dyn SearchSource>,
        reddit: Arc<dyn RedditSource>,
        config: PipelineConfig,
    ) -> Self {
        let client = ReasoningClient::new(provider, &config);
        let tracks = Tracks {
            google,
            bing,
            reddit,
            analyzer: Analyzer::new(client.clone(), config.post_format()),
            fetch_policy: config.fetch_policy(),
            config,
        };
        Self {
            tracks: Arc::new(tracks),
            synthesizer: Synthesizer::new(client),
        }
    }

    /// Answer a question, returning only the final answer.
    pub async fn answer_question(
        &self,
        question: impl Into<Question>,
    ) -> Result<FinalAnswer, PipelineError> {
        self.run(question).await.map(|report| report.answer)
    }

    /// Answer a question unless `cancel` fires first.
    ///
    /// On cancellation every in-flight call is dropped and no synthesis call
    /// is issued.
    pub async fn answer_with_cancel(
        &self,
        question: impl Into<Question>,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Pipeline cancelled");
                Err(PipelineError::Cancelled)
            }
            report = self.run(question) => report,
        }
    }

    /// Run all sources as parallel tasks, wait for every one of them, then
    /// synthesize.
    pub async fn run(
        &self,
        question: impl Into<Question>,
    ) -> Result<PipelineReport, PipelineError> {
        let question = question.into();
        let span = info_span!("answer_question", question = %question);
        self.run_question(&question).instrument(span).await
    }

    async fn run_question(&self, question: &Question) -> Result<PipelineReport, PipelineError> {
        let started_at = Utc::now();
        let started = Instant::now();

        // Dropping a handle aborts its task, so cancelling the run cancels
        // every track.
        let google = {
            let (tracks, question) = (self.tracks.clone(), question.clone());
            spawn_track(
                info_span!("analyze", source = %SourceKind::Google),
                async move { tracks.google_track(&question).await },
            )
        };
        let bing = {
            let (tracks, question) = (self.tracks.clone(), question.clone());
            spawn_track(
                info_span!("analyze", source = %SourceKind::Bing),
                async move { tracks.bing_track(&question).await },
            )
        };
        let reddit = {
            let (tracks, question) = (self.tracks.clone(), question.clone());
            spawn_track(
                info_span!("analyze", source = "reddit"),
                async move { tracks.reddit_track(&question).await },
            )
        };

        let (google, bing, reddit) = tokio::join!(google, bing, reddit);
        let google = google.unwrap_or_else(|e| Err(track_failed(SourceKind::Google, e)));
        let bing = bing.unwrap_or_else(|e| Err(track_failed(SourceKind::Bing, e)));
        let reddit = reddit.unwrap_or_else(|e| RedditOutcome {
            triage: None,
            content: Err(track_failed(SourceKind::RedditContent, e)),
        });
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "All sources finished"
        );

        let input = SynthesisInput::from_outcomes(&google, &bing, &reddit.content);
        let answer = self.synthesizer.synthesize(question, &input).await?;

        let outcomes = vec![
            SourceOutcome::from_result(SourceKind::Google, Some(&google)),
            SourceOutcome::from_result(SourceKind::Bing, Some(&bing)),
            SourceOutcome::from_result(SourceKind::RedditUrl, reddit.triage.as_ref()),
            SourceOutcome::from_result(SourceKind::RedditContent, Some(&reddit.content)),
        ];
        let elapsed = started.elapsed();
        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            contributed = answer.contributed.len(),
            "Pipeline complete"
        );

        Ok(PipelineReport {
            answer,
            outcomes,
            started_at,
            elapsed,
        })
    }
}

fn spawn_track<T, F>(span: Span, track: F) -> AbortOnDropHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    AbortOnDropHandle::new(tokio::spawn(track.instrument(span)))
}

/// A track task that panicked or was aborted counts as a failed analysis.
fn track_failed(kind: SourceKind, err: JoinError) -> AnalysisError {
    warn!(source = %kind, error = %err, "Source task ended abnormally");
    AnalysisError::Service {
        kind,
        error: Error::Unknown(format!("{} task failed: {}", kind, err)),
    }
}

impl Tracks {
    async fn fetch<T, F, Fut>(
        &self,
        kind: SourceKind,
        what: &str,
        call: F,
    ) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        with_retry(&self.fetch_policy, what, call)
            .await
            .map_err(|error| {
                warn!(source = %kind, error = %error, "Fetch failed");
                AnalysisError::Fetch { kind, error }
            })
    }

    async fn google_track(&self, question: &Question) -> Result<AnalysisResult, AnalysisError> {
        let raw = self
            .fetch(SourceKind::Google, "google-search", || self.google.search(question))
            .await?;
        self.analyzer.google(question, &raw).await
    }

    async fn bing_track(&self, question: &Question) -> Result<AnalysisResult, AnalysisError> {
        let raw = self
            .fetch(SourceKind::Bing, "bing-search", || self.bing.search(question))
            .await?;
        self.analyzer.bing(question, &raw).await
    }

    /// Listing, optional triage, thread fetch, content analysis.
    ///
    /// A failed thread fetch degrades the content analysis to the listing
    /// alone; only a failed listing fails the Reddit track.
    async fn reddit_track(&self, question: &Question) -> RedditOutcome {
        let listing = match self
            .fetch(SourceKind::RedditContent, "reddit-search", || {
                self.reddit.search(question)
            })
            .await
        {
            Ok(listing) => listing,
            Err(e) => {
                return RedditOutcome {
                    triage: None,
                    content: Err(e),
                }
            }
        };

        let triage = if self.config.reddit_triage {
            Some(self.analyzer.reddit_urls(question, &listing).await)
        } else {
            None
        };

        let ranked = triage.as_ref().and_then(|t| t.as_ref().ok());
        let urls = select_threads(ranked, &listing, self.config.max_reddit_posts);
        let posts = if urls.is_empty() {
            Vec::new()
        } else {
            match self
                .fetch(SourceKind::RedditContent, "reddit-posts", || {
                    self.reddit.fetch_posts(&urls)
                })
                .await
            {
                Ok(posts) => {
                    info!(
                        requested = urls.len(),
                        fetched = posts.len(),
                        "Fetched Reddit threads"
                    );
                    posts
                }
                Err(e) => {
                    warn!(error = %e, "Continuing Reddit analysis without thread details");
                    Vec::new()
                }
            }
        };

        RedditOutcome {
            triage,
            content: self.analyzer.reddit_content(question, &listing, &posts).await,
        }
    }
}
