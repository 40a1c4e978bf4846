//! Source analyzers: one reasoning call per source through that source's lens.

use finq_core::{AnalysisResult, Question, RedditPost, SourceKind};
use finq_prompts::{compose, PostFormat, TaskInput};
use tracing::{info, warn};

use crate::client::ReasoningClient;
use crate::error::AnalysisError;

/// Runs the four analysis tasks against the shared reasoning client.
///
/// An analyzer handed empty raw material reports `NoResults` without calling
/// the reasoning service.
#[derive(Clone)]
pub struct Analyzer {
    client: ReasoningClient,
    post_format: PostFormat,
}

impl Analyzer {
    pub fn new(client: ReasoningClient, post_format: PostFormat) -> Self {
        Self {
            client,
            post_format,
        }
    }

    pub async fn google(
        &self,
        question: &Question,
        google_results: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.run(SourceKind::Google, question, TaskInput::Google { google_results })
            .await
    }

    pub async fn bing(
        &self,
        question: &Question,
        bing_results: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.run(SourceKind::Bing, question, TaskInput::Bing { bing_results })
            .await
    }

    pub async fn reddit_urls(
        &self,
        question: &Question,
        reddit_results: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.run(
            SourceKind::RedditUrl,
            question,
            TaskInput::RedditUrls { reddit_results },
        )
        .await
    }

    pub async fn reddit_content(
        &self,
        question: &Question,
        reddit_results: &str,
        posts: &[RedditPost],
    ) -> Result<AnalysisResult, AnalysisError> {
        self.run(
            SourceKind::RedditContent,
            question,
            TaskInput::RedditContent {
                reddit_results,
                posts,
                format: self.post_format,
            },
        )
        .await
    }

    async fn run(
        &self,
        kind: SourceKind,
        question: &Question,
        input: TaskInput<'_>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let task = input.kind();

        if is_empty(&input) {
            info!(source = %kind, "No raw results, skipping analysis");
            return Err(AnalysisError::NoResults { kind });
        }

        let started = std::time::Instant::now();
        let pair = compose(question, &input);
        match self.client.complete(task, pair).await {
            Ok(response) => {
                info!(
                    source = %kind,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    chars = response.text.len(),
                    "Analysis complete"
                );
                Ok(AnalysisResult::new(kind, response.text).with_usage(response.usage))
            }
            Err(error) => {
                warn!(source = %kind, error = %error, "Analysis failed");
                Err(AnalysisError::Service { kind, error })
            }
        }
    }
}

fn is_empty(input: &TaskInput<'_>) -> bool {
    match input {
        TaskInput::Google { google_results: text }
        | TaskInput::Bing { bing_results: text }
        | TaskInput::RedditUrls {
            reddit_results: text,
        } => text.trim().is_empty(),
        TaskInput::RedditContent {
            reddit_results,
            posts,
            ..
        } => reddit_results.trim().is_empty() && posts.is_empty(),
        TaskInput::Synthesis { .. } => false,
    }
}
