//! Search collaborator traits.
//!
//! The pipeline consumes these; `finq-sources` provides HTTP implementations
//! and `testing` provides scripted ones.

use async_trait::async_trait;

use crate::error::Error;
use crate::research::{Question, RedditPost};

/// A web search engine returning an opaque text blob for a question.
/// An empty string is a valid "no results" answer.
#[async_trait]
pub trait SearchSource: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, question: &Question) -> Result<String, Error>;
}

/// Reddit discussion search plus thread retrieval.
#[async_trait]
pub trait RedditSource: Send + Sync {
    /// Search listing for the question, rendered as text with thread URLs.
    async fn search(&self, question: &Question) -> Result<String, Error>;

    /// Fetch the given threads. Threads that cannot be read may be skipped.
    async fn fetch_posts(&self, urls: &[String]) -> Result<Vec<RedditPost>, Error>;
}
