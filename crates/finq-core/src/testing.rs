//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;
use crate::message::Usage;
use crate::provider::{CompletionRequest, CompletionResponse, FinishReason, Provider};
use crate::research::{Question, RedditPost};
use crate::source::{RedditSource, SearchSource};

type Handler = Arc<dyn Fn(&CompletionRequest) -> Result<String, Error> + Send + Sync>;

struct Rule {
    needle: String,
    delay: Option<Duration>,
    handler: Handler,
}

/// A mock reasoning service that routes requests by instruction text.
///
/// Analyzers run concurrently, so responses are keyed on a substring of the
/// system instruction rather than returned in FIFO order. The first matching
/// rule wins.
pub struct MockProvider {
    rules: Mutex<Vec<Rule>>,
    /// Captured requests (for assertion).
    pub captured_requests: Mutex<Vec<CompletionRequest>>,
    pub name: String,
    pub default_model: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            captured_requests: Mutex::new(Vec::new()),
            name: "mock".to_string(),
            default_model: None,
        }
    }

    /// Reply with fixed text when the instruction contains `needle`.
    pub fn respond(&self, needle: &str, text: &str) {
        let text = text.to_string();
        self.respond_with(needle, move |_| Ok(text.clone()));
    }

    /// Reply through a closure when the instruction contains `needle`.
    pub fn respond_with<F>(&self, needle: &str, handler: F)
    where
        F: Fn(&CompletionRequest) -> Result<String, Error> + Send + Sync + 'static,
    {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_string(),
            delay: None,
            handler: Arc::new(handler),
        });
    }

    /// Reply with fixed text after `delay` when the instruction contains `needle`.
    pub fn respond_after(&self, needle: &str, delay: Duration, text: &str) {
        let text = text.to_string();
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_string(),
            delay: Some(delay),
            handler: Arc::new(move |_| Ok(text.clone())),
        });
    }

    /// Fail every request whose instruction contains `needle`.
    pub fn fail_with<F>(&self, needle: &str, error: F)
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.respond_with(needle, move |_| Err(error()));
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    /// Number of captured requests whose instruction contains `needle`.
    pub fn requests_matching(&self, needle: &str) -> usize {
        self.captured_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.instruction().is_some_and(|i| i.contains(needle)))
            .count()
    }

    /// Get the last captured request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        self.captured_requests.lock().unwrap().push(request.clone());

        let instruction = request.instruction().unwrap_or_default();
        // Handlers run outside the lock so concurrent callers never serialize.
        let rule = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| instruction.contains(&r.needle))
            .map(|r| (r.delay, r.handler.clone()));
        let (delay, result) = match rule {
            Some((delay, handler)) => (delay, handler(&request)),
            None => (
                None,
                Err(Error::Unknown("No mock response for request".to_string())),
            ),
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        result.map(|text| CompletionResponse {
            usage: Usage::new(10, text.len() as u32),
            text,
            model: "mock-model".to_string(),
            finish_reason: FinishReason::Stop,
        })
    }
}

enum Script<T> {
    Reply(T),
    Fail(Box<dyn Fn() -> Error + Send + Sync>),
}

impl<T: Clone> Script<T> {
    fn run(&self) -> Result<T, Error> {
        match self {
            Script::Reply(value) => Ok(value.clone()),
            Script::Fail(error) => Err(error()),
        }
    }
}

/// A scripted web search collaborator.
pub struct MockSearch {
    name: String,
    script: Script<String>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSearch {
    pub fn returning(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Script::Reply(text.to_string()),
            latency: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing<F>(name: &str, error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            script: Script::Fail(Box::new(error)),
            latency: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchSource for MockSearch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _question: &Question) -> Result<String, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.script.run()
    }
}

/// A scripted Reddit collaborator.
pub struct MockReddit {
    listing: Script<String>,
    posts: Script<Vec<RedditPost>>,
    latency: Option<Duration>,
    /// URL batches passed to fetch_posts (for assertion).
    pub fetched_urls: Mutex<Vec<Vec<String>>>,
}

impl MockReddit {
    pub fn new(listing: &str, posts: Vec<RedditPost>) -> Self {
        Self {
            listing: Script::Reply(listing.to_string()),
            posts: Script::Reply(posts),
            latency: None,
            fetched_urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_search<F>(error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        Self {
            listing: Script::Fail(Box::new(error)),
            posts: Script::Reply(Vec::new()),
            latency: None,
            fetched_urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_posts<F>(mut self, error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.posts = Script::Fail(Box::new(error));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The most recent URL batch passed to fetch_posts.
    pub fn last_fetch(&self) -> Option<Vec<String>> {
        self.fetched_urls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RedditSource for MockReddit {
    async fn search(&self, _question: &Question) -> Result<String, Error> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.listing.run()
    }

    async fn fetch_posts(&self, urls: &[String]) -> Result<Vec<RedditPost>, Error> {
        self.fetched_urls.lock().unwrap().push(urls.to_vec());
        self.posts.run()
    }
}
