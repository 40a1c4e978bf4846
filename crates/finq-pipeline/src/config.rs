//! Pipeline tuning knobs.

use std::time::Duration;

use finq_prompts::PostFormat;
use serde::{Deserialize, Serialize};

/// Settings for one pipeline instance. Every field has a default, so an
/// empty `[pipeline]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Timeout for a single reasoning-service call.
    pub call_timeout_secs: u64,

    /// Timeout for a single search collaborator call.
    pub fetch_timeout_secs: u64,

    /// Extra attempts after a retryable failure (network, rate limit, timeout).
    pub max_retries: u32,

    /// Pause between attempts.
    pub retry_delay_ms: u64,

    /// Run the Reddit thread triage before the content analysis.
    pub reddit_triage: bool,

    /// Maximum threads fetched for the Reddit content analysis.
    pub max_reddit_posts: usize,

    /// Characters kept from each post body and quoted comment.
    pub post_excerpt_chars: usize,

    /// Quoted comments kept per post.
    pub max_comments_per_post: usize,

    /// Model override (uses the provider default if not set).
    pub model: Option<String>,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 60,
            fetch_timeout_secs: 30,
            max_retries: 1,
            retry_delay_ms: 500,
            reddit_triage: true,
            max_reddit_posts: 5,
            post_excerpt_chars: 400,
            max_comments_per_post: 3,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl PipelineConfig {
    pub fn reasoning_policy(&self) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_secs(self.call_timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn fetch_policy(&self) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn post_format(&self) -> PostFormat {
        PostFormat {
            excerpt_chars: self.post_excerpt_chars,
            max_comments: self.max_comments_per_post,
        }
    }
}

/// Timeout and retry bounds for one kind of external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}
