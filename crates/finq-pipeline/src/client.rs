//! Bounded, timed calls to external collaborators.

use std::future::Future;
use std::sync::Arc;

use finq_core::{CompletionRequest, CompletionResponse, Error, FinishReason, MessagePair, Provider};
use finq_prompts::TaskKind;
use tracing::{debug, warn};

use crate::config::{CallPolicy, PipelineConfig};

/// Run `call` under `policy`: each attempt is timed out, and retryable
/// failures are attempted again up to `policy.max_retries` times.
pub async fn with_retry<T, F, Fut>(
    policy: &CallPolicy,
    what: &str,
    mut call: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "{} did not finish within {:?}",
                what, policy.timeout
            ))),
        };

        match result {
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(call = what, attempt, error = %e, "Retrying after transient failure");
                tokio::time::sleep(policy.retry_delay).await;
            }
            other => return other,
        }
    }
}

/// The reasoning-service client shared by every analyzer and the synthesizer.
#[derive(Clone)]
pub struct ReasoningClient {
    provider: Arc<dyn Provider>,
    policy: CallPolicy,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ReasoningClient {
    pub fn new(provider: Arc<dyn Provider>, config: &PipelineConfig) -> Self {
        Self {
            provider,
            policy: config.reasoning_policy(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn build_request(&self, pair: MessagePair) -> CompletionRequest {
        let mut request = CompletionRequest::from_pair(pair);
        if let Some(model) = &self.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    /// Submit one task's message pair and return the validated response.
    ///
    /// A content-filtered finish is reported as `Refused`, an empty reply as
    /// `MalformedOutput`.
    pub async fn complete(
        &self,
        task: TaskKind,
        pair: MessagePair,
    ) -> Result<CompletionResponse, Error> {
        let request = self.build_request(pair);
        debug!(
            task = %task,
            provider = self.provider.name(),
            content_chars = request.content().map(str::len).unwrap_or(0),
            "Submitting reasoning request"
        );

        let what = task.to_string();
        let response = with_retry(&self.policy, &what, || {
            self.provider.complete(request.clone())
        })
        .await?;

        if response.finish_reason == FinishReason::ContentFilter {
            return Err(Error::refused(format!("{} output was filtered", task)));
        }
        if response.text.trim().is_empty() {
            return Err(Error::malformed_output(format!("{} returned empty text", task)));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use finq_core::testing::MockProvider;

    fn policy(max_retries: u32) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_millis(200),
            max_retries,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_one_transient_failure() {
        let calls = AtomicUsize::new(0);
        let result = with_retry(&policy(1), "google-fetch", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Error::network("reset"))
                } else {
                    Ok("results")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "results");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), Error> = with_retry(&policy(1), "bing-fetch", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::rate_limit("429")) }
        })
        .await;
        assert!(matches!(result, Err(Error::RateLimit(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), Error> = with_retry(&policy(3), "synthesis", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::auth("bad key")) }
        })
        .await;
        assert!(matches!(result, Err(Error::Auth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_times_out() {
        let result: Result<(), Error> = with_retry(&policy(0), "slow", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_client_rejects_empty_reply() {
        let provider = Arc::new(MockProvider::new());
        provider.respond("Google", "   ");
        let client = ReasoningClient::new(provider, &PipelineConfig::default());

        let pair = finq_prompts::google_analysis_messages(&"q".into(), "results");
        let err = client.complete(TaskKind::GoogleAnalysis, pair).await.unwrap_err();
        assert!(matches!(err, Error::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_client_applies_request_options() {
        let provider = Arc::new(MockProvider::new());
        provider.respond("Bing", "news insight");
        let config = PipelineConfig {
            model: Some("gpt-4o-mini".into()),
            temperature: Some(0.1),
            ..Default::default()
        };
        let client = ReasoningClient::new(provider.clone(), &config);

        let pair = finq_prompts::bing_analysis_messages(&"q".into(), "results");
        let response = client.complete(TaskKind::BingAnalysis, pair).await.unwrap();
        assert_eq!(response.text, "news insight");

        let request = provider.last_request().unwrap();
        assert_eq!(request.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.messages.len(), 2);
    }
}
