//! Builds the reasoning provider and search collaborators from config.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use finq_core::{Error, Question, SearchSource};
use finq_providers::OpenAIProvider;
use finq_sources::{BingSearch, GoogleSearch, RedditClient};

use crate::config::Config;

/// Stand-in for a search source without credentials. Every search fails with
/// a config error, so the pipeline reports the source as unavailable.
pub struct Unconfigured {
    name: &'static str,
    missing: &'static str,
}

impl Unconfigured {
    pub fn new(name: &'static str, missing: &'static str) -> Self {
        Self { name, missing }
    }
}

#[async_trait]
impl SearchSource for Unconfigured {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, _question: &Question) -> Result<String, Error> {
        Err(Error::config(format!("{} not configured (set {})", self.name, self.missing)))
    }
}

pub fn provider(config: &Config) -> Result<OpenAIProvider> {
    let api_key = config
        .provider
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .context(
            "No API key for the reasoning service. Set [provider] api_key in \
             ~/.config/finq/config.toml, FINQ_PROVIDER__API_KEY or OPENAI_API_KEY",
        )?;

    let mut provider = OpenAIProvider::new(api_key)
        .with_timeout(Duration::from_secs(config.pipeline.call_timeout_secs));
    if let Some(base_url) = &config.provider.base_url {
        provider = provider.with_base_url(base_url);
    }
    if let Some(model) = &config.provider.model {
        provider = provider.with_default_model(model);
    }
    Ok(provider)
}

pub fn google(config: &Config) -> Arc<dyn SearchSource> {
    let section = &config.google;
    match (&section.api_key, &section.engine_id) {
        (Some(key), Some(engine_id)) => {
            let mut google = GoogleSearch::new(key, engine_id)
                .with_timeout(Duration::from_secs(config.pipeline.fetch_timeout_secs));
            if let Some(limit) = section.limit {
                google = google.with_limit(limit);
            }
            Arc::new(google)
        }
        _ => {
            warn!("Google search is not configured");
            Arc::new(Unconfigured::new("google", "[google] api_key and engine_id"))
        }
    }
}

pub fn bing(config: &Config) -> Arc<dyn SearchSource> {
    let section = &config.bing;
    let Some(key) = &section.api_key else {
        warn!("Bing search is not configured");
        return Arc::new(Unconfigured::new("bing", "[bing] api_key"));
    };

    let mut bing =
        BingSearch::new(key).with_timeout(Duration::from_secs(config.pipeline.fetch_timeout_secs));
    if let Some(endpoint) = &section.endpoint {
        bing = bing.with_endpoint(endpoint);
    }
    if let Some(limit) = section.limit {
        bing = bing.with_limit(limit);
    }
    Arc::new(bing)
}

pub fn reddit(config: &Config) -> Arc<RedditClient> {
    let section = &config.reddit;
    let mut reddit = RedditClient::new(section.user_agent.as_deref())
        .with_timeout(Duration::from_secs(config.pipeline.fetch_timeout_secs))
        .with_max_comments(config.pipeline.max_comments_per_post);
    if let Some(limit) = section.limit {
        reddit = reddit.with_limit(limit);
    }
    Arc::new(reddit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_source_fails_with_config_error() {
        let source = Unconfigured::new("google", "[google] api_key");
        let err = source.search(&Question::new("q")).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("google not configured"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fall_back_to_unconfigured() {
        let config = Config::default();
        let err = google(&config).search(&Question::new("q")).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = bing(&config).search(&Question::new("q")).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_provider_uses_configured_key() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-test".into());
        config.provider.model = Some("gpt-4o-mini".into());
        assert!(provider(&config).is_ok());
    }

    #[test]
    fn test_provider_without_key_is_an_error() {
        if std::env::var("OPENAI_API_KEY").is_ok() {
            return;
        }
        match provider(&Config::default()) {
            Ok(p) => panic!("expected a missing-key error, got {:?}", p),
            Err(err) => assert!(err.to_string().contains("No API key")),
        }
    }
}
