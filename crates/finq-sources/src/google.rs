//! Google Custom Search JSON API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use finq_core::{Error, Question, SearchSource};

use crate::{check_status, http_client, render_hits, transport_error, Hit, USER_AGENT};

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

pub struct GoogleSearch {
    client: Client,
    api_key: String,
    engine_id: String,
    endpoint: String,
    limit: u32,
}

impl GoogleSearch {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client: http_client(USER_AGENT, Duration::from_secs(30)),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: ENDPOINT.to_string(),
            limit: 10,
        }
    }

    /// Results per query (the API caps this at 10).
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, 10);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(USER_AGENT, timeout);
        self
    }
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

fn render(response: &GoogleResponse) -> String {
    render_hits(response.items.iter().map(|item| Hit {
        title: &item.title,
        url: &item.link,
        snippet: &item.snippet,
    }))
}

#[async_trait]
impl SearchSource for GoogleSearch {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, question: &Question) -> Result<String, Error> {
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", question.as_str()),
                ("num", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("google", e))?;

        let response = check_status("google", response).await?;
        let data: GoogleResponse = response
            .json()
            .await
            .map_err(|e| Error::serialization(format!("google: {}", e)))?;

        debug!(items = data.items.len(), "Google search complete");
        Ok(render(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_items() {
        let data: GoogleResponse = serde_json::from_value(serde_json::json!({
            "kind": "customsearch#search",
            "items": [
                {"title": "RBI Monetary Policy", "link": "https://rbi.org.in/policy", "snippet": "Repo rate at 6.5%"},
                {"title": "SBI Personal Loan", "link": "https://sbi.co.in/loan", "snippet": "Rates from 11.15%"}
            ]
        }))
        .unwrap();
        let text = render(&data);
        assert!(text.starts_with("1. RBI Monetary Policy\n   https://rbi.org.in/policy\n   Repo rate at 6.5%"));
        assert!(text.contains("2. SBI Personal Loan"));
    }

    #[test]
    fn test_no_items_renders_empty() {
        let data: GoogleResponse =
            serde_json::from_value(serde_json::json!({"searchInformation": {"totalResults": "0"}}))
                .unwrap();
        assert!(render(&data).is_empty());
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(GoogleSearch::new("k", "cx").with_limit(50).limit, 10);
        assert_eq!(GoogleSearch::new("k", "cx").with_limit(0).limit, 1);
    }
}
