//! Bing Web Search API: web pages plus news.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use finq_core::{Error, Question, SearchSource};

use crate::{check_status, http_client, render_hits, transport_error, Hit, USER_AGENT};

const ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";

pub struct BingSearch {
    client: Client,
    api_key: String,
    endpoint: String,
    limit: u32,
}

impl BingSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(USER_AGENT, Duration::from_secs(30)),
            api_key: api_key.into(),
            endpoint: ENDPOINT.to_string(),
            limit: 10,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, 50);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(USER_AGENT, timeout);
        self
    }
}

#[derive(Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages")]
    web_pages: Option<BingList<BingPage>>,
    news: Option<BingList<BingNews>>,
}

#[derive(Deserialize)]
struct BingList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Deserialize)]
struct BingPage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Deserialize)]
struct BingNews {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

fn render(response: &BingResponse) -> String {
    let mut sections = Vec::new();

    if let Some(pages) = response.web_pages.as_ref().filter(|p| !p.value.is_empty()) {
        sections.push(format!(
            "Web results:\n{}",
            render_hits(pages.value.iter().map(|p| Hit {
                title: &p.name,
                url: &p.url,
                snippet: &p.snippet,
            }))
        ));
    }
    if let Some(news) = response.news.as_ref().filter(|n| !n.value.is_empty()) {
        sections.push(format!(
            "News:\n{}",
            render_hits(news.value.iter().map(|n| Hit {
                title: &n.name,
                url: &n.url,
                snippet: &n.description,
            }))
        ));
    }

    sections.join("\n\n")
}

#[async_trait]
impl SearchSource for BingSearch {
    fn name(&self) -> &str {
        "bing"
    }

    async fn search(&self, question: &Question) -> Result<String, Error> {
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .query(&[
                ("q", question.as_str()),
                ("count", limit.as_str()),
                ("responseFilter", "Webpages,News"),
            ])
            .send()
            .await
            .map_err(|e| transport_error("bing", e))?;

        let response = check_status("bing", response).await?;
        let data: BingResponse = response
            .json()
            .await
            .map_err(|e| Error::serialization(format!("bing: {}", e)))?;

        debug!(
            pages = data.web_pages.as_ref().map_or(0, |p| p.value.len()),
            news = data.news.as_ref().map_or(0, |n| n.value.len()),
            "Bing search complete"
        );
        Ok(render(&data))
    }
}
