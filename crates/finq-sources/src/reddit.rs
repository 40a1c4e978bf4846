//! Reddit public JSON endpoints: search listing and thread retrieval.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use finq_core::{Error, Question, RedditPost, RedditSource};

use crate::{check_status, excerpt, http_client, transport_error, USER_AGENT};

const BASE_URL: &str = "https://www.reddit.com";

pub struct RedditClient {
    client: Client,
    user_agent: String,
    base_url: String,
    limit: u32,
    max_comments: usize,
}

impl RedditClient {
    /// Reddit rejects generic user agents; pass one identifying the deployment.
    pub fn new(user_agent: Option<&str>) -> Self {
        let user_agent = user_agent.unwrap_or(USER_AGENT).to_string();
        Self {
            client: http_client(&user_agent, Duration::from_secs(30)),
            user_agent,
            base_url: BASE_URL.to_string(),
            limit: 10,
            max_comments: 5,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, 100);
        self
    }

    pub fn with_max_comments(mut self, max_comments: usize) -> Self {
        self.max_comments = max_comments;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(&self.user_agent, timeout);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error("reddit", e))?;
        let response = check_status("reddit", response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::serialization(format!("reddit: {}", e)))
    }

    async fn fetch_post(&self, url: &str) -> Result<RedditPost, Error> {
        let json_url = format!("{}.json", url.trim_end_matches('/'));
        let listings: Vec<Listing> = self
            .get_json(&json_url, &[("limit", "20"), ("depth", "1"), ("raw_json", "1")])
            .await?;
        thread_to_post(listings, url, self.max_comments)
            .ok_or_else(|| Error::malformed_output(format!("reddit: no post at {}", url)))
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    kind: String,
    data: ThingData,
}

/// Fields shared by posts (t3) and comments (t1); absent ones default.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ThingData {
    title: String,
    selftext: String,
    body: String,
    permalink: String,
    subreddit: String,
    score: i64,
    num_comments: u32,
    stickied: bool,
}

fn render_listing(listing: &Listing, base_url: &str) -> String {
    listing
        .data
        .children
        .iter()
        .filter(|t| t.kind == "t3")
        .enumerate()
        .map(|(i, t)| {
            let post = &t.data;
            let mut entry = format!(
                "{}. {} (r/{}, score {}, {} comments)\n   {}{}",
                i + 1,
                post.title.trim(),
                post.subreddit,
                post.score,
                post.num_comments,
                base_url,
                post.permalink
            );
            if !post.selftext.trim().is_empty() {
                entry.push_str("\n   ");
                entry.push_str(&excerpt(&post.selftext, 300));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn thread_to_post(listings: Vec<Listing>, url: &str, max_comments: usize) -> Option<RedditPost> {
    let mut listings = listings.into_iter();
    let post = listings
        .next()?
        .data
        .children
        .into_iter()
        .find(|t| t.kind == "t3")?
        .data;

    let top_comments = listings
        .next()
        .map(|comments| {
            comments
                .data
                .children
                .into_iter()
                .filter(|t| t.kind == "t1" && !t.data.stickied)
                .map(|t| t.data.body)
                .filter(|body| {
                    !body.trim().is_empty() && body != "[deleted]" && body != "[removed]"
                })
                .take(max_comments)
                .collect()
        })
        .unwrap_or_default();

    Some(
        RedditPost::new(post.title, post.selftext)
            .with_url(url)
            .with_score(post.score)
            .with_comments(post.num_comments, top_comments),
    )
}

#[async_trait]
impl RedditSource for RedditClient {
    async fn search(&self, question: &Question) -> Result<String, Error> {
        let limit = self.limit.to_string();
        let url = format!("{}/search.json", self.base_url);
        let listing: Listing = self
            .get_json(
                &url,
                &[
                    ("q", question.as_str()),
                    ("limit", limit.as_str()),
                    ("sort", "relevance"),
                    ("raw_json", "1"),
                ],
            )
            .await?;

        debug!(posts = listing.data.children.len(), "Reddit search complete");
        Ok(render_listing(&listing, &self.base_url))
    }

    /// Threads are fetched concurrently; unreadable ones are skipped. Fails
    /// only when every thread fails.
    async fn fetch_posts(&self, urls: &[String]) -> Result<Vec<RedditPost>, Error> {
        let results = join_all(urls.iter().map(|url| self.fetch_post(url))).await;

        let mut posts = Vec::new();
        let mut last_error = None;
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(post) => posts.push(post),
                Err(e) => {
                    warn!(url = %url, error = %e, "Skipping unreadable thread");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if posts.is_empty() => Err(e),
            _ => Ok(posts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_json() -> serde_json::Value {
        serde_json::json!([
            {"kind": "Listing", "data": {"children": [
                {"kind": "t3", "data": {
                    "title": "SBI vs HDFC personal loan",
                    "selftext": "Got 10.5% from SBI.",
                    "score": 80,
                    "num_comments": 30,
                    "permalink": "/r/IndiaInvestments/comments/def456/sbi_vs_hdfc/"
                }}
            ]}},
            {"kind": "Listing", "data": {"children": [
                {"kind": "t1", "data": {"body": "Mod note", "stickied": true}},
                {"kind": "t1", "data": {"body": "HDFC took three weeks", "score": 12}},
                {"kind": "t1", "data": {"body": "[deleted]"}},
                {"kind": "t1", "data": {"body": "ICICI was quick"}},
                {"kind": "more", "data": {"count": 10}}
            ]}}
        ])
    }

    #[test]
    fn test_thread_to_post() {
        let listings: Vec<Listing> = serde_json::from_value(thread_json()).unwrap();
        let url = "https://www.reddit.com/r/IndiaInvestments/comments/def456/sbi_vs_hdfc/";
        let post = thread_to_post(listings, url, 5).unwrap();

        assert_eq!(post.title, "SBI vs HDFC personal loan");
        assert_eq!(post.body, "Got 10.5% from SBI.");
        assert_eq!(post.score, 80);
        assert_eq!(post.comment_count, 30);
        assert_eq!(post.url.as_deref(), Some(url));
        assert_eq!(post.top_comments, vec!["HDFC took three weeks", "ICICI was quick"]);
    }

    #[test]
    fn test_thread_comment_limit() {
        let listings: Vec<Listing> = serde_json::from_value(thread_json()).unwrap();
        let post = thread_to_post(listings, "u", 1).unwrap();
        assert_eq!(post.top_comments.len(), 1);
    }

    #[test]
    fn test_render_listing_includes_permalinks() {
        let listing: Listing = serde_json::from_value(serde_json::json!({
            "kind": "Listing",
            "data": {"children": [
                {"kind": "t3", "data": {
                    "title": "Best personal loan?",
                    "subreddit": "personalfinanceindia",
                    "score": 120,
                    "num_comments": 45,
                    "permalink": "/r/personalfinanceindia/comments/abc123/best_personal_loan/",
                    "selftext": "Looking at\nSBI and HDFC"
                }}
            ]}
        }))
        .unwrap();
        let text = render_listing(&listing, BASE_URL);
        assert_eq!(
            text,
            "1. Best personal loan? (r/personalfinanceindia, score 120, 45 comments)\n   \
             https://www.reddit.com/r/personalfinanceindia/comments/abc123/best_personal_loan/\n   \
             Looking at SBI and HDFC"
        );
    }

    #[tokio::test]
    async fn test_fetch_posts_with_no_urls_is_empty() {
        let client = RedditClient::new(None);
        assert!(client.fetch_posts(&[]).await.unwrap().is_empty());
    }
}
