//! finq-sources: HTTP search collaborators for finq
//!
//! Each source turns a question into plain text the pipeline can analyze:
//! - `GoogleSearch`: Google Custom Search JSON API
//! - `BingSearch`: Bing Web Search API (web pages and news)
//! - `RedditClient`: Reddit search listing and thread retrieval

use std::time::Duration;

use finq_core::Error;
use reqwest::{Client, Response};

pub mod bing;
pub mod google;
pub mod reddit;

pub use bing::BingSearch;
pub use google::GoogleSearch;
pub use reddit::RedditClient;

const USER_AGENT: &str = "finq/0.1.0";

fn http_client(user_agent: &str, timeout: Duration) -> Client {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

fn transport_error(source: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout(format!("{}: {}", source, err))
    } else {
        Error::network(format!("{}: {}", source, err))
    }
}

/// Map a non-success HTTP status to the collaborator error taxonomy.
async fn check_status(source: &str, response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = format!("{} HTTP {}: {}", source, status.as_u16(), excerpt(&body, 200));
    Err(match status.as_u16() {
        401 | 403 => Error::auth(message),
        429 => Error::rate_limit(message),
        408 | 504 => Error::timeout(message),
        code => Error::api(code, message),
    })
}

/// One search hit rendered into the text blob handed to an analyzer.
struct Hit<'a> {
    title: &'a str,
    url: &'a str,
    snippet: &'a str,
}

fn render_hits<'a>(hits: impl IntoIterator<Item = Hit<'a>>) -> String {
    hits.into_iter()
        .enumerate()
        .map(|(i, hit)| {
            let mut entry = format!("{}. {}\n   {}", i + 1, hit.title.trim(), hit.url);
            let snippet = collapse(hit.snippet);
            if !snippet.is_empty() {
                entry.push_str("\n   ");
                entry.push_str(&snippet);
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = collapse(text);
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_hits_numbers_entries() {
        let text = render_hits(vec![
            Hit {
                title: "RBI policy",
                url: "https://rbi.org.in",
                snippet: "Repo rate\nunchanged at 6.5%",
            },
            Hit {
                title: "No snippet",
                url: "https://example.com",
                snippet: "",
            },
        ]);
        assert_eq!(
            text,
            "1. RBI policy\n   https://rbi.org.in\n   Repo rate unchanged at 6.5%\n2. No snippet\n   https://example.com"
        );
    }

    #[test]
    fn test_render_hits_empty_is_empty() {
        assert!(render_hits(Vec::new()).is_empty());
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("a  b\nc", 10), "a b c");
        assert_eq!(excerpt("abcdef", 3), "abc…");
    }
}
