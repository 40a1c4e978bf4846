//! Research data model shared by the prompt and pipeline crates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::message::Usage;

/// The user's finance question. Cheap to clone, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question(Arc<str>);

impl Question {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(Arc::from(text.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Question {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Question {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

/// Which information source an analysis derives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Google,
    Bing,
    RedditUrl,
    RedditContent,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Google,
        SourceKind::Bing,
        SourceKind::RedditUrl,
        SourceKind::RedditContent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Google => "Google",
            SourceKind::Bing => "Bing",
            SourceKind::RedditUrl => "Reddit thread triage",
            SourceKind::RedditContent => "Reddit",
        }
    }

    /// Category of evidence this source contributes to a final answer.
    pub fn provenance(&self) -> &'static str {
        match self {
            SourceKind::Google => "official sources",
            SourceKind::Bing => "news and provider comparisons",
            SourceKind::RedditUrl => "thread selection",
            SourceKind::RedditContent => "community experiences",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::Google => "google",
            SourceKind::Bing => "bing",
            SourceKind::RedditUrl => "reddit-url",
            SourceKind::RedditContent => "reddit-content",
        };
        f.write_str(name)
    }
}

/// One Reddit thread as returned by the post collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedditPost {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub top_comments: Vec<String>,
}

impl RedditPost {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    pub fn with_comments(mut self, comment_count: u32, top_comments: Vec<String>) -> Self {
        self.comment_count = comment_count;
        self.top_comments = top_comments;
        self
    }
}

/// Text produced by the reasoning service for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source: SourceKind,
    pub text: String,
    #[serde(default)]
    pub usage: Usage,
}

impl AnalysisResult {
    pub fn new(source: SourceKind, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
            usage: Usage::default(),
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_clone_shares_text() {
        let q = Question::from("Best SIP for 5 years?");
        let q2 = q.clone();
        assert_eq!(q, q2);
        assert_eq!(q2.as_str(), "Best SIP for 5 years?");
        assert_eq!(q.to_string(), "Best SIP for 5 years?");
    }

    #[test]
    fn test_source_kind_display_and_serde_agree() {
        for kind in SourceKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.to_string()));
        }
    }

    #[test]
    fn test_post_builder() {
        let post = RedditPost::new("HDFC vs SBI", "went with SBI")
            .with_url("https://www.reddit.com/r/IndiaInvestments/comments/abc/x/")
            .with_score(42)
            .with_comments(7, vec!["SBI was faster".into()]);
        assert_eq!(post.score, 42);
        assert_eq!(post.comment_count, 7);
        assert_eq!(post.top_comments.len(), 1);
        assert!(post.url.is_some());
    }

    #[test]
    fn test_post_deserializes_with_missing_fields() {
        let post: RedditPost = serde_json::from_str(r#"{"title": "only a title"}"#).unwrap();
        assert_eq!(post.title, "only a title");
        assert!(post.body.is_empty());
        assert!(post.top_comments.is_empty());
    }
}
