//! Prompt templates for the finq research pipeline.
//!
//! This crate provides:
//! - `TaskKind`, the registry of analysis and synthesis tasks and their fixed
//!   instruction text (one analytical lens per task)
//! - `TaskInput` and `compose` for building the `MessagePair` sent to the
//!   reasoning service
//! - Per-task convenience builders
//!
//! Rendering is total: every well-typed input produces text, and missing or
//! empty values render as explicit placeholders.

use finq_core::{MessagePair, Question, RedditPost, SourceKind};
use serde::{Deserialize, Serialize};

mod bing;
mod google;
mod reddit_content;
mod reddit_urls;
mod render;
mod synthesis;

pub use render::{render_posts, truncate, PostFormat, NOT_AVAILABLE, NO_POST_DETAILS, NO_RESULTS};

/// A task the reasoning service performs in one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    RedditUrlAnalysis,
    GoogleAnalysis,
    BingAnalysis,
    RedditContentAnalysis,
    Synthesis,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::RedditUrlAnalysis,
        TaskKind::GoogleAnalysis,
        TaskKind::BingAnalysis,
        TaskKind::RedditContentAnalysis,
        TaskKind::Synthesis,
    ];

    /// Fixed instruction text for this task. Never contains request data.
    pub fn instruction(&self) -> &'static str {
        match self {
            TaskKind::RedditUrlAnalysis => reddit_urls::INSTRUCTION,
            TaskKind::GoogleAnalysis => google::INSTRUCTION,
            TaskKind::BingAnalysis => bing::INSTRUCTION,
            TaskKind::RedditContentAnalysis => reddit_content::INSTRUCTION,
            TaskKind::Synthesis => synthesis::INSTRUCTION,
        }
    }

    /// The source whose analysis this task produces, if it is an analysis task.
    pub fn source(&self) -> Option<SourceKind> {
        match self {
            TaskKind::RedditUrlAnalysis => Some(SourceKind::RedditUrl),
            TaskKind::GoogleAnalysis => Some(SourceKind::Google),
            TaskKind::BingAnalysis => Some(SourceKind::Bing),
            TaskKind::RedditContentAnalysis => Some(SourceKind::RedditContent),
            TaskKind::Synthesis => None,
        }
    }

    pub fn for_source(source: SourceKind) -> Self {
        match source {
            SourceKind::RedditUrl => TaskKind::RedditUrlAnalysis,
            SourceKind::Google => TaskKind::GoogleAnalysis,
            SourceKind::Bing => TaskKind::BingAnalysis,
            SourceKind::RedditContent => TaskKind::RedditContentAnalysis,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::RedditUrlAnalysis => "reddit-url-analysis",
            TaskKind::GoogleAnalysis => "google-analysis",
            TaskKind::BingAnalysis => "bing-analysis",
            TaskKind::RedditContentAnalysis => "reddit-content-analysis",
            TaskKind::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

/// One analysis slot of the synthesis input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    /// The analysis text.
    Present(&'a str),
    /// The analysis is absent, with a short reason shown to the reasoning service.
    Missing(&'a str),
}

impl<'a> From<Option<&'a str>> for Slot<'a> {
    fn from(value: Option<&'a str>) -> Self {
        match value {
            Some(text) => Slot::Present(text),
            None => Slot::Missing(""),
        }
    }
}

/// Task-specific inputs. The variant determines the task.
#[derive(Debug, Clone, Copy)]
pub enum TaskInput<'a> {
    RedditUrls {
        reddit_results: &'a str,
    },
    Google {
        google_results: &'a str,
    },
    Bing {
        bing_results: &'a str,
    },
    RedditContent {
        reddit_results: &'a str,
        posts: &'a [RedditPost],
        format: PostFormat,
    },
    Synthesis {
        google: Slot<'a>,
        bing: Slot<'a>,
        reddit: Slot<'a>,
    },
}

impl TaskInput<'_> {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskInput::RedditUrls { .. } => TaskKind::RedditUrlAnalysis,
            TaskInput::Google { .. } => TaskKind::GoogleAnalysis,
            TaskInput::Bing { .. } => TaskKind::BingAnalysis,
            TaskInput::RedditContent { .. } => TaskKind::RedditContentAnalysis,
            TaskInput::Synthesis { .. } => TaskKind::Synthesis,
        }
    }
}

/// Render the content channel for a task.
pub fn render_content(question: &Question, input: &TaskInput<'_>) -> String {
    match *input {
        TaskInput::RedditUrls { reddit_results } => reddit_urls::render(question, reddit_results),
        TaskInput::Google { google_results } => google::render(question, google_results),
        TaskInput::Bing { bing_results } => bing::render(question, bing_results),
        TaskInput::RedditContent {
            reddit_results,
            posts,
            format,
        } => reddit_content::render(question, reddit_results, posts, format),
        TaskInput::Synthesis {
            google,
            bing,
            reddit,
        } => synthesis::render(question, google, bing, reddit),
    }
}

/// Build the message pair for a task. Pure and deterministic.
pub fn compose(question: &Question, input: &TaskInput<'_>) -> MessagePair {
    MessagePair::new(input.kind().instruction(), render_content(question, input))
}

pub fn reddit_url_analysis_messages(question: &Question, reddit_results: &str) -> MessagePair {
    compose(question, &TaskInput::RedditUrls { reddit_results })
}

pub fn google_analysis_messages(question: &Question, google_results: &str) -> MessagePair {
    compose(question, &TaskInput::Google { google_results })
}

pub fn bing_analysis_messages(question: &Question, bing_results: &str) -> MessagePair {
    compose(question, &TaskInput::Bing { bing_results })
}

pub fn reddit_analysis_messages(
    question: &Question,
    reddit_results: &str,
    posts: &[RedditPost],
) -> MessagePair {
    compose(
        question,
        &TaskInput::RedditContent {
            reddit_results,
            posts,
            format: PostFormat::default(),
        },
    )
}

pub fn synthesis_messages(
    question: &Question,
    google_analysis: Option<&str>,
    bing_analysis: Option<&str>,
    reddit_analysis: Option<&str>,
) -> MessagePair {
    compose(
        question,
        &TaskInput::Synthesis {
            google: google_analysis.into(),
            bing: bing_analysis.into(),
            reddit: reddit_analysis.into(),
        },
    )
}
