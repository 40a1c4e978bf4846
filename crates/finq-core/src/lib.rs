//! finq-core: Core types and traits for finq
//!
//! This crate provides the foundational types shared by the finq research
//! pipeline: the reasoning-service trait, the search collaborator traits,
//! messages, and the research data model.

pub mod error;
pub mod message;
pub mod provider;
pub mod research;
pub mod source;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::Error;
pub use message::{Message, MessagePair, Role, Usage};
pub use provider::{CompletionRequest, CompletionResponse, FinishReason, Provider};
pub use research::{AnalysisResult, Question, RedditPost, SourceKind};
pub use source::{RedditSource, SearchSource};

pub type Result<T> = std::result::Result<T, Error>;
