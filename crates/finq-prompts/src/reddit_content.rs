//! Reddit content lens: community sentiment and lived experience.

use finq_core::{Question, RedditPost};

use crate::render::{or_no_results, render_posts, PostFormat};

pub(crate) const INSTRUCTION: &str = r#"You are a financial assistant analyzing Reddit discussions.
Extract insights such as:
- Real user experiences with banks, loans, investments, insurance
- Community comparisons of financial products
- Positive and negative feedback
Quote relevant lines and explain in plain, simple terms.
Summarize the community insights, user experiences, and relevant discussions."#;

pub(crate) fn render(
    question: &Question,
    reddit_results: &str,
    posts: &[RedditPost],
    format: PostFormat,
) -> String {
    format!(
        "Question: {}\n\nReddit Search Results:\n{}\n\nDetailed Reddit Post Data:\n{}",
        question,
        or_no_results(reddit_results),
        render_posts(posts, format)
    )
}
