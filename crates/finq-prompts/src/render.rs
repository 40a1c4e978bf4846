//! Deterministic text rendering for template content.

use finq_core::RedditPost;
use serde::{Deserialize, Serialize};

use crate::Slot;

/// Placeholder for a source that returned nothing.
pub const NO_RESULTS: &str = "(no results)";

/// Placeholder for an empty post list.
pub const NO_POST_DETAILS: &str = "(no post details)";

/// Marker for an analysis that could not be produced.
pub const NOT_AVAILABLE: &str = "NOT AVAILABLE";

/// Bounds applied when embedding Reddit posts into content text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFormat {
    /// Maximum characters kept from a post body or a comment.
    pub excerpt_chars: usize,
    /// Maximum quoted comments per post.
    pub max_comments: usize,
}

impl Default for PostFormat {
    fn default() -> Self {
        Self {
            excerpt_chars: 400,
            max_comments: 3,
        }
    }
}

pub(crate) fn or_no_results(text: &str) -> &str {
    if text.trim().is_empty() {
        NO_RESULTS
    } else {
        text
    }
}

pub(crate) fn render_slot(slot: Slot<'_>) -> String {
    match slot {
        Slot::Present(text) if text.trim().is_empty() => "(empty analysis)".to_string(),
        Slot::Present(text) => text.to_string(),
        Slot::Missing(reason) if reason.trim().is_empty() => NOT_AVAILABLE.to_string(),
        Slot::Missing(reason) => format!("{} ({})", NOT_AVAILABLE, reason.trim()),
    }
}

/// Render posts as a numbered bullet block.
///
/// Titles, bodies and comments appear in whitespace-collapsed form: any run
/// of spaces, tabs or newlines becomes one space, so each entry keeps its
/// layout. Bodies and comments are then truncated to `format.excerpt_chars`.
/// Content built from posts therefore contains each post value as collapsed
/// text, not as the raw multi-line string.
pub fn render_posts(posts: &[RedditPost], format: PostFormat) -> String {
    if posts.is_empty() {
        return NO_POST_DETAILS.to_string();
    }

    let mut out = String::new();
    for (i, post) in posts.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let title = collapse(&post.title);
        let title = if title.is_empty() { "(untitled)".to_string() } else { title };
        out.push_str(&format!(
            "{}. {} (score {}, {} comments)\n",
            i + 1,
            title,
            post.score,
            post.comment_count
        ));
        if let Some(url) = &post.url {
            out.push_str(&format!("   URL: {}\n", url));
        }
        let body = collapse(&post.body);
        if !body.is_empty() {
            out.push_str(&format!("   {}\n", truncate(&body, format.excerpt_chars)));
        }
        for comment in post
            .top_comments
            .iter()
            .map(|c| collapse(c))
            .filter(|c| !c.is_empty())
            .take(format.max_comments)
        {
            out.push_str(&format!("   > \"{}\"\n", truncate(&comment, format.excerpt_chars)));
        }
    }
    out.trim_end().to_string()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("₹50,000 loan", 3), "₹50…");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exact", 5), "exact");
    }

    #[test]
    fn test_render_posts_empty() {
        assert_eq!(render_posts(&[], PostFormat::default()), NO_POST_DETAILS);
    }

    #[test]
    fn test_render_posts_bounds_comments_and_body() {
        let post = RedditPost::new("SBI personal loan", "a".repeat(50))
            .with_score(12)
            .with_comments(
                9,
                vec!["one".into(), "two".into(), "three".into(), "four".into()],
            );
        let format = PostFormat {
            excerpt_chars: 10,
            max_comments: 2,
        };
        let text = render_posts(&[post], format);

        assert!(text.starts_with("1. SBI personal loan (score 12, 9 comments)"));
        assert!(text.contains(&format!("{}…", "a".repeat(10))));
        assert!(text.contains("> \"one\""));
        assert!(text.contains("> \"two\""));
        assert!(!text.contains("three"));
    }

    #[test]
    fn test_render_posts_collapses_newlines() {
        let post = RedditPost::new("", "line one\n\nline two")
            .with_url("https://www.reddit.com/r/personalfinanceindia/comments/1/x/");
        let text = render_posts(&[post], PostFormat::default());
        assert!(text.contains("(untitled)"));
        assert!(text.contains("line one line two"));
        assert!(text.contains("URL: https://www.reddit.com/r/personalfinanceindia/comments/1/x/"));
    }

    #[test]
    fn test_render_slot() {
        assert_eq!(render_slot(Slot::Present("rates are up")), "rates are up");
        assert_eq!(render_slot(Slot::Missing("")), "NOT AVAILABLE");
        assert_eq!(
            render_slot(Slot::Missing("search failed")),
            "NOT AVAILABLE (search failed)"
        );
    }
}
