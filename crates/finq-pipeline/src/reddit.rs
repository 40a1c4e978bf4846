//! Reddit thread selection: the triage analysis acts as a pre-filter for the
//! posts handed to the content analysis.

use std::collections::HashSet;
use std::sync::LazyLock;

use finq_core::AnalysisResult;
use regex::Regex;

static THREAD_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.|old\.|new\.)?reddit\.com/r/([A-Za-z0-9_]+)/comments/([A-Za-z0-9]+)(?:/([A-Za-z0-9_%-]+))?",
    )
    .expect("thread url pattern is valid")
});

struct Thread {
    id: String,
    url: String,
}

fn threads(text: &str) -> impl Iterator<Item = Thread> + '_ {
    THREAD_URL.captures_iter(text).map(|caps| {
        let subreddit = &caps[1];
        let id = caps[2].to_string();
        let url = match caps.get(3) {
            Some(slug) => format!(
                "https://www.reddit.com/r/{}/comments/{}/{}/",
                subreddit,
                id,
                slug.as_str()
            ),
            None => format!("https://www.reddit.com/r/{}/comments/{}/", subreddit, id),
        };
        Thread { id, url }
    })
}

/// Canonical thread URLs in order of first appearance, one per thread id.
pub fn thread_urls(text: &str, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    threads(text)
        .filter(|t| seen.insert(t.id.clone()))
        .map(|t| t.url)
        .take(limit)
        .collect()
}

/// Pick the threads to fetch for content analysis.
///
/// The triage ranking wins when it names threads from the listing. URLs the
/// triage names that the listing never contained are dropped, so a listing
/// without thread URLs selects nothing. Without a usable triage, the listing
/// order is used.
pub fn select_threads(
    triage: Option<&AnalysisResult>,
    listing: &str,
    limit: usize,
) -> Vec<String> {
    let listed: HashSet<String> = threads(listing).map(|t| t.id).collect();
    if listed.is_empty() {
        return Vec::new();
    }

    if let Some(triage) = triage {
        let mut seen = HashSet::new();
        let ranked: Vec<String> = threads(&triage.text)
            .filter(|t| listed.contains(&t.id))
            .filter(|t| seen.insert(t.id.clone()))
            .map(|t| t.url)
            .take(limit)
            .collect();
        if !ranked.is_empty() {
            return ranked;
        }
    }

    thread_urls(listing, limit)
}
