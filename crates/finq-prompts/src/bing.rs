//! Bing lens: complementary, news-oriented data.

use finq_core::Question;

use crate::render::or_no_results;

pub(crate) const INSTRUCTION: &str = r#"You are a financial analyst.
Analyze Bing results to find **complementary financial insights**.
Focus on:
- News articles about banking and finance
- Comparisons across providers
- Technical/enterprise finance perspectives
Highlight **unique findings**.
Extract the insights from the search results that complement other search sources."#;

pub(crate) fn render(question: &Question, bing_results: &str) -> String {
    format!(
        "Question: {}\n\nBing Search Results:\n{}",
        question,
        or_no_results(bing_results)
    )
}
