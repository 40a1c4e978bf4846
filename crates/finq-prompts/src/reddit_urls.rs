//! Reddit triage lens: which discussion threads are worth reading.

use finq_core::Question;

use crate::render::or_no_results;

pub(crate) const INSTRUCTION: &str = r#"You are a financial research assistant.
Your task is to examine Reddit discussions and identify posts that give valuable insights about finance topics like investments, bank loan rates, or insurance.
Focus on:
- Posts where users share real financial experiences
- Comparisons of financial products (banks, loans, insurance)
- Community consensus and tips
Return the most relevant URLs, most valuable first, one per line, each followed by a short reason.
Only return URLs that appear in the results."#;

pub(crate) fn render(question: &Question, reddit_results: &str) -> String {
    format!(
        "User Question: {}\n\nReddit Results:\n{}",
        question,
        or_no_results(reddit_results)
    )
}
