//! Synthesis lens: reconcile the per-source analyses into one answer.

use finq_core::Question;

use crate::render::render_slot;
use crate::Slot;

pub(crate) const INSTRUCTION: &str = r#"You are an expert financial advisor.
Combine Google, Bing, and Reddit analyses into a clear, easy-to-understand answer.
Your task:
- Compare financial options (banks, loans, insurance, investments)
- Break down complex terms into simple language
- Highlight pros/cons and intuitive comparisons
- Mention which insights come from official sources vs. community experiences
- Label each claim with its origin: [Official] for Google, [News] for Bing, [Community] for Reddit
- Where sources disagree, say so and explain which one is more reliable for that point
- If an analysis is marked NOT AVAILABLE, tell the reader that source was missing and never invent its content
Make the advice **practical and beginner-friendly**.
Answer the question from multiple perspectives in one coherent response."#;

pub(crate) fn render(
    question: &Question,
    google: Slot<'_>,
    bing: Slot<'_>,
    reddit: Slot<'_>,
) -> String {
    format!(
        "Question: {}\n\nGoogle Analysis:\n{}\n\nBing Analysis:\n{}\n\nReddit Community Analysis:\n{}",
        question,
        render_slot(google),
        render_slot(bing),
        render_slot(reddit)
    )
}
