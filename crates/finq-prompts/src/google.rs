//! Google lens: authoritative and official financial data.

use finq_core::Question;

use crate::render::or_no_results;

pub(crate) const INSTRUCTION: &str = r#"You are a financial analyst.
Analyze Google results to extract **official and reliable financial information**.
Focus on:
- Bank loan interest rates and terms
- Investment product details (mutual funds, SIPs, ETFs)
- Insurance provider offerings
- Authoritative sources like RBI, SEBI, banks, insurance companies
Explain findings in **simple words**.
Extract the key insights from the search results that help answer the user's question."#;

pub(crate) fn render(question: &Question, google_results: &str) -> String {
    format!(
        "Question: {}\n\nGoogle Search Results:\n{}",
        question,
        or_no_results(google_results)
    )
}
