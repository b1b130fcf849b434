//! Prompt text sent to the model. The data block keys must stay in English
//! because the extractor matches on them.

use crate::history::HistoryRange;
use crate::market::Language;

fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::Ar => "Write your analysis, summary, and news headlines in Arabic.",
        Language::En => "Write your analysis, summary, and news headlines in English.",
    }
}

pub fn market_prompt(language: Language) -> String {
    format!(
        r#"You are a financial analyst specializing in the Egyptian Gold Market.

Task:
1. Search for the CURRENT live gold prices in Egypt for 24k, 21k, and 18k gold in Egyptian Pounds (EGP).
2. Search for the current USD to EGP exchange rate (official and parallel market).
3. Search for the current estimated "Masnahiya" (workmanship/craftsmanship fees) range per gram for 21k gold in Egypt (Min and Max values in EGP).
4. Find 3 brief, high-impact local news headlines regarding the gold market in Egypt.
5. Analyze the data to predict if prices will go UP, DOWN, or remain STABLE in the short term.
6. {instruction}

Output Format:
Provide a detailed text analysis first.

CRITICAL: At the very end of your response, you MUST include a summary block EXACTLY in this format for parsing.
IMPORTANT: The keys (Price24k, WorkmanshipMin, etc.) MUST REMAIN IN ENGLISH.

--- DATA START ---
Price24k: [Number only, remove commas]
Price21k: [Number only, remove commas]
Price18k: [Number only, remove commas]
USDRate: [Number only]
WorkmanshipMin: [Number only]
WorkmanshipMax: [Number only]
News1: [Headline] | [Source Name]
News2: [Headline] | [Source Name]
News3: [Headline] | [Source Name]
Prediction: [UP or DOWN or STABLE]
--- DATA END ---
"#,
        instruction = language_instruction(language)
    )
}

pub fn history_prompt(range: HistoryRange) -> String {
    format!(
        r#"Provide the daily historical prices of 21k gold in Egypt (EGP per gram) and the USD to EGP exchange rate for the last {days} days.
Respond with JSON only, in exactly this shape:
{{"history": [{{"date": "YYYY-MM-DD", "price21k": 0, "usdRate": 0}}]}}
Order the entries from oldest to newest."#,
        days = range.days()
    )
}
