//! Prompt templates for evaluation, structuring and vision extraction

use crate::core::question::Question;

const ANSWER_SCHEMA: &str = r#"{"question_id":"<id>","selected_options":["A","B"],"is_multiple_correct":true,"confidence":0.85,"reasoning":"Short chain-of-thought reasoning."}"#;

const QUESTION_SCHEMA: &str = r#"[{"id":"1","question":"...","options":[{"label":"A","text":"..."}],"multiChoice":true}]"#;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt sent with every backend call
    pub fn evaluation_system() -> &'static str {
        "You are an assistant that returns JSON only as requested."
    }

    /// User prompt asking a model to grade one question
    pub fn evaluation_prompt(question: &Question) -> String {
        let mut options = String::new();
        for option in question.options() {
            options.push_str(&format!("{}) {}\n", option.label, option.text));
        }

        format!(
            r#"You are an objective grader. For the given multiple choice question, evaluate which option or options are correct.

IMPORTANT: Multiple options can be correct. Carefully analyze if more than one option is valid and include ALL correct options in your answer.

Return ONLY valid JSON with this schema: {schema}

Instructions:
- Use "{id}" as "question_id"
- Set "is_multiple_correct" to true if multiple options are correct, false otherwise
- Include ALL correct options in "selected_options" array, using the option labels shown
- DO NOT add any surrounding commentary or markdown

Question: {text}
Options:
{options}
Evaluate and return the JSON only."#,
            schema = ANSWER_SCHEMA,
            id = question.id(),
            text = question.text(),
            options = options,
        )
    }

    /// First attempt at turning raw OCR text into questions
    pub fn structuring_prompt(text: &str) -> String {
        format!(
            r#"You are a strict parser. Parse the following raw text into a JSON array of multiple choice questions using this schema: {schema}.

Rules:
- Output ONLY valid JSON (no commentary).
- If options are unlabeled, assign labels A,B,C... in order.
- Set "multiChoice" to true if the question indicates multiple correct answers are possible (e.g., "select all that apply", "which are correct"), otherwise false.
- Do not add extra fields.

Text:

{text}"#,
            schema = QUESTION_SCHEMA,
            text = text,
        )
    }

    /// Stricter retry used when the first structuring reply was unusable
    pub fn structuring_retry_prompt(text: &str) -> String {
        format!(
            r#"STRICT JSON ONLY. Return ONLY a valid JSON array matching the schema: {schema}. Set multiChoice=true if multiple answers are correct, false otherwise. No commentary.

Text:

{text}"#,
            schema = QUESTION_SCHEMA,
            text = text,
        )
    }

    /// Prompt sent alongside an image to extract its questions
    pub fn vision_extraction_prompt() -> String {
        format!(
            r#"Extract every complete multiple choice question visible in this image.

Return ONLY a valid JSON array using this schema: {schema}

Rules:
- Copy question and option text exactly as written.
- Use the option labels printed in the image; if options are unlabeled, assign A,B,C... in order.
- An option's "text" is its full content, never just its label.
- Skip questions whose options are cut off.
- Set "multiChoice" to true only if the question says several answers may be correct.
- No commentary, no markdown."#,
            schema = QUESTION_SCHEMA,
        )
    }

    /// Corrective re-query when an extraction looks wrong
    pub fn vision_correction_prompt(previous: &[Question]) -> String {
        let mut listing = String::new();
        for question in previous {
            listing.push_str(&format!("[{}] {}", question.id(), question));
        }

        format!(
            r#"A previous extraction of the questions in this image looks wrong: some options have text that only repeats the label or is too short.

Previous extraction:
{listing}
Look at the image again and return the corrected questions.

Return ONLY a valid JSON array using this schema: {schema}
No commentary, no markdown."#,
            listing = listing,
            schema = QUESTION_SCHEMA,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::question::QuestionOption;

    fn question() -> Question {
        Question::new(
            "3",
            "Which are prime?",
            vec![
                QuestionOption::new("A", "4"),
                QuestionOption::new("B", "5"),
                QuestionOption::new("C", "7"),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_evaluation_prompt_lists_options() {
        let prompt = PromptTemplate::evaluation_prompt(&question());
        assert!(prompt.contains("Question: Which are prime?"));
        assert!(prompt.contains("A) 4\nB) 5\nC) 7\n"));
        assert!(prompt.contains("Multiple options can be correct"));
        assert!(prompt.contains(r#"Use "3" as "question_id""#));
        assert!(prompt.contains("\"selected_options\""));
    }

    #[test]
    fn test_structuring_prompts_embed_text() {
        let text = "1. Pick one\na) x\nb) y";
        assert!(PromptTemplate::structuring_prompt(text).ends_with(text));
        let retry = PromptTemplate::structuring_retry_prompt(text);
        assert!(retry.starts_with("STRICT JSON ONLY"));
        assert!(retry.ends_with(text));
    }

    #[test]
    fn test_correction_prompt_shows_previous_extraction() {
        let prompt = PromptTemplate::vision_correction_prompt(&[question()]);
        assert!(prompt.contains("[3] Which are prime?"));
        assert!(prompt.contains("B) 5"));
    }
}
