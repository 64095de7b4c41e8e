//! Prompt domain
//!
//! Templates for every prompt the system sends: grading a question,
//! structuring OCR text, and extracting questions from an image.

mod template;

pub use template::PromptTemplate;
