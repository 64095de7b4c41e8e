//! Parsing of free-form model output.
//!
//! Models rarely return byte-perfect JSON. Everything here is pure: no I/O,
//! no sessions, just text in and structured values out.
//!
//! | Function | Produces | Used by |
//! |----------|----------|---------|
//! | [`repair::repair_json`] | a JSON value of the requested shape | both parsers below |
//! | [`answer::parse_answer`] | [`answer::ParsedAnswer`] | model dispatch |
//! | [`questions::parse_question_array`] | `Vec<Question>` | OCR text structuring, vision replies |

pub mod answer;
pub mod questions;
pub mod repair;
