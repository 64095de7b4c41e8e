//! Output formatting for solved questions and errors

pub mod console;
pub mod formatter;
