//! Progress reporting while a request runs

pub mod reporter;
