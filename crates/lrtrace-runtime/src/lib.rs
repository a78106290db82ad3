//! Runtime engine for parse tables built by the `lrtrace` generator.

pub mod definition;
pub mod parser;
