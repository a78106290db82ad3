//! An LR(1)/LALR(1) parse table generator with a tracing parse driver.

pub mod driver;
pub mod first_sets;
pub mod grammar;
pub mod lalr;
pub mod lr1;
pub mod report;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;
