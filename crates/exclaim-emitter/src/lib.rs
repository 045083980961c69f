//! JavaScript emission for the Exclaim compiler.
//!
//! `generate_program` lowers a bound AST into one ES module of JavaScript
//! text against a small fixed runtime API (`$runtime`); `CompilerOptions`
//! carries the name-keyed extension tables (events, distributions,
//! parsers) and their documented defaults.

pub mod generator;
pub mod options;

pub use generator::generate_program;
pub use options::{
    CompilerOptions, DistributionFn, DistributionsMap, ParserEntry, ParserMap, ParserTest,
    default_distributions, default_parsers,
};
