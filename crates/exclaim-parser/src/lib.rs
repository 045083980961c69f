//! Scanner and parser for the Exclaim language.
//!
//! The parser is an AST producer: it allocates nodes straight into an
//! [`exclaim_ast::AstArena`] and returns the `Program` node. File imports
//! are delegated to an [`ImportResolver`] so the driver controls filesystem
//! access and inline-once semantics.

pub mod imports;
pub mod parser;
pub mod scanner;

pub use imports::{ImportResolution, ImportResolver, PassthroughImports};
pub use parser::parse_program;
pub use scanner::{Token, TokenKind, scan};
