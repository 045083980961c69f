//! AST model for the Exclaim language.
//!
//! This crate provides:
//! - The node arena (`AstArena`, `NodeId`) — identities are allocation
//!   order, scoped to one compilation
//! - The closed set of node kinds and payloads (`NodeKind`)
//! - Generic traversal: `walk` with enter/exit listeners, `accept` with a
//!   single-dispatch visitor
//! - Literal text processing shared by AST producers (`literal`)

pub mod arena;
pub mod literal;
pub mod node;
pub mod visit;
pub mod walk;

pub use arena::{AstArena, AstNode, Children, NodeId};
pub use node::*;
pub use visit::{AstVisitor, accept};
pub use walk::{AstListener, walk};
