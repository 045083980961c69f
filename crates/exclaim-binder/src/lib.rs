//! Name binding for the Exclaim compiler.
//!
//! This crate provides:
//! - The parent-linked symbol table arena (`SymbolTables`)
//! - The binding resolution pass (`bind_program`) — a tree walk that
//!   populates scopes, records the per-scope side table, and reports
//!   binding diagnostics without ever aborting
//! - `SemanticInfo`, the side table handed to the code generator

pub mod bindings;
pub mod semantic_info;
pub mod symbol_table;

pub use bindings::{
    ASYNC_FN_SUFFIX, BinderOptions, COMMAND_CONTEXT_FIELDS, EventsMap, bind_program,
};
pub use semantic_info::SemanticInfo;
pub use symbol_table::{SymbolInfo, SymbolKind, SymbolTable, SymbolTableId, SymbolTables};
