//! Common types for the Exclaim compiler.
//!
//! This crate provides the foundational types shared by every phase:
//! - Source locations (`SourceInfo`)
//! - The diagnostic taxonomy and ordered sink (`Diagnostic`, `Diagnostics`)

pub mod diagnostics;
pub mod source;

pub use diagnostics::{Diagnostic, Diagnostics, ErrorKind, Severity};
pub use source::SourceInfo;
