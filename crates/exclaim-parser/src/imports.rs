//! Import resolution hooks.
//!
//! The parser delegates every `import "<file>"` declaration to a resolver.
//! The driver decides by extension: Exclaim sources are inlined, JavaScript
//! sources become passthrough imports in the output, anything else is
//! skipped (after the resolver reports a diagnostic). Inlined files are
//! visited at most once per compilation; tracking the visited set is the
//! resolver's job.

use std::sync::Arc;

use exclaim_common::{Diagnostics, SourceInfo};

pub enum ImportResolution {
    /// Parse this source in place of the import declaration.
    Inline { source: String, file: Arc<str> },
    /// Keep the import as a declaration for the emitter to pass through.
    Passthrough,
    /// Drop the declaration entirely.
    Skip,
}

pub trait ImportResolver {
    fn resolve(
        &mut self,
        filename: &str,
        importer: &SourceInfo,
        diagnostics: &mut Diagnostics,
    ) -> ImportResolution;
}

/// Resolver that never reads the filesystem: every file import becomes a
/// passthrough import declaration. Useful in tests and for single-file
/// compiles.
pub struct PassthroughImports;

impl ImportResolver for PassthroughImports {
    fn resolve(
        &mut self,
        _filename: &str,
        _importer: &SourceInfo,
        _diagnostics: &mut Diagnostics,
    ) -> ImportResolution {
        ImportResolution::Passthrough
    }
}
