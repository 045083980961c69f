//! Source location tracking.

use std::fmt;
use std::sync::Arc;

/// Where a node or diagnostic originated: file plus 1-based line/column.
///
/// Compiler-synthesized nodes (injected context variables, the implicit
/// result placeholder) carry the `#builtin` sentinel file instead of a real
/// position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceInfo {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

/// Sentinel file name for compiler-synthesized nodes.
pub const BUILTIN_FILE: &str = "#builtin";

impl SourceInfo {
    pub fn new(file: Arc<str>, line: u32, column: u32) -> SourceInfo {
        SourceInfo { file, line, column }
    }

    pub fn builtin() -> SourceInfo {
        SourceInfo {
            file: Arc::from(BUILTIN_FILE),
            line: 0,
            column: 0,
        }
    }

    pub fn is_builtin(&self) -> bool {
        &*self.file == BUILTIN_FILE
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_builtin() {
            f.write_str(BUILTIN_FILE)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_file_line_column() {
        let info = SourceInfo::new(Arc::from("bot.exclm"), 3, 14);
        assert_eq!(info.to_string(), "bot.exclm:3:14");
    }

    #[test]
    fn builtin_sentinel() {
        assert!(SourceInfo::builtin().is_builtin());
        assert!(!SourceInfo::new(Arc::from("a.exclm"), 1, 1).is_builtin());
    }
}
