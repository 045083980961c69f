//! Diagnostic taxonomy and the ordered sink shared by every compiler pass.
//!
//! Passes never abort on a semantic error; they push a record here and keep
//! going so one compile surfaces as many problems as possible. Only the
//! outermost caller decides, from the aggregated severities, whether the
//! compile as a whole failed.

use std::fmt;

use crate::source::SourceInfo;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Every kind of diagnostic the compiler can produce, with a stable numeric
/// code. 1xxx: lexical/syntactic, 2xxx: imports and literals, 3xxx: binding,
/// 4xxx: code generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lex,
    Parse,
    UnknownImportFileType,
    NoImportTemplateString,
    InvalidNumber,
    DuplicateParameter,
    MultipleImplicitParameters,
    ParameterShadowsContext,
    LoopVariableShadows,
    ReservedFunctionSuffix,
    AssignToConst,
    AssignToFunction,
    SetOnNonPersistentVariable,
    UnknownDistribution,
    UnknownParser,
}

impl ErrorKind {
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::Lex => 1001,
            ErrorKind::Parse => 1002,
            ErrorKind::UnknownImportFileType => 2001,
            ErrorKind::NoImportTemplateString => 2002,
            ErrorKind::InvalidNumber => 2003,
            ErrorKind::DuplicateParameter => 3001,
            ErrorKind::MultipleImplicitParameters => 3002,
            ErrorKind::ParameterShadowsContext => 3003,
            ErrorKind::LoopVariableShadows => 3004,
            ErrorKind::ReservedFunctionSuffix => 3005,
            ErrorKind::AssignToConst => 4001,
            ErrorKind::AssignToFunction => 4002,
            ErrorKind::SetOnNonPersistentVariable => 4003,
            ErrorKind::UnknownDistribution => 4004,
            ErrorKind::UnknownParser => 4005,
        }
    }

    /// Warnings are the kinds a runtime fallback or harmless shadow exists
    /// for; everything else defaults to `Error`.
    pub fn default_severity(self) -> Severity {
        match self {
            ErrorKind::ParameterShadowsContext
            | ErrorKind::LoopVariableShadows
            | ErrorKind::UnknownDistribution
            | ErrorKind::UnknownParser => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EX{}", self.code())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub source: SourceInfo,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, source: SourceInfo, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            kind,
            severity: kind.default_severity(),
            source,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {} {}",
            self.severity, self.kind, self.source, self.message
        )
    }
}

/// Ordered diagnostic sink. Append-only; records come back out in the order
/// the passes encountered them.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.records.push(diagnostic);
    }

    /// Record a diagnostic at the kind's default severity.
    pub fn emit(&mut self, kind: ErrorKind, source: SourceInfo, message: impl Into<String>) {
        self.push(Diagnostic::new(kind, source, message));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.records
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.records.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn fallback_kinds_default_to_warning() {
        assert_eq!(
            ErrorKind::UnknownDistribution.default_severity(),
            Severity::Warning
        );
        assert_eq!(
            ErrorKind::UnknownParser.default_severity(),
            Severity::Warning
        );
        assert_eq!(ErrorKind::AssignToConst.default_severity(), Severity::Error);
    }

    #[test]
    fn sink_preserves_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.emit(ErrorKind::InvalidNumber, SourceInfo::builtin(), "first");
        diagnostics.emit(ErrorKind::Parse, SourceInfo::builtin(), "second");
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn display_includes_code_and_position() {
        let d = Diagnostic::new(
            ErrorKind::UnknownParser,
            SourceInfo::new("bot.exclm".into(), 7, 2),
            "no parser named `hex`",
        );
        assert_eq!(d.to_string(), "warning[EX4005] bot.exclm:7:2 no parser named `hex`");
    }
}
