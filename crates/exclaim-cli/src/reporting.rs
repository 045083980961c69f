//! Diagnostic rendering and the compile pass/fail policy.

use colored::Colorize;
use exclaim_common::{Diagnostic, Severity};

use crate::args::Verbosity;

pub fn threshold(verbosity: Verbosity) -> Severity {
    match verbosity {
        Verbosity::Info => Severity::Info,
        Verbosity::Warn => Severity::Warning,
        Verbosity::Error => Severity::Error,
    }
}

/// Effective severity after the warnings-are-errors promotion.
pub fn effective_severity(diagnostic: &Diagnostic, warn_is_error: bool) -> Severity {
    if warn_is_error && diagnostic.severity == Severity::Warning {
        Severity::Error
    } else {
        diagnostic.severity
    }
}

pub fn render(diagnostic: &Diagnostic, warn_is_error: bool) -> String {
    let severity = effective_severity(diagnostic, warn_is_error);
    let label = format!("{severity}[{}]", diagnostic.kind);
    let label = match severity {
        Severity::Error => label.as_str().red().bold(),
        Severity::Warning => label.as_str().yellow().bold(),
        Severity::Info => label.as_str().blue(),
    };
    let position = diagnostic.source.to_string();
    format!("{label} {} {}", position.as_str().dimmed(), diagnostic.message)
}
