//! CLI arguments for the `exclaim` binary.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "exclaim", version, about = "Compiler for the Exclaim chat-bot language")]
pub struct CliArgs {
    /// The source file to compile.
    pub file: PathBuf,

    /// Write the compiled output here instead of stdout. A `.mjs`
    /// extension is recommended so node runs it as a module.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Minimum severity a diagnostic needs to be shown.
    #[arg(short, long, value_enum, default_value = "warn")]
    pub verbosity: Verbosity,

    /// Treat warnings as errors.
    #[arg(short = 'w', long)]
    pub warn_is_error: bool,

    /// Keep going and emit output even when the compile produced errors.
    #[arg(long)]
    pub bypass_errors: bool,

    /// JSON file mapping event names to their handler parameter names.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Module specifier the generated program imports its runtime from.
    #[arg(long)]
    pub runtime: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    Info,
    Warn,
    Error,
}
