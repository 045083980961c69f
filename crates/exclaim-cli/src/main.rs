#![allow(clippy::print_stderr, clippy::print_stdout)]

use std::fs;
use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use exclaim_binder::EventsMap;
use exclaim_cli::args::CliArgs;
use exclaim_cli::reporting::{effective_severity, render, threshold};
use exclaim_cli::{Compilation, compile_entry};
use exclaim_common::Severity;
use exclaim_emitter::CompilerOptions;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let mut options = CompilerOptions::default();
    if let Some(events_path) = &args.events {
        let text = fs::read_to_string(events_path)
            .with_context(|| format!("could not read `{}`", events_path.display()))?;
        let events: EventsMap = serde_json::from_str(&text)
            .with_context(|| format!("`{}` is not an events table", events_path.display()))?;
        options.events = events;
    }
    if let Some(runtime) = &args.runtime {
        options.runtime_module = runtime.clone();
    }

    let Compilation {
        output,
        diagnostics,
    } = compile_entry(&args.file, &options)?;

    let minimum = threshold(args.verbosity);
    let mut failed = output.is_none();
    for diagnostic in &diagnostics {
        let severity = effective_severity(diagnostic, args.warn_is_error);
        if severity >= minimum {
            eprintln!("{}", render(diagnostic, args.warn_is_error));
        }
        if severity == Severity::Error {
            failed = true;
        }
    }

    if failed && !args.bypass_errors {
        return Ok(ExitCode::FAILURE);
    }

    let Some(output) = output else {
        // Nothing was generated; bypass cannot help here.
        return Ok(ExitCode::FAILURE);
    };
    match &args.out {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("could not write `{}`", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
