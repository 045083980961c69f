//! Compilation driver: file loading, import resolution against the
//! filesystem, and the parse → bind → generate pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use exclaim_ast::AstArena;
use exclaim_binder::{BinderOptions, bind_program};
use exclaim_common::{Diagnostic, Diagnostics, ErrorKind, SourceInfo};
use exclaim_emitter::{CompilerOptions, generate_program};
use exclaim_parser::{ImportResolution, ImportResolver, parse_program};
use rustc_hash::FxHashSet;

pub struct Compilation {
    /// `None` when a lexical or syntactic failure halted the pipeline.
    pub output: Option<String>,
    pub diagnostics: Diagnostics,
}

/// Compile one entry file with its imports.
pub fn compile_entry(entry: &Path, options: &CompilerOptions) -> anyhow::Result<Compilation> {
    let _span = tracing::info_span!("compile", file = %entry.display()).entered();
    let source = fs::read_to_string(entry)
        .with_context(|| format!("could not read `{}`", entry.display()))?;
    let file: Arc<str> = Arc::from(entry.display().to_string().as_str());

    let mut diagnostics = Diagnostics::new();
    let mut resolver = FsImportResolver::new(entry);
    let mut arena = AstArena::new();
    let program = match parse_program(&source, file, &mut arena, &mut diagnostics, &mut resolver) {
        Ok(program) => program,
        Err(fatal) => {
            diagnostics.push(fatal);
            return Ok(Compilation {
                output: None,
                diagnostics,
            });
        }
    };

    let binder_options = BinderOptions {
        global_fields: options.global_fields.clone(),
        events: options.events.clone(),
    };
    let info = bind_program(&mut arena, program, &binder_options, &mut diagnostics);
    let output = generate_program(&arena, program, &info, options, &mut diagnostics);
    Ok(Compilation {
        output: Some(output),
        diagnostics,
    })
}

/// Resolves `import "<file>"` declarations against the filesystem.
/// Exclaim sources inline (each at most once); JavaScript and
/// extensionless paths pass through for node to resolve; anything else is
/// reported and skipped.
struct FsImportResolver {
    seen: FxHashSet<PathBuf>,
}

impl FsImportResolver {
    fn new(entry: &Path) -> FsImportResolver {
        let mut seen = FxHashSet::default();
        seen.insert(normalize(entry));
        FsImportResolver { seen }
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

impl ImportResolver for FsImportResolver {
    fn resolve(
        &mut self,
        filename: &str,
        importer: &SourceInfo,
        diagnostics: &mut Diagnostics,
    ) -> ImportResolution {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        match extension {
            // Node resolves these at runtime.
            "js" | "mjs" | "cjs" | "" => ImportResolution::Passthrough,
            "exclm" => {
                let importer_dir = Path::new(&*importer.file)
                    .parent()
                    .unwrap_or_else(|| Path::new("."));
                let path = importer_dir.join(filename);
                let normalized = normalize(&path);
                if !self.seen.insert(normalized) {
                    // Already inlined once this compilation.
                    return ImportResolution::Skip;
                }
                match fs::read_to_string(&path) {
                    Ok(source) => ImportResolution::Inline {
                        source,
                        file: Arc::from(path.display().to_string().as_str()),
                    },
                    Err(error) => {
                        diagnostics.push(Diagnostic::new(
                            ErrorKind::Parse,
                            importer.clone(),
                            format!("cannot read imported file `{filename}`: {error}"),
                        ));
                        ImportResolution::Skip
                    }
                }
            }
            _ => {
                diagnostics.emit(
                    ErrorKind::UnknownImportFileType,
                    importer.clone(),
                    format!("unknown file extension for file `{filename}`"),
                );
                ImportResolution::Skip
            }
        }
    }
}
