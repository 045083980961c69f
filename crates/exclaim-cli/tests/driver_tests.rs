use std::fs;

use exclaim_common::ErrorKind;
use exclaim_emitter::CompilerOptions;

use exclaim_cli::compile_entry;

#[test]
fn compiles_an_entry_file() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("bot.exclm");
    fs::write(
        &entry,
        "data score = 0\ncommand add n { set score to score + n; send score }",
    )
    .unwrap();

    let compilation = compile_entry(&entry, &CompilerOptions::default()).unwrap();
    let output = compilation.output.expect("compilation should produce output");
    assert!(output.contains("$runtime.commands.add(\"add\",[]"));
    assert!(output.contains("$runtime.persistent.declareAll("));
    assert!(compilation.diagnostics.is_empty());
}

#[test]
fn inlines_exclaim_imports_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shared.exclm"), "data total = 0").unwrap();
    let entry = dir.path().join("bot.exclm");
    fs::write(
        &entry,
        "import \"./shared.exclm\"\nimport \"./shared.exclm\"\ncommand t { send total }",
    )
    .unwrap();

    let compilation = compile_entry(&entry, &CompilerOptions::default()).unwrap();
    let output = compilation.output.unwrap();
    // Declared exactly once despite being imported twice.
    assert_eq!(output.matches("let total=0;").count(), 1);
    assert!(compilation.diagnostics.is_empty());
}

#[test]
fn javascript_imports_pass_through() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("bot.exclm");
    fs::write(&entry, "import \"./helpers.js\"\ncommand t { fail }").unwrap();

    let compilation = compile_entry(&entry, &CompilerOptions::default()).unwrap();
    let output = compilation.output.unwrap();
    assert!(output.contains("import\"./helpers.js\";"));
}

#[test]
fn unknown_import_extensions_are_reported_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("bot.exclm");
    fs::write(&entry, "import \"./data.yaml\"\ncommand t { fail }").unwrap();

    let compilation = compile_entry(&entry, &CompilerOptions::default()).unwrap();
    assert_eq!(
        compilation
            .diagnostics
            .count_of(ErrorKind::UnknownImportFileType),
        1
    );
    let output = compilation.output.unwrap();
    assert!(!output.contains("data.yaml"));
}

#[test]
fn syntax_errors_halt_with_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("bot.exclm");
    fs::write(&entry, "command { {").unwrap();

    let compilation = compile_entry(&entry, &CompilerOptions::default()).unwrap();
    assert!(compilation.output.is_none());
    assert!(compilation.diagnostics.has_errors());
}
