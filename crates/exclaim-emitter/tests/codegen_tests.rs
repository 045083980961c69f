use std::sync::Arc;

use exclaim_ast::AstArena;
use exclaim_binder::{BinderOptions, bind_program};
use exclaim_common::{Diagnostics, ErrorKind};
use exclaim_emitter::{CompilerOptions, generate_program};
use exclaim_parser::{PassthroughImports, parse_program};

fn compile_with(source: &str, options: CompilerOptions) -> (String, Diagnostics) {
    let mut arena = AstArena::new();
    let mut diagnostics = Diagnostics::new();
    let program = parse_program(
        source,
        Arc::from("test.exclm"),
        &mut arena,
        &mut diagnostics,
        &mut PassthroughImports,
    )
    .expect("source should parse");
    let binder_options = BinderOptions {
        global_fields: options.global_fields.clone(),
        events: options.events.clone(),
    };
    let info = bind_program(&mut arena, program, &binder_options, &mut diagnostics);
    let output = generate_program(&arena, program, &info, &options, &mut diagnostics);
    (output, diagnostics)
}

fn compile(source: &str) -> (String, Diagnostics) {
    compile_with(source, CompilerOptions::default())
}

/// Position of `needle` in `haystack`, asserting it occurs exactly once.
fn position(haystack: &str, needle: &str) -> usize {
    let first = haystack
        .find(needle)
        .unwrap_or_else(|| panic!("expected output to contain {needle:?}\noutput:\n{haystack}"));
    assert_eq!(
        haystack.matches(needle).count(),
        1,
        "expected exactly one occurrence of {needle:?}\noutput:\n{haystack}"
    );
    first
}

#[test]
fn data_set_lowers_to_persistence_then_notification() {
    let (output, diagnostics) = compile(
        "data score = 0\n\
         command add n { set score to (score + n); send score }",
    );
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    // Shadow declaration and registration with the persistence store.
    position(&output, "let score=0;");
    position(&output, "[\"score\",0,$v=>{score=$v;}]");

    // The handler destructures one positional argument with arity
    // fallthrough.
    position(&output, "if($args.length<1)return\"failed-args\";");
    position(&output, "const[n]=$args;");

    // Write: persistence set, then change notification, in that order,
    // never the reverse, never either alone.
    let set_call = position(&output, "await $runtime.persistent.set(\"score\",$value);");
    let notify = position(&output, "$runtime.notifySet(\"score\",$value);");
    assert!(set_call < notify);
    position(&output, "const $value=(score)+(n);");

    // The later send reads the (runtime-synced) shadow.
    position(&output, "await $runtime.sendMessage(message,score);");
}

#[test]
fn program_assembly_defers_wiring_until_declare_all() {
    let (output, _) = compile(
        "data score = 0\n\
         command show { send score }",
    );
    let declare_all = position(&output, "$runtime.persistent.declareAll([");
    let register = position(&output, "$runtime.commands.add(\"show\",[]");
    let start = position(&output, "return $runtime.start();});");
    assert!(declare_all < register && register < start);
}

#[test]
fn commands_with_fixed_arity_reject_missing_arguments() {
    let (output, _) = compile("command pair a b { send a }");
    position(&output, "if($args.length<2)return\"failed-args\";");
    position(&output, "const[a,b]=$args;");
}

#[test]
fn list_rest_parameters_collect_remaining_tokens() {
    let (output, _) = compile("command tally a ...rest { send a }");
    position(&output, "const[a,...rest]=$args;");
}

#[test]
fn string_rest_parameters_capture_the_remainder() {
    let (output, _) = compile("command say target text... { send text }");
    position(
        &output,
        "const $match=/^\\s*(\\S+)\\s+([\\s\\S]+)$/.exec($rest);",
    );
    position(&output, "if($match===null)return\"failed-args\";");
    position(&output, "const[,target,text]=$match;");
}

#[test]
fn bare_string_rest_takes_the_whole_input() {
    let (output, _) = compile("command echo text... { send text }");
    position(&output, "const text=$rest;");
}

#[test]
fn temp_writes_assign_directly_and_notify() {
    let (output, diagnostics) = compile(
        "temp hits = 0\n\
         command hit { set hits to hits + 1 }",
    );
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    position(&output, "hits=(hits)+(1);$runtime.notifySet(\"hits\",hits);");
    assert!(!output.contains("persistent.set(\"hits\""));
}

#[test]
fn nested_data_writes_use_the_key_path_form() {
    let (output, _) = compile(
        "data profile = {wins: 0}\n\
         command win { set wins of profile to 1 }",
    );
    position(
        &output,
        "await $runtime.persistent.setNested(\"profile\",[\"wins\"],$value);",
    );
    position(&output, "$runtime.notifySet(\"profile\",profile);");
}

#[test]
fn set_on_a_local_is_an_error_but_still_emits() {
    let (output, diagnostics) = compile(
        "command c { pick first from [1] as x\n set x to 2 }",
    );
    assert_eq!(
        diagnostics.count_of(ErrorKind::SetOnNonPersistentVariable),
        1
    );
    position(&output, "x=2;");
}

#[test]
fn writes_to_context_constants_are_rejected() {
    let (output, diagnostics) = compile("command c { set message to 1 }");
    assert_eq!(diagnostics.count_of(ErrorKind::AssignToConst), 1);
    position(&output, "message=1;");
}

#[test]
fn first_binding_declares_rebinding_does_not() {
    let (output, _) = compile(
        "command c {\n\
           pick first from [1] as x\n\
           pick last from [2] as x\n\
         }",
    );
    position(&output, "let x=([1])[0];");
    position(&output, "x=([2])[([2]).length-1];");
}

#[test]
fn outer_shadow_gets_a_fresh_declaration() {
    let (output, _) = compile(
        "temp count = 0\n\
         command c {\n\
           send count\n\
           pick first from [1, 2] as count\n\
         }",
    );
    // The module-level shadow and the command-local binding.
    position(&output, "let count=0;");
    position(&output, "let count=([1,2])[0];");
}

#[test]
fn unknown_distributions_fall_back_with_one_warning() {
    let (output, diagnostics) = compile("command c { pick weighted from [1, 2] }");
    assert_eq!(diagnostics.count_of(ErrorKind::UnknownDistribution), 1);
    position(&output, "$runtime.runDistribution(\"weighted\",([1,2]));");
}

#[test]
fn unknown_parsers_fall_back_with_one_warning() {
    let (output, diagnostics) = compile("command c raw { parse raw as hex }");
    assert_eq!(diagnostics.count_of(ErrorKind::UnknownParser), 1);
    position(&output, "$runtime.runParser(\"hex\",(raw));");
}

#[test]
fn parse_with_else_wraps_in_try_catch() {
    let (output, _) = compile("command c raw { parse raw as integer as n else { fail } }");
    position(&output, "let n;");
    position(&output, "try{n=");
    position(&output, "catch($err){throw new Error(\"Command failed\");}");
}

#[test]
fn is_expressions_use_the_parser_test() {
    let (output, _) = compile("command c x { if x is integer { send x } }");
    position(&output, "($x=>Math.floor($x)===$x)((x))");
}

#[test]
fn is_not_negates() {
    let (output, _) = compile("command c x { if x is not number { fail } }");
    position(&output, "!(typeof (x)==='number')");
}

#[test]
fn try_parse_parsers_probe_with_try_catch() {
    let (output, _) = compile("command c x { if x is json { fail } }");
    position(
        &output,
        "($x=>{try{JSON.parse($x);return true;}catch($e){return false;}})((x))",
    );
}

#[test]
fn sync_functions_emit_working_bodies() {
    let (output, _) = compile("function double n { n * 2 }");
    position(&output, "function double(n){let it=(n)*(2);return it;}");
    position(&output, "async function double$async(n){let it=(n)*(2);return it;}");
}

#[test]
fn suspending_functions_emit_a_sync_stub() {
    let (output, _) = compile("function shout msg { send msg }");
    position(
        &output,
        "function shout(msg){throw new Error(\"shout requires an asynchronous caller; use shout$async\");}",
    );
    position(
        &output,
        "async function shout$async(msg){await $runtime.sendMessage(message,msg);}",
    );
}

#[test]
fn invocations_await_the_async_copy_in_async_contexts() {
    let (output, _) = compile(
        "function double n { n * 2 }\n\
         command c { send double(3) }",
    );
    position(&output, "await $runtime.sendMessage(message,(await double$async(3)));");
    // The sync body calls itself synchronously.
    position(&output, "function double(n){");
}

#[test]
fn commands_in_groups_register_with_their_path() {
    let (output, _) = compile("group admin { group db { command reset { fail } } }");
    position(&output, "$runtime.commands.add(\"reset\",[\"admin\",\"db\"]");
}

#[test]
fn event_listeners_register_with_configured_parameters() {
    let mut options = CompilerOptions::default();
    options.events.insert(
        "messageDeleted".to_string(),
        vec!["message".to_string(), "channel".to_string()],
    );
    let (output, _) = compile_with(
        "on messageDeleted { react to message with \"x\" }",
        options,
    );
    position(
        &output,
        "$runtime.events.register(\"messageDeleted\",async(message,channel)=>{",
    );
    position(&output, "await $runtime.reactToMessage((message),\"x\");");
}

#[test]
fn collection_mutations_on_data_roots_persist() {
    let (output, _) = compile(
        "data scores = []\n\
         command c n { add n to scores }",
    );
    position(&output, "(scores).push((n));");
    let persist = position(&output, "await $runtime.persistent.set(\"scores\",scores);");
    let notify = position(&output, "$runtime.notifySet(\"scores\",scores);");
    assert!(persist < notify);
}

#[test]
fn collection_reads_bind_results() {
    let (output, _) = compile("command c { [1, 2] as xs; get 0 of xs as x; size of xs as n }");
    position(&output, "let xs=[1,2];");
    position(&output, "let x=(xs)[(0)];");
    position(&output, "let n=(xs).length;");
}

#[test]
fn template_strings_emit_backtick_literals() {
    let (output, _) = compile("command c { send \"You got {score} points!\" }");
    position(&output, "`You got ${score} points!`");
}

#[test]
fn module_imports_precede_the_context_object() {
    let (output, _) = compile(
        "import { roll } from \"./dice.js\"\n\
         import \"./extra.js\"\n\
         data x = 0",
    );
    let runtime = position(&output, "import{$runtime}from\"@exclaim/runtime\";");
    let module = position(&output, "import{roll}from\"./dice.js\";");
    let file = position(&output, "import\"./extra.js\";");
    let context = position(&output, "const $context=$runtime.context;");
    assert!(runtime < module && module < file && file < context);
}

#[test]
fn global_fields_destructure_from_the_context() {
    let mut options = CompilerOptions::default();
    options.global_fields = vec!["bot".to_string()];
    let (output, _) = compile_with("command c { send bot }", options);
    position(&output, "const{bot}=$context;");
}
