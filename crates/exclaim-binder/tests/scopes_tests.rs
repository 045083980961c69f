use std::sync::Arc;

use exclaim_ast::node::*;
use exclaim_ast::{AstArena, NodeId};
use exclaim_binder::{BinderOptions, SemanticInfo, SymbolKind, bind_program};
use exclaim_common::{Diagnostics, ErrorKind};
use exclaim_parser::{PassthroughImports, parse_program};

struct Bound {
    arena: AstArena,
    diagnostics: Diagnostics,
    info: SemanticInfo,
    program: NodeId,
}

fn bind(source: &str) -> Bound {
    bind_with(source, BinderOptions::default())
}

fn bind_with(source: &str, options: BinderOptions) -> Bound {
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
    let info = bind_program(&mut arena, program, &options, &mut diagnostics);
    Bound {
        arena,
        diagnostics,
        info,
        program,
    }
}

fn first_command<'a>(bound: &'a Bound) -> (NodeId, &'a CommandDefinition) {
    let NodeKind::Program(program) = bound.arena.kind(bound.program) else {
        panic!();
    };
    for &declaration in &program.declarations {
        if let NodeKind::CommandDefinition(command) = bound.arena.kind(declaration) {
            return (declaration, command);
        }
    }
    panic!("no command in program");
}

#[test]
fn declared_variables_land_in_the_root_table() {
    let bound = bind("data score = 0\ntemp hits = 0");
    let score = bound
        .info
        .resolve(bound.info.root_table, "score", NodeId(u32::MAX))
        .unwrap();
    assert_eq!(score.kind, SymbolKind::Data);
    let hits = bound
        .info
        .resolve(bound.info.root_table, "hits", NodeId(u32::MAX))
        .unwrap();
    assert_eq!(hits.kind, SymbolKind::Temp);
}

#[test]
fn commands_see_injected_context_and_parameters() {
    let bound = bind("command add n { send n }");
    let (command_id, command) = first_command(&bound);
    let table = bound.info.node_tables[&command_id];
    let message = bound.info.resolve(table, "message", NodeId(0)).unwrap();
    assert_eq!(message.kind, SymbolKind::Const);
    let n = bound.info.resolve(table, "n", NodeId(u32::MAX)).unwrap();
    assert_eq!(n.kind, SymbolKind::Local);
    assert_eq!(n.declared_by, command.parameters[0]);
}

/// The identity-ordered visibility property: an outer `count` referenced
/// before a later `pick ... as count` in the same command body must
/// resolve to the outer binding, not the inner local.
#[test]
fn earlier_references_resolve_to_outer_bindings() {
    let bound = bind(
        "temp count = 0\n\
         command show {\n\
           send count\n\
           pick first from [1, 2] as count\n\
           send count\n\
         }",
    );
    let (command_id, command) = first_command(&bound);
    let table = bound.info.node_tables[&command_id];

    let NodeKind::Send(first_send) = bound.arena.kind(command.statements[0]) else {
        panic!();
    };
    let before = bound
        .info
        .resolve(table, "count", first_send.message)
        .unwrap();
    assert_eq!(before.kind, SymbolKind::Temp, "earlier use sees outer temp");

    let NodeKind::Send(second_send) = bound.arena.kind(command.statements[2]) else {
        panic!();
    };
    let after = bound
        .info
        .resolve(table, "count", second_send.message)
        .unwrap();
    assert_eq!(after.kind, SymbolKind::Local, "later use sees new local");
    let NodeKind::Pick(pick) = bound.arena.kind(command.statements[1]) else {
        panic!();
    };
    assert_eq!(after.declared_by, pick.assign_to);
}

#[test]
fn redeclaring_a_local_keeps_the_first_declaration() {
    let bound = bind(
        "command c {\n\
           pick first from [1] as x\n\
           pick last from [2] as x\n\
           send x\n\
         }",
    );
    let (command_id, command) = first_command(&bound);
    let table = bound.info.node_tables[&command_id];
    let NodeKind::Pick(first_pick) = bound.arena.kind(command.statements[0]) else {
        panic!();
    };
    let info = bound.info.resolve(table, "x", NodeId(u32::MAX)).unwrap();
    assert_eq!(info.declared_by, first_pick.assign_to);
}

#[test]
fn functions_bind_their_name_in_the_enclosing_scope() {
    let bound = bind("function double n { n * 2 }");
    let double = bound
        .info
        .resolve(bound.info.root_table, "double", NodeId(u32::MAX))
        .unwrap();
    assert_eq!(double.kind, SymbolKind::Function);
}

#[test]
fn duplicate_parameters_are_reported() {
    let bound = bind("command c a a { send a }");
    assert_eq!(bound.diagnostics.count_of(ErrorKind::DuplicateParameter), 1);
}

#[test]
fn multiple_implicit_parameters_are_reported() {
    let bound = bind("command c _ _ { send it }");
    assert_eq!(
        bound
            .diagnostics
            .count_of(ErrorKind::MultipleImplicitParameters),
        1
    );
}

#[test]
fn parameters_shadowing_context_warn() {
    let bound = bind("command c message { send message }");
    assert_eq!(
        bound
            .diagnostics
            .count_of(ErrorKind::ParameterShadowsContext),
        1
    );
}

#[test]
fn reserved_async_suffix_is_reported() {
    let bound = bind("function f$async { send 1 }");
    assert_eq!(
        bound
            .diagnostics
            .count_of(ErrorKind::ReservedFunctionSuffix),
        1
    );
}

#[test]
fn loop_variables_shadowing_warn_and_bind() {
    let bound = bind(
        "temp item = 0\n\
         command c { for each item in [1, 2] { send item } }",
    );
    assert_eq!(
        bound.diagnostics.count_of(ErrorKind::LoopVariableShadows),
        1
    );
    let (_, command) = first_command(&bound);
    let NodeKind::ForEach(for_each) = bound.arena.kind(command.statements[0]) else {
        panic!();
    };
    let loop_table = bound.info.node_tables[&command.statements[0]];
    let NodeKind::Send(send) = bound.arena.kind(for_each.statements[0]) else {
        panic!();
    };
    let info = bound.info.resolve(loop_table, "item", send.message).unwrap();
    assert_eq!(info.kind, SymbolKind::Local);
    assert_eq!(info.declared_by, for_each.loop_variable);
}

#[test]
fn event_listeners_inject_configured_parameters() {
    let mut events = exclaim_binder::EventsMap::default();
    events.insert(
        "messageDeleted".to_string(),
        vec!["message".to_string(), "channel".to_string()],
    );
    let bound = bind_with(
        "on messageDeleted { send channel }\non unknownEvent { send 1 }",
        BinderOptions {
            global_fields: Vec::new(),
            events,
        },
    );
    let NodeKind::Program(program) = bound.arena.kind(bound.program) else {
        panic!();
    };
    let listener_table = bound.info.node_tables[&program.declarations[0]];
    let channel = bound
        .info
        .resolve(listener_table, "channel", NodeId(0))
        .unwrap();
    assert_eq!(channel.kind, SymbolKind::Const);

    // Unknown events inject nothing and produce no diagnostic.
    let unknown_table = bound.info.node_tables[&program.declarations[1]];
    assert!(bound.info.resolve(unknown_table, "channel", NodeId(0)).is_none());
    assert!(bound.diagnostics.is_empty());
}

#[test]
fn global_fields_are_visible_everywhere() {
    let bound = bind_with(
        "command c { send bot }",
        BinderOptions {
            global_fields: vec!["bot".to_string()],
            events: exclaim_binder::EventsMap::default(),
        },
    );
    let (command_id, _) = first_command(&bound);
    let table = bound.info.node_tables[&command_id];
    let bot = bound.info.resolve(table, "bot", NodeId(0)).unwrap();
    assert_eq!(bot.kind, SymbolKind::Const);
}

#[test]
fn if_and_while_open_scopes() {
    let bound = bind("command c { if true { 1 + 1 as x } send 2 }");
    let (command_id, command) = first_command(&bound);
    let if_id = command.statements[0];
    assert!(bound.info.node_tables.contains_key(&if_id));
    let if_table = bound.info.node_tables[&if_id];
    assert_ne!(if_table, bound.info.node_tables[&command_id]);
    // The local bound inside the if lives in the if's table.
    let x = bound.info.resolve(if_table, "x", NodeId(u32::MAX)).unwrap();
    assert_eq!(x.kind, SymbolKind::Local);
    assert!(
        bound
            .info
            .resolve(bound.info.node_tables[&command_id], "x", NodeId(u32::MAX))
            .is_none()
    );
}
