//! The binding resolution pass.
//!
//! One depth-first walk over the program that builds the symbol table
//! chain, records the per-scope side table, and reports binding problems.
//! The pass never aborts: every diagnostic goes to the sink and the walk
//! continues, so one compile surfaces as many binding errors as it can.

use exclaim_ast::node::*;
use exclaim_ast::{AstArena, AstListener, NodeId, walk};
use exclaim_common::{Diagnostics, ErrorKind};
use rustc_hash::FxHashMap;

use crate::semantic_info::SemanticInfo;
use crate::symbol_table::{SymbolInfo, SymbolKind, SymbolTableId, SymbolTables};

/// Event name → parameter names the runtime passes to listeners of that
/// event. Unknown event names simply inject no parameters.
pub type EventsMap = FxHashMap<String, Vec<String>>;

/// Context variable names injected into every command scope.
pub const COMMAND_CONTEXT_FIELDS: &[&str] = &["message", "author"];

/// Suffix the code generator appends to the asynchronous copy of every
/// user function; user functions may not end with it.
pub const ASYNC_FN_SUFFIX: &str = "$async";

#[derive(Default)]
pub struct BinderOptions {
    /// Magic constant names the host injects at global scope.
    pub global_fields: Vec<String>,
    pub events: EventsMap,
}

/// Run binding resolution over a program. Builtin identifier nodes for the
/// injected names are allocated up front, which is why the arena is briefly
/// borrowed mutably; the walk itself never mutates it.
pub fn bind_program(
    arena: &mut AstArena,
    program: NodeId,
    options: &BinderOptions,
    diagnostics: &mut Diagnostics,
) -> SemanticInfo {
    let mut builtins: FxHashMap<String, NodeId> = FxHashMap::default();
    {
        let mut ensure = |name: &str, arena: &mut AstArena| {
            builtins
                .entry(name.to_string())
                .or_insert_with(|| arena.alloc_implicit_identifier(name));
        };
        for name in &options.global_fields {
            ensure(name, arena);
        }
        for name in COMMAND_CONTEXT_FIELDS {
            ensure(name, arena);
        }
        for parameters in options.events.values() {
            for name in parameters {
                ensure(name, arena);
            }
        }
    }

    let mut tables = SymbolTables::new();
    let root = tables.alloc(None);
    for name in &options.global_fields {
        tables.provide(
            root,
            name.clone(),
            SymbolInfo {
                kind: SymbolKind::Const,
                declared_by: builtins[name],
            },
        );
    }

    let mut generator = BindingsGenerator {
        diagnostics,
        tables,
        root,
        current: root,
        node_tables: FxHashMap::default(),
        builtins,
        global_fields: &options.global_fields,
        events: &options.events,
    };
    walk(&*arena, program, &mut generator);
    tracing::debug!(
        tables = generator.node_tables.len(),
        "binding resolution finished"
    );

    SemanticInfo {
        tables: generator.tables,
        root_table: generator.root,
        node_tables: generator.node_tables,
    }
}

struct BindingsGenerator<'a> {
    diagnostics: &'a mut Diagnostics,
    tables: SymbolTables,
    root: SymbolTableId,
    current: SymbolTableId,
    node_tables: FxHashMap<NodeId, SymbolTableId>,
    builtins: FxHashMap<String, NodeId>,
    global_fields: &'a [String],
    events: &'a EventsMap,
}

impl BindingsGenerator<'_> {
    fn push_table(&mut self, opened_by: NodeId) -> SymbolTableId {
        let table = self.tables.alloc(Some(self.current));
        self.current = table;
        self.node_tables.insert(opened_by, table);
        table
    }

    fn pop_table(&mut self) {
        self.current = self
            .tables
            .parent(self.current)
            .expect("scope exits are balanced with scope entries");
    }

    fn builtin(&self, name: &str) -> NodeId {
        self.builtins[name]
    }

    fn provide_local(&mut self, arena: &AstArena, table: SymbolTableId, identifier: NodeId) {
        self.tables.provide(
            table,
            arena.identifier_name(identifier).to_string(),
            SymbolInfo {
                kind: SymbolKind::Local,
                declared_by: identifier,
            },
        );
    }

    /// Shared parameter validation for commands and functions.
    fn check_parameters(
        &mut self,
        arena: &AstArena,
        what: &str,
        name: NodeId,
        parameters: &[NodeId],
        rest_param: Option<NodeId>,
        context_fields: &[&str],
    ) {
        let mut seen: Vec<&str> = Vec::new();
        let mut implicit_count = 0usize;
        for &param in parameters.iter().chain(rest_param.iter()) {
            let identifier = arena
                .identifier(param)
                .expect("parameters are identifier nodes");
            if identifier.implicit {
                implicit_count += 1;
                continue;
            }
            let param_name = identifier.name.as_str();
            if seen.contains(&param_name) {
                self.diagnostics.emit(
                    ErrorKind::DuplicateParameter,
                    arena.source(param).clone(),
                    format!(
                        "duplicate parameter `{param_name}` in {what} `{}`",
                        arena.identifier_name(name)
                    ),
                );
            } else {
                seen.push(param_name);
            }
            if context_fields.iter().any(|field| *field == param_name)
                || self.global_fields.iter().any(|field| field == param_name)
            {
                self.diagnostics.emit(
                    ErrorKind::ParameterShadowsContext,
                    arena.source(param).clone(),
                    format!("parameter `{param_name}` shadows a built-in context variable"),
                );
            }
        }
        if implicit_count > 1 {
            self.diagnostics.emit(
                ErrorKind::MultipleImplicitParameters,
                arena.source(name).clone(),
                format!(
                    "{what} `{}` takes more than one implicit parameter",
                    arena.identifier_name(name)
                ),
            );
        }
    }
}

impl AstListener for BindingsGenerator<'_> {
    fn enter_node(&mut self, arena: &AstArena, id: NodeId) {
        // Every value-producing statement binds its result name in the
        // current scope. A rejected add (an already-declared local) leaves
        // the first declaration authoritative.
        if let Some(target) = arena.kind(id).assign_target() {
            let name = arena.identifier_name(target);
            self.tables.add_field(
                self.current,
                name,
                SymbolInfo {
                    kind: SymbolKind::Local,
                    declared_by: target,
                },
            );
        }
    }

    fn enter_declare_variable(&mut self, arena: &AstArena, _id: NodeId, data: &DeclareVariable) {
        let kind = match data.variant {
            VariableVariant::Data => SymbolKind::Data,
            VariableVariant::Temp => SymbolKind::Temp,
        };
        self.tables.add_field(
            self.current,
            arena.identifier_name(data.name),
            SymbolInfo {
                kind,
                declared_by: data.name,
            },
        );
    }

    fn enter_group_definition(&mut self, _arena: &AstArena, id: NodeId, _data: &GroupDefinition) {
        self.push_table(id);
    }

    fn enter_while(&mut self, _arena: &AstArena, id: NodeId, _data: &While) {
        self.push_table(id);
    }

    fn enter_if(&mut self, _arena: &AstArena, id: NodeId, _data: &If) {
        self.push_table(id);
    }

    fn enter_command_definition(
        &mut self,
        arena: &AstArena,
        id: NodeId,
        data: &CommandDefinition,
    ) {
        self.check_parameters(
            arena,
            "command",
            data.name,
            &data.parameters,
            data.rest_param,
            COMMAND_CONTEXT_FIELDS,
        );
        let table = self.push_table(id);
        for field in COMMAND_CONTEXT_FIELDS {
            let declared_by = self.builtin(field);
            self.tables.provide(
                table,
                *field,
                SymbolInfo {
                    kind: SymbolKind::Const,
                    declared_by,
                },
            );
        }
        for &param in data.parameters.iter().chain(data.rest_param.iter()) {
            self.provide_local(arena, table, param);
        }
    }

    fn enter_function_definition(
        &mut self,
        arena: &AstArena,
        id: NodeId,
        data: &FunctionDefinition,
    ) {
        self.check_parameters(
            arena,
            "function",
            data.name,
            &data.parameters,
            data.rest_param,
            &[],
        );
        let function_name = arena.identifier_name(data.name);
        if function_name.ends_with(ASYNC_FN_SUFFIX) {
            self.diagnostics.emit(
                ErrorKind::ReservedFunctionSuffix,
                arena.source(data.name).clone(),
                format!("function names ending in `{ASYNC_FN_SUFFIX}` are reserved for generated code"),
            );
        }
        // The function's own name binds in the enclosing scope.
        self.tables.add_field(
            self.current,
            function_name,
            SymbolInfo {
                kind: SymbolKind::Function,
                declared_by: data.name,
            },
        );
        let table = self.push_table(id);
        for &param in data.parameters.iter().chain(data.rest_param.iter()) {
            self.provide_local(arena, table, param);
        }
    }

    fn enter_event_listener_definition(
        &mut self,
        _arena: &AstArena,
        id: NodeId,
        data: &EventListenerDefinition,
    ) {
        let parameters: Vec<String> = self.events.get(&data.event).cloned().unwrap_or_default();
        let table = self.push_table(id);
        for name in parameters {
            let declared_by = self.builtin(&name);
            self.tables.provide(
                table,
                name,
                SymbolInfo {
                    kind: SymbolKind::Const,
                    declared_by,
                },
            );
        }
    }

    fn enter_for_each(&mut self, arena: &AstArena, id: NodeId, data: &ForEach) {
        let name = arena.identifier_name(data.loop_variable);
        if self
            .tables
            .resolve(self.current, name, data.loop_variable)
            .is_some()
        {
            self.diagnostics.emit(
                ErrorKind::LoopVariableShadows,
                arena.source(data.loop_variable).clone(),
                format!("loop variable `{name}` shadows an existing variable"),
            );
        }
        let table = self.push_table(id);
        self.provide_local(arena, table, data.loop_variable);
    }

    fn exit_node(&mut self, arena: &AstArena, id: NodeId) {
        if arena.kind(id).opens_scope() {
            self.pop_table();
        }
    }
}
