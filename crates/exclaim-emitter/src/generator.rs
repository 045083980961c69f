//! The code generation visitor.
//!
//! `CodeGenerator` lowers a bound program into one JavaScript module,
//! writing into an output buffer through small helpers. Expression and
//! statement lowerings live in the sibling files; this file owns the
//! visitor plumbing: buffer management, scope tracking against the
//! binder's side table, and the sync-lowering abort machinery used for
//! dual function emission.

mod declarations;
mod expressions;
mod statements;

use exclaim_ast::node::*;
use exclaim_ast::{AstArena, AstVisitor, NodeId, accept};
use exclaim_binder::{SemanticInfo, SymbolTableId};
use exclaim_common::Diagnostics;

use crate::options::CompilerOptions;

/// Marker for "this construct needs suspension" raised while lowering a
/// function body in synchronous mode. Never escapes a program-level emit.
pub struct Suspend;

pub type EmitResult = Result<(), Suspend>;

/// Lower a bound program to JavaScript source text. Best-effort: semantic
/// problems are reported through the sink and emission continues.
pub fn generate_program(
    arena: &AstArena,
    program: NodeId,
    info: &SemanticInfo,
    options: &CompilerOptions,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut generator = CodeGenerator {
        arena,
        info,
        options,
        diagnostics,
        out: String::new(),
        current_table: info.root_table,
        scope_stack: Vec::new(),
        group_path: Vec::new(),
        in_async: false,
    };
    if accept(arena, program, &mut generator).is_err() {
        // Suspension is only raised inside function bodies and handled
        // there; reaching this point would be a generator bug.
        tracing::warn!("suspension escaped to the program level");
    }
    tracing::debug!(bytes = generator.out.len(), "code generation finished");
    generator.out
}

pub(crate) struct CodeGenerator<'a> {
    pub(crate) arena: &'a AstArena,
    pub(crate) info: &'a SemanticInfo,
    pub(crate) options: &'a CompilerOptions,
    pub(crate) diagnostics: &'a mut Diagnostics,
    pub(crate) out: String,
    /// The symbol table governing the node currently being lowered, kept in
    /// sync with the binder's side table while descending.
    pub(crate) current_table: SymbolTableId,
    scope_stack: Vec<(NodeId, SymbolTableId)>,
    /// Enclosing group names, outermost first; commands register under this
    /// path.
    pub(crate) group_path: Vec<String>,
    /// Whether the surrounding lowering context may suspend (command and
    /// event handler bodies, async function bodies).
    pub(crate) in_async: bool,
}

impl<'a> CodeGenerator<'a> {
    pub(crate) fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub(crate) fn emit(&mut self, id: NodeId) -> EmitResult {
        accept(self.arena, id, self)
    }

    /// Emit `id` into a side buffer and hand the text back, leaving the
    /// main buffer untouched (also on failure).
    pub(crate) fn capture(&mut self, id: NodeId) -> Result<String, Suspend> {
        let start = self.out.len();
        match self.emit(id) {
            Ok(()) => Ok(self.out.split_off(start)),
            Err(suspend) => {
                self.out.truncate(start);
                Err(suspend)
            }
        }
    }

    pub(crate) fn emit_statements(&mut self, statements: &[NodeId]) -> EmitResult {
        for &statement in statements {
            self.emit(statement)?;
        }
        Ok(())
    }

    /// Fail unless the context allows suspension; suspending constructs
    /// call this before writing anything.
    pub(crate) fn require_async(&self) -> EmitResult {
        if self.in_async { Ok(()) } else { Err(Suspend) }
    }

    /// The assignment prefix for a value statement's result binding:
    /// `let name` when this occurrence is the binding the resolver recorded
    /// as the declaration, plain `name` for rebindings.
    pub(crate) fn assignment_prefix(&self, target: NodeId) -> String {
        let name = self.arena.identifier_name(target);
        match self.info.resolve(self.current_table, name, target) {
            Some(info) if info.declared_by == target => format!("let {name}"),
            _ => name.to_string(),
        }
    }

    /// Lowers an object key to the text inside a `[...]` subscript.
    pub(crate) fn reference_key(&mut self, key: NodeId) -> Result<String, Suspend> {
        match self.arena.kind(key) {
            NodeKind::Identifier(identifier) => Ok(js_string(&identifier.name)),
            NodeKind::RawStringLiteral(string) => Ok(js_string(&string.value)),
            NodeKind::NumberLiteral(number) => Ok(js_number(number.value)),
            _ => self.capture(key),
        }
    }

    /// Splits an lvalue into its root identifier (when it is a plain name)
    /// and the reference chain applied to it.
    pub(crate) fn lvalue_parts(&self, lvalue: NodeId) -> (Option<NodeId>, &'a [NodeId]) {
        let arena: &'a AstArena = self.arena;
        match arena.kind(lvalue) {
            NodeKind::Identifier(_) => (Some(lvalue), &[]),
            NodeKind::OfExpression(of) => {
                let root = match arena.kind(of.root) {
                    NodeKind::Identifier(_) => Some(of.root),
                    _ => None,
                };
                (root, &of.reference_chain)
            }
            _ => (None, &[]),
        }
    }
}

/// JSON-compatible string literal text, quotes included.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).expect("string serialization is infallible")
}

pub(crate) fn js_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{value}")
    }
}

/// Escape a text fragment for inclusion in a backtick template literal.
pub(crate) fn template_text(text: &str) -> String {
    let json = js_string(text);
    json[1..json.len() - 1].replace('`', "\\`").replace("${", "\\${")
}

impl AstVisitor<EmitResult> for CodeGenerator<'_> {
    fn before_visit(&mut self, _arena: &AstArena, id: NodeId) {
        if let Some(&table) = self.info.node_tables.get(&id) {
            self.scope_stack.push((id, self.current_table));
            self.current_table = table;
        }
    }

    fn after_visit(&mut self, _arena: &AstArena, id: NodeId) {
        if let Some(&(top, previous)) = self.scope_stack.last()
            && top == id
        {
            self.scope_stack.pop();
            self.current_table = previous;
        }
    }

    fn visit_program(&mut self, _arena: &AstArena, _id: NodeId, data: &Program) -> EmitResult {
        self.emit_program(data)
    }

    fn visit_file_import(&mut self, _arena: &AstArena, _id: NodeId, data: &FileImport) -> EmitResult {
        self.emit_file_import(data)
    }

    fn visit_module_import(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &ModuleImport,
    ) -> EmitResult {
        self.emit_module_import(data)
    }

    fn visit_declare_variable(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &DeclareVariable,
    ) -> EmitResult {
        self.emit_declare_variable(data)
    }

    fn visit_group_definition(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &GroupDefinition,
    ) -> EmitResult {
        self.emit_group_definition(data)
    }

    fn visit_command_definition(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &CommandDefinition,
    ) -> EmitResult {
        self.emit_command_definition(data)
    }

    fn visit_function_definition(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &FunctionDefinition,
    ) -> EmitResult {
        self.emit_function_definition(data)
    }

    fn visit_event_listener_definition(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &EventListenerDefinition,
    ) -> EmitResult {
        self.emit_event_listener_definition(data)
    }

    fn visit_for_each(&mut self, _arena: &AstArena, _id: NodeId, data: &ForEach) -> EmitResult {
        self.emit_for_each(data)
    }

    fn visit_while(&mut self, _arena: &AstArena, _id: NodeId, data: &While) -> EmitResult {
        self.emit_while(data)
    }

    fn visit_if(&mut self, _arena: &AstArena, _id: NodeId, data: &If) -> EmitResult {
        self.emit_if(data)
    }

    fn visit_send(&mut self, _arena: &AstArena, id: NodeId, data: &Send) -> EmitResult {
        self.emit_send(id, data)
    }

    fn visit_react(&mut self, _arena: &AstArena, _id: NodeId, data: &React) -> EmitResult {
        self.emit_react(data)
    }

    fn visit_fail(&mut self, _arena: &AstArena, _id: NodeId, _data: &Fail) -> EmitResult {
        self.emit_fail()
    }

    fn visit_set(&mut self, _arena: &AstArena, id: NodeId, data: &Set) -> EmitResult {
        self.emit_set(id, data)
    }

    fn visit_pick(&mut self, _arena: &AstArena, id: NodeId, data: &Pick) -> EmitResult {
        self.emit_pick(id, data)
    }

    fn visit_parse(&mut self, _arena: &AstArena, id: NodeId, data: &Parse) -> EmitResult {
        self.emit_parse(id, data)
    }

    fn visit_expr_statement(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &ExprStatement,
    ) -> EmitResult {
        self.emit_expr_statement(data)
    }

    fn visit_collection_access(
        &mut self,
        _arena: &AstArena,
        id: NodeId,
        data: &CollectionAccess,
    ) -> EmitResult {
        self.emit_collection_access(id, data)
    }

    fn visit_is_expression(
        &mut self,
        _arena: &AstArena,
        id: NodeId,
        data: &IsExpression,
    ) -> EmitResult {
        self.emit_is_expression(id, data)
    }

    fn visit_relational_expression(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &RelationalExpression,
    ) -> EmitResult {
        self.emit_relational_expression(data)
    }

    fn visit_binary_op_expression(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &BinaryOpExpression,
    ) -> EmitResult {
        self.emit_binary_op_expression(data)
    }

    fn visit_unary_op_expression(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &UnaryOpExpression,
    ) -> EmitResult {
        self.emit_unary_op_expression(data)
    }

    fn visit_invoke_expression(
        &mut self,
        _arena: &AstArena,
        id: NodeId,
        data: &InvokeExpression,
    ) -> EmitResult {
        self.emit_invoke_expression(id, data)
    }

    fn visit_of_expression(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &OfExpression,
    ) -> EmitResult {
        self.emit_of_expression(data)
    }

    fn visit_identifier(&mut self, _arena: &AstArena, _id: NodeId, data: &Identifier) -> EmitResult {
        self.emit_identifier(data)
    }

    fn visit_javascript_escape(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &JavascriptEscape,
    ) -> EmitResult {
        self.emit_javascript_escape(data)
    }

    fn visit_raw_string_literal(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &RawStringLiteral,
    ) -> EmitResult {
        self.emit_raw_string_literal(data)
    }

    fn visit_template_string_literal(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &TemplateStringLiteral,
    ) -> EmitResult {
        self.emit_template_string_literal(data)
    }

    fn visit_number_literal(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &NumberLiteral,
    ) -> EmitResult {
        self.emit_number_literal(data)
    }

    fn visit_boolean_literal(
        &mut self,
        _arena: &AstArena,
        _id: NodeId,
        data: &BooleanLiteral,
    ) -> EmitResult {
        self.emit_boolean_literal(data)
    }

    fn visit_list_literal(&mut self, _arena: &AstArena, _id: NodeId, data: &ListLiteral) -> EmitResult {
        self.emit_list_literal(data)
    }

    fn visit_dict_literal(&mut self, _arena: &AstArena, _id: NodeId, data: &DictLiteral) -> EmitResult {
        self.emit_dict_literal(data)
    }
}
