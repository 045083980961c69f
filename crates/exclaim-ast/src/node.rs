//! Node kinds and their payloads.
//!
//! The AST is a closed sum type: every node is `{ id, source, kind }` where
//! `kind` carries the variant payload. The classification predicates at the
//! bottom are the single source of truth consulted by the binder and the
//! code generator; keep them exhaustive when adding variants.

use crate::arena::NodeId;

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Program(Program),
    FileImport(FileImport),
    ModuleImport(ModuleImport),
    DeclareVariable(DeclareVariable),
    GroupDefinition(GroupDefinition),
    CommandDefinition(CommandDefinition),
    FunctionDefinition(FunctionDefinition),
    EventListenerDefinition(EventListenerDefinition),
    ForEach(ForEach),
    While(While),
    If(If),
    Send(Send),
    React(React),
    Fail(Fail),
    Set(Set),
    Pick(Pick),
    Parse(Parse),
    ExprStatement(ExprStatement),
    CollectionAccess(CollectionAccess),
    IsExpression(IsExpression),
    RelationalExpression(RelationalExpression),
    BinaryOpExpression(BinaryOpExpression),
    UnaryOpExpression(UnaryOpExpression),
    InvokeExpression(InvokeExpression),
    OfExpression(OfExpression),
    Identifier(Identifier),
    JavascriptEscape(JavascriptEscape),
    RawStringLiteral(RawStringLiteral),
    TemplateStringLiteral(TemplateStringLiteral),
    NumberLiteral(NumberLiteral),
    BooleanLiteral(BooleanLiteral),
    ListLiteral(ListLiteral),
    DictLiteral(DictLiteral),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub declarations: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileImport {
    pub filename: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModuleImport {
    pub filename: String,
    /// Imported member names (`Identifier` nodes).
    pub members: Vec<NodeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariableVariant {
    /// Persisted across runs by the runtime's persistence store.
    Data,
    /// Process lifetime only.
    Temp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeclareVariable {
    pub variant: VariableVariant,
    pub name: NodeId,
    /// Default value; restricted to a literal expression by the parser.
    pub value: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupDefinition {
    pub name: NodeId,
    pub members: Vec<NodeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RestParamVariant {
    None,
    /// Greedy remainder-of-input capture; commands only.
    String,
    /// Remaining whitespace-delimited tokens as a list.
    List,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandDefinition {
    pub name: NodeId,
    pub parameters: Vec<NodeId>,
    pub rest_param_variant: RestParamVariant,
    pub rest_param: Option<NodeId>,
    pub statements: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDefinition {
    pub name: NodeId,
    pub parameters: Vec<NodeId>,
    /// `String` never appears here; the parser only accepts list rests on
    /// functions.
    pub rest_param_variant: RestParamVariant,
    pub rest_param: Option<NodeId>,
    pub statements: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventListenerDefinition {
    pub event: String,
    pub statements: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForEach {
    pub loop_variable: NodeId,
    pub collection: NodeId,
    pub statements: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct While {
    pub check_expression: NodeId,
    pub statements: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    pub check_expression: NodeId,
    pub then_statements: Vec<NodeId>,
    pub else_statements: Option<Vec<NodeId>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Send {
    pub message: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct React {
    pub target_message: Option<NodeId>,
    pub reaction: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fail;

#[derive(Clone, Debug, PartialEq)]
pub struct Set {
    /// `Identifier` or `OfExpression`.
    pub variable: NodeId,
    pub expression: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pick {
    pub distribution: String,
    pub collection: NodeId,
    /// Result binding; an implicit `it` identifier when the program text
    /// names none.
    pub assign_to: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parse {
    pub parser: String,
    pub expression: NodeId,
    pub else_statements: Option<Vec<NodeId>>,
    pub assign_to: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExprStatement {
    pub expression: NodeId,
    pub assign_to: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollectionAccessVariant {
    /// `add <expr> to <lvalue>` — append.
    Add,
    /// `remove <expr> from <lvalue>` — remove first matching element.
    Remove,
    /// `get <expr> of <lvalue>` — element read; produces a result.
    Get,
    /// `size of <lvalue>` — length read; produces a result.
    Size,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollectionAccess {
    pub variant: CollectionAccessVariant,
    /// The element (`Add`/`Remove`) or index (`Get`); `None` for `Size`.
    pub operand: Option<NodeId>,
    /// `Identifier` or `OfExpression`.
    pub collection: NodeId,
    /// Present exactly for the access variants (`Get`/`Size`).
    pub assign_to: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IsExpression {
    pub is_not: bool,
    pub expression: NodeId,
    pub target_type: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RelationalOperator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl RelationalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationalOperator::Equal => "==",
            RelationalOperator::NotEqual => "!=",
            RelationalOperator::Less => "<",
            RelationalOperator::LessOrEqual => "<=",
            RelationalOperator::Greater => ">",
            RelationalOperator::GreaterOrEqual => ">=",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationalExpression {
    /// `operators.len() == expressions.len() - 1`; chains like `a < b <= c`.
    pub operators: Vec<RelationalOperator>,
    pub expressions: Vec<NodeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryOpExpression {
    pub operator: BinaryOperator,
    pub lhs: NodeId,
    pub rhs: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnaryOpExpression {
    pub operator: UnaryOperator,
    pub expression: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvokeExpression {
    pub function: NodeId,
    pub arguments: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OfExpression {
    pub root: NodeId,
    /// Object keys, dereferenced left to right: `d of c of b of a` reads
    /// `a`, then `b`, `c`, `d` — stored here as `[b, c, d]`.
    pub reference_chain: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Identifier {
    pub name: String,
    /// `true` for compiler-synthesized placeholder names (the default
    /// result variable `it`, injected context names), `false` for names
    /// written in program text.
    pub implicit: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JavascriptEscape {
    pub code: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawStringLiteral {
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateStringFragment {
    Text(String),
    Javascript(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TemplateStringLiteral {
    pub fragments: Vec<TemplateStringFragment>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BooleanLiteral {
    pub value: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListLiteral {
    pub values: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DictLiteral {
    /// Parallel to `values`; each key is an identifier, string, or number
    /// literal node.
    pub keys: Vec<NodeId>,
    pub values: Vec<NodeId>,
}

/// Invokes a callback macro once with the full variant table:
/// `{ Variant, PayloadType, visit_name, enter_name, exit_name }` per entry.
/// The walk listener and visitor traits are generated from this so the two
/// stay exhaustive by construction.
macro_rules! with_ast_variants {
    ($callback:ident) => {
        $callback! {
            { Program, Program, visit_program, enter_program, exit_program }
            { FileImport, FileImport, visit_file_import, enter_file_import, exit_file_import }
            { ModuleImport, ModuleImport, visit_module_import, enter_module_import, exit_module_import }
            { DeclareVariable, DeclareVariable, visit_declare_variable, enter_declare_variable, exit_declare_variable }
            { GroupDefinition, GroupDefinition, visit_group_definition, enter_group_definition, exit_group_definition }
            { CommandDefinition, CommandDefinition, visit_command_definition, enter_command_definition, exit_command_definition }
            { FunctionDefinition, FunctionDefinition, visit_function_definition, enter_function_definition, exit_function_definition }
            { EventListenerDefinition, EventListenerDefinition, visit_event_listener_definition, enter_event_listener_definition, exit_event_listener_definition }
            { ForEach, ForEach, visit_for_each, enter_for_each, exit_for_each }
            { While, While, visit_while, enter_while, exit_while }
            { If, If, visit_if, enter_if, exit_if }
            { Send, Send, visit_send, enter_send, exit_send }
            { React, React, visit_react, enter_react, exit_react }
            { Fail, Fail, visit_fail, enter_fail, exit_fail }
            { Set, Set, visit_set, enter_set, exit_set }
            { Pick, Pick, visit_pick, enter_pick, exit_pick }
            { Parse, Parse, visit_parse, enter_parse, exit_parse }
            { ExprStatement, ExprStatement, visit_expr_statement, enter_expr_statement, exit_expr_statement }
            { CollectionAccess, CollectionAccess, visit_collection_access, enter_collection_access, exit_collection_access }
            { IsExpression, IsExpression, visit_is_expression, enter_is_expression, exit_is_expression }
            { RelationalExpression, RelationalExpression, visit_relational_expression, enter_relational_expression, exit_relational_expression }
            { BinaryOpExpression, BinaryOpExpression, visit_binary_op_expression, enter_binary_op_expression, exit_binary_op_expression }
            { UnaryOpExpression, UnaryOpExpression, visit_unary_op_expression, enter_unary_op_expression, exit_unary_op_expression }
            { InvokeExpression, InvokeExpression, visit_invoke_expression, enter_invoke_expression, exit_invoke_expression }
            { OfExpression, OfExpression, visit_of_expression, enter_of_expression, exit_of_expression }
            { Identifier, Identifier, visit_identifier, enter_identifier, exit_identifier }
            { JavascriptEscape, JavascriptEscape, visit_javascript_escape, enter_javascript_escape, exit_javascript_escape }
            { RawStringLiteral, RawStringLiteral, visit_raw_string_literal, enter_raw_string_literal, exit_raw_string_literal }
            { TemplateStringLiteral, TemplateStringLiteral, visit_template_string_literal, enter_template_string_literal, exit_template_string_literal }
            { NumberLiteral, NumberLiteral, visit_number_literal, enter_number_literal, exit_number_literal }
            { BooleanLiteral, BooleanLiteral, visit_boolean_literal, enter_boolean_literal, exit_boolean_literal }
            { ListLiteral, ListLiteral, visit_list_literal, enter_list_literal, exit_list_literal }
            { DictLiteral, DictLiteral, visit_dict_literal, enter_dict_literal, exit_dict_literal }
        }
    };
}
pub(crate) use with_ast_variants;

impl NodeKind {
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Set(_)
                | NodeKind::ForEach(_)
                | NodeKind::While(_)
                | NodeKind::Fail(_)
                | NodeKind::If(_)
                | NodeKind::Pick(_)
                | NodeKind::Parse(_)
                | NodeKind::Send(_)
                | NodeKind::React(_)
                | NodeKind::ExprStatement(_)
                | NodeKind::CollectionAccess(_)
        )
    }

    /// Statements that compute a value and bind it to a result identifier.
    /// For collection access only the access variants (`get`/`size`) apply.
    pub fn is_value_statement(&self) -> bool {
        match self {
            NodeKind::Pick(_) | NodeKind::Parse(_) | NodeKind::ExprStatement(_) => true,
            NodeKind::CollectionAccess(access) => access.assign_to.is_some(),
            _ => false,
        }
    }

    /// The result identifier of a value statement, explicit or implicit.
    pub fn assign_target(&self) -> Option<NodeId> {
        match self {
            NodeKind::Pick(pick) => Some(pick.assign_to),
            NodeKind::Parse(parse) => Some(parse.assign_to),
            NodeKind::ExprStatement(statement) => Some(statement.assign_to),
            NodeKind::CollectionAccess(access) => access.assign_to,
            _ => None,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::IsExpression(_)
                | NodeKind::RelationalExpression(_)
                | NodeKind::BinaryOpExpression(_)
                | NodeKind::UnaryOpExpression(_)
                | NodeKind::OfExpression(_)
                | NodeKind::Identifier(_)
                | NodeKind::InvokeExpression(_)
                | NodeKind::JavascriptEscape(_)
        ) || self.is_literal_expression()
    }

    pub fn is_literal_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::RawStringLiteral(_)
                | NodeKind::TemplateStringLiteral(_)
                | NodeKind::NumberLiteral(_)
                | NodeKind::BooleanLiteral(_)
                | NodeKind::ListLiteral(_)
                | NodeKind::DictLiteral(_)
        )
    }

    /// Command, function, or event listener: definitions that own a body.
    pub fn is_action_definition(&self) -> bool {
        matches!(
            self,
            NodeKind::CommandDefinition(_)
                | NodeKind::FunctionDefinition(_)
                | NodeKind::EventListenerDefinition(_)
        )
    }

    pub fn is_groupable_definition(&self) -> bool {
        matches!(self, NodeKind::GroupDefinition(_)) || self.is_action_definition()
    }

    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::FileImport(_) | NodeKind::ModuleImport(_) | NodeKind::DeclareVariable(_)
        ) || self.is_groupable_definition()
    }

    pub fn is_check_statement(&self) -> bool {
        matches!(self, NodeKind::While(_) | NodeKind::If(_))
    }

    /// Nodes that open a lexical scope; the binder records a symbol table
    /// for exactly these.
    pub fn opens_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::GroupDefinition(_)
                | NodeKind::CommandDefinition(_)
                | NodeKind::FunctionDefinition(_)
                | NodeKind::EventListenerDefinition(_)
                | NodeKind::ForEach(_)
                | NodeKind::While(_)
                | NodeKind::If(_)
        )
    }
}
