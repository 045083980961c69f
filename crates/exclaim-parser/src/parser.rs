//! Recursive-descent parser.
//!
//! Builds AST nodes directly into the arena, bottom-up, so node identities
//! follow program order within every block. Lexical and syntactic failures
//! are fatal (returned as the error); recoverable problems (bad numeric
//! separators, template-string import paths) go to the diagnostics sink and
//! parsing continues.

use std::sync::Arc;

use exclaim_ast::literal::{self, StringContents};
use exclaim_ast::node::*;
use exclaim_ast::{AstArena, NodeId};
use exclaim_common::{Diagnostic, Diagnostics, ErrorKind, SourceInfo};

use crate::imports::{ImportResolution, ImportResolver};
use crate::scanner::{Token, TokenKind, scan};

/// Parse one program. The returned node is the `Program`; its declarations
/// include any inlined file imports.
pub fn parse_program(
    source: &str,
    file: Arc<str>,
    arena: &mut AstArena,
    diagnostics: &mut Diagnostics,
    resolver: &mut dyn ImportResolver,
) -> Result<NodeId, Diagnostic> {
    let declarations = parse_declarations(source, file.clone(), arena, diagnostics, resolver)?;
    tracing::debug!(file = %file, nodes = arena.len(), "parsed program");
    Ok(arena.alloc(
        NodeKind::Program(Program { declarations }),
        SourceInfo::new(file, 1, 1),
    ))
}

fn parse_declarations(
    source: &str,
    file: Arc<str>,
    arena: &mut AstArena,
    diagnostics: &mut Diagnostics,
    resolver: &mut dyn ImportResolver,
) -> Result<Vec<NodeId>, Diagnostic> {
    let tokens = scan(source, file.clone())?;
    let mut parser = Parser {
        source,
        file,
        tokens,
        pos: 0,
        arena,
        diagnostics,
        resolver,
    };
    parser.declarations()
}

struct Parser<'a> {
    source: &'a str,
    file: Arc<str>,
    tokens: Vec<Token>,
    pos: usize,
    arena: &'a mut AstArena,
    diagnostics: &'a mut Diagnostics,
    resolver: &'a mut dyn ImportResolver,
}

type Parse<T> = Result<T, Diagnostic>;

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Parse<Token> {
        if self.check(kind) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn text(&self, token: &Token) -> &'a str {
        token.text(self.source)
    }

    fn source_info(&self, token: &Token) -> SourceInfo {
        SourceInfo::new(self.file.clone(), token.line, token.column)
    }

    fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(ErrorKind::Parse, self.source_info(self.peek()), message)
    }

    // Declarations

    fn declarations(&mut self) -> Parse<Vec<NodeId>> {
        let mut declarations = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon) {}
            if self.check(TokenKind::Eof) {
                return Ok(declarations);
            }
            self.declaration(&mut declarations)?;
        }
    }

    fn declaration(&mut self, out: &mut Vec<NodeId>) -> Parse<()> {
        match self.kind() {
            TokenKind::Import => self.import_declaration(out),
            TokenKind::Data | TokenKind::Temp => {
                let id = self.declare_variable()?;
                out.push(id);
                Ok(())
            }
            TokenKind::Group => {
                let id = self.group_definition()?;
                out.push(id);
                Ok(())
            }
            TokenKind::Command => {
                let id = self.command_definition()?;
                out.push(id);
                Ok(())
            }
            TokenKind::Function => {
                let id = self.function_definition()?;
                out.push(id);
                Ok(())
            }
            TokenKind::On => {
                let id = self.event_listener_definition()?;
                out.push(id);
                Ok(())
            }
            _ => Err(self.error("expected a declaration")),
        }
    }

    fn import_declaration(&mut self, out: &mut Vec<NodeId>) -> Parse<()> {
        let import_token = self.bump();
        let info = self.source_info(&import_token);

        if self.eat(TokenKind::OpenBrace) {
            let mut members = Vec::new();
            loop {
                members.push(self.identifier_node()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseBrace, "`}` after import members")?;
            self.expect(TokenKind::From, "`from`")?;
            let filename = self.import_filename()?;
            out.push(self.arena.alloc(
                NodeKind::ModuleImport(ModuleImport { filename, members }),
                info,
            ));
            return Ok(());
        }

        let filename = self.import_filename()?;
        match self.resolver.resolve(&filename, &info, self.diagnostics) {
            ImportResolution::Inline { source, file } => {
                let mut inlined =
                    parse_declarations(&source, file, self.arena, self.diagnostics, self.resolver)?;
                out.append(&mut inlined);
            }
            ImportResolution::Passthrough => {
                out.push(
                    self.arena
                        .alloc(NodeKind::FileImport(FileImport { filename }), info),
                );
            }
            ImportResolution::Skip => {}
        }
        Ok(())
    }

    /// Import paths must be statically known, so template strings are
    /// rejected (with the text fragments as a best-effort recovery value).
    fn import_filename(&mut self) -> Parse<String> {
        let token = self.expect(TokenKind::Str, "an import path string")?;
        match self.scan_string_token(&token) {
            StringContents::Raw(value) => Ok(value),
            StringContents::Template(fragments) => {
                self.diagnostics.emit(
                    ErrorKind::NoImportTemplateString,
                    self.source_info(&token),
                    "import declarations cannot use template strings",
                );
                let mut value = String::new();
                for fragment in fragments {
                    if let TemplateStringFragment::Text(text) = fragment {
                        value.push_str(&text);
                    }
                }
                Ok(value)
            }
        }
    }

    fn declare_variable(&mut self) -> Parse<NodeId> {
        let keyword = self.bump();
        let variant = match keyword.kind {
            TokenKind::Data => VariableVariant::Data,
            _ => VariableVariant::Temp,
        };
        let info = self.source_info(&keyword);
        let name = self.identifier_node()?;
        self.expect(TokenKind::Equals, "`=`")?;
        let value = self.literal_expression()?;
        Ok(self.arena.alloc(
            NodeKind::DeclareVariable(DeclareVariable {
                variant,
                name,
                value,
            }),
            info,
        ))
    }

    fn group_definition(&mut self) -> Parse<NodeId> {
        let keyword = self.bump();
        let info = self.source_info(&keyword);
        let name = self.identifier_node()?;
        self.expect(TokenKind::OpenBrace, "`{` to open the group")?;
        let mut members = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon) {}
            if self.eat(TokenKind::CloseBrace) {
                break;
            }
            let member = match self.kind() {
                TokenKind::Group => self.group_definition()?,
                TokenKind::Command => self.command_definition()?,
                TokenKind::Function => self.function_definition()?,
                TokenKind::On => self.event_listener_definition()?,
                _ => return Err(self.error("expected a group, command, function, or listener")),
            };
            members.push(member);
        }
        Ok(self
            .arena
            .alloc(NodeKind::GroupDefinition(GroupDefinition { name, members }), info))
    }

    fn command_definition(&mut self) -> Parse<NodeId> {
        let keyword = self.bump();
        let info = self.source_info(&keyword);
        let name = self.identifier_node()?;
        let (parameters, rest_param_variant, rest_param) = self.action_parameters(true)?;
        let statements = self.block()?;
        Ok(self.arena.alloc(
            NodeKind::CommandDefinition(CommandDefinition {
                name,
                parameters,
                rest_param_variant,
                rest_param,
                statements,
            }),
            info,
        ))
    }

    fn function_definition(&mut self) -> Parse<NodeId> {
        let keyword = self.bump();
        let info = self.source_info(&keyword);
        let name = self.identifier_node()?;
        let (parameters, rest_param_variant, rest_param) = self.action_parameters(false)?;
        let statements = self.block()?;
        Ok(self.arena.alloc(
            NodeKind::FunctionDefinition(FunctionDefinition {
                name,
                parameters,
                rest_param_variant,
                rest_param,
                statements,
            }),
            info,
        ))
    }

    /// Parameters end at the body's `{`. `...name` takes the remaining
    /// arguments as a list; `name...` (commands only) captures the raw
    /// remainder of the input as one string. `_` declares an implicit
    /// parameter bound to the placeholder name.
    fn action_parameters(
        &mut self,
        allow_string_rest: bool,
    ) -> Parse<(Vec<NodeId>, RestParamVariant, Option<NodeId>)> {
        let mut parameters = Vec::new();
        let mut rest_param_variant = RestParamVariant::None;
        let mut rest_param = None;
        loop {
            match self.kind() {
                TokenKind::Ellipsis => {
                    self.bump();
                    rest_param = Some(self.identifier_node()?);
                    rest_param_variant = RestParamVariant::List;
                }
                // `name...` (the `...` glued to the name) is a string rest;
                // a detached `...` belongs to a following list rest instead.
                TokenKind::Identifier
                    if self.kind_at(1) == TokenKind::Ellipsis
                        && self.tokens[self.pos + 1].start == self.peek().end =>
                {
                    let token = self.bump();
                    self.bump(); // `...`
                    if !allow_string_rest {
                        return Err(Diagnostic::new(
                            ErrorKind::Parse,
                            self.source_info(&token),
                            "functions only take a list rest parameter (`...name`)",
                        ));
                    }
                    rest_param = Some(self.identifier_node_from(&token));
                    rest_param_variant = RestParamVariant::String;
                }
                TokenKind::Identifier => {
                    let token = self.bump();
                    parameters.push(self.parameter_node(&token));
                    continue;
                }
                _ => break,
            }
            // A rest parameter was parsed; nothing may follow it.
            if !self.check(TokenKind::OpenBrace) {
                return Err(self.error("the rest parameter must be the last parameter"));
            }
            break;
        }
        Ok((parameters, rest_param_variant, rest_param))
    }

    fn parameter_node(&mut self, token: &Token) -> NodeId {
        let text = self.text(token);
        if text == "_" {
            // Implicit parameter: binds the placeholder result name.
            self.arena.alloc(
                NodeKind::Identifier(Identifier {
                    name: "it".to_string(),
                    implicit: true,
                }),
                self.source_info(token),
            )
        } else {
            self.identifier_node_from(token)
        }
    }

    fn event_listener_definition(&mut self) -> Parse<NodeId> {
        let keyword = self.bump();
        let info = self.source_info(&keyword);
        let event_token = self.expect(TokenKind::Identifier, "an event name")?;
        let event = self.text(&event_token).to_string();
        let statements = self.block()?;
        Ok(self.arena.alloc(
            NodeKind::EventListenerDefinition(EventListenerDefinition { event, statements }),
            info,
        ))
    }

    // Statements

    fn block(&mut self) -> Parse<Vec<NodeId>> {
        self.expect(TokenKind::OpenBrace, "`{`")?;
        let mut statements = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon) {}
            if self.eat(TokenKind::CloseBrace) {
                return Ok(statements);
            }
            statements.push(self.statement()?);
        }
    }

    fn statement(&mut self) -> Parse<NodeId> {
        match self.kind() {
            TokenKind::Set => self.set_statement(),
            TokenKind::For => self.for_each_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::Fail => {
                let token = self.bump();
                let info = self.source_info(&token);
                Ok(self.arena.alloc(NodeKind::Fail(Fail), info))
            }
            TokenKind::Send => {
                let token = self.bump();
                let info = self.source_info(&token);
                let message = self.expression()?;
                Ok(self.arena.alloc(NodeKind::Send(Send { message }), info))
            }
            TokenKind::React => self.react_statement(),
            TokenKind::Pick => self.pick_statement(),
            TokenKind::Parse => self.parse_statement(),
            TokenKind::Add | TokenKind::Remove | TokenKind::Get | TokenKind::Size => {
                self.collection_access_statement()
            }
            _ => self.expr_statement(),
        }
    }

    fn set_statement(&mut self) -> Parse<NodeId> {
        let token = self.bump();
        let info = self.source_info(&token);
        let variable = self.lvalue()?;
        self.expect(TokenKind::To, "`to`")?;
        let expression = self.expression()?;
        Ok(self.arena.alloc(
            NodeKind::Set(Set {
                variable,
                expression,
            }),
            info,
        ))
    }

    fn for_each_statement(&mut self) -> Parse<NodeId> {
        let token = self.bump();
        let info = self.source_info(&token);
        self.expect(TokenKind::Each, "`each`")?;
        let loop_variable = self.identifier_node()?;
        self.expect(TokenKind::In, "`in`")?;
        let collection = self.expression()?;
        let statements = self.block()?;
        Ok(self.arena.alloc(
            NodeKind::ForEach(ForEach {
                loop_variable,
                collection,
                statements,
            }),
            info,
        ))
    }

    fn while_statement(&mut self) -> Parse<NodeId> {
        let token = self.bump();
        let info = self.source_info(&token);
        let check_expression = self.expression()?;
        let statements = self.block()?;
        Ok(self.arena.alloc(
            NodeKind::While(While {
                check_expression,
                statements,
            }),
            info,
        ))
    }

    fn if_statement(&mut self) -> Parse<NodeId> {
        let token = self.bump();
        let info = self.source_info(&token);
        let check_expression = self.expression()?;
        self.eat(TokenKind::Then);
        let then_statements = self.block()?;
        let else_statements = if self.eat(TokenKind::Else) {
            if self.check(TokenKind::If) {
                // `else if` chains nest as a single-statement else branch.
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(self.arena.alloc(
            NodeKind::If(If {
                check_expression,
                then_statements,
                else_statements,
            }),
            info,
        ))
    }

    fn react_statement(&mut self) -> Parse<NodeId> {
        let token = self.bump();
        let info = self.source_info(&token);
        let target_message = if self.eat(TokenKind::To) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::With, "`with`")?;
        let reaction = self.expression()?;
        Ok(self.arena.alloc(
            NodeKind::React(React {
                target_message,
                reaction,
            }),
            info,
        ))
    }

    fn pick_statement(&mut self) -> Parse<NodeId> {
        let token = self.bump();
        let info = self.source_info(&token);
        let distribution_token = self.expect(TokenKind::Identifier, "a distribution name")?;
        let distribution = self.text(&distribution_token).to_string();
        self.expect(TokenKind::From, "`from`")?;
        let collection = self.expression()?;
        let assign_to = self.result_binding()?;
        Ok(self.arena.alloc(
            NodeKind::Pick(Pick {
                distribution,
                collection,
                assign_to,
            }),
            info,
        ))
    }

    fn parse_statement(&mut self) -> Parse<NodeId> {
        let token = self.bump();
        let info = self.source_info(&token);
        let expression = self.expression()?;
        self.expect(TokenKind::As, "`as <parser>`")?;
        let parser_token = self.expect(TokenKind::Identifier, "a parser name")?;
        let parser = self.text(&parser_token).to_string();
        let assign_to = self.result_binding()?;
        let else_statements = if self.eat(TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };
        Ok(self.arena.alloc(
            NodeKind::Parse(exclaim_ast::node::Parse {
                parser,
                expression,
                else_statements,
                assign_to,
            }),
            info,
        ))
    }

    fn collection_access_statement(&mut self) -> Parse<NodeId> {
        let token = self.bump();
        let info = self.source_info(&token);
        let (variant, operand, collection, assign_to) = match token.kind {
            TokenKind::Add => {
                let operand = self.expression()?;
                self.expect(TokenKind::To, "`to`")?;
                (CollectionAccessVariant::Add, Some(operand), self.lvalue()?, None)
            }
            TokenKind::Remove => {
                let operand = self.expression()?;
                self.expect(TokenKind::From, "`from`")?;
                (
                    CollectionAccessVariant::Remove,
                    Some(operand),
                    self.lvalue()?,
                    None,
                )
            }
            TokenKind::Get => {
                let operand = self.expression()?;
                self.expect(TokenKind::Of, "`of`")?;
                let collection = self.lvalue()?;
                let assign_to = self.result_binding()?;
                (
                    CollectionAccessVariant::Get,
                    Some(operand),
                    collection,
                    Some(assign_to),
                )
            }
            _ => {
                self.expect(TokenKind::Of, "`of`")?;
                let collection = self.lvalue()?;
                let assign_to = self.result_binding()?;
                (CollectionAccessVariant::Size, None, collection, Some(assign_to))
            }
        };
        Ok(self.arena.alloc(
            NodeKind::CollectionAccess(CollectionAccess {
                variant,
                operand,
                collection,
                assign_to,
            }),
            info,
        ))
    }

    fn expr_statement(&mut self) -> Parse<NodeId> {
        let info = self.source_info(self.peek());
        let expression = self.expression()?;
        let assign_to = self.result_binding()?;
        Ok(self.arena.alloc(
            NodeKind::ExprStatement(ExprStatement {
                expression,
                assign_to,
            }),
            info,
        ))
    }

    /// `as name` when present, the implicit placeholder otherwise. The
    /// placeholder is allocated here, in statement order, so the symbol
    /// table's identity-ordered visibility holds for implicit results too.
    fn result_binding(&mut self) -> Parse<NodeId> {
        if self.eat(TokenKind::As) {
            self.identifier_node()
        } else {
            Ok(self.arena.alloc_implicit_identifier("it"))
        }
    }

    /// A writable reference: an identifier or a reference chain.
    fn lvalue(&mut self) -> Parse<NodeId> {
        let info = self.source_info(self.peek());
        let id = self.of_chain()?;
        match self.arena.kind(id) {
            NodeKind::Identifier(_) | NodeKind::OfExpression(_) => Ok(id),
            _ => Err(Diagnostic::new(
                ErrorKind::Parse,
                info,
                "expected a variable reference",
            )),
        }
    }

    // Expressions

    fn expression(&mut self) -> Parse<NodeId> {
        let mut lhs = self.check_expression()?;
        loop {
            let operator = match self.kind() {
                TokenKind::And => BinaryOperator::And,
                TokenKind::Or => BinaryOperator::Or,
                _ => return Ok(lhs),
            };
            let token = self.bump();
            let info = self.source_info(&token);
            let rhs = self.check_expression()?;
            lhs = self.arena.alloc(
                NodeKind::BinaryOpExpression(BinaryOpExpression { operator, lhs, rhs }),
                info,
            );
        }
    }

    fn check_expression(&mut self) -> Parse<NodeId> {
        let first = self.math_expression()?;
        if self.check(TokenKind::Is) {
            let token = self.bump();
            let info = self.source_info(&token);
            let is_not = self.eat(TokenKind::Not);
            let target_token = self.expect(TokenKind::Identifier, "a type name")?;
            let target_type = self.text(&target_token).to_string();
            return Ok(self.arena.alloc(
                NodeKind::IsExpression(IsExpression {
                    is_not,
                    expression: first,
                    target_type,
                }),
                info,
            ));
        }

        if relational_operator(self.kind()).is_some() {
            let info = self.source_info(self.peek());
            let mut operators = Vec::new();
            let mut expressions = vec![first];
            while let Some(operator) = relational_operator(self.kind()) {
                self.bump();
                operators.push(operator);
                expressions.push(self.math_expression()?);
            }
            return Ok(self.arena.alloc(
                NodeKind::RelationalExpression(RelationalExpression {
                    operators,
                    expressions,
                }),
                info,
            ));
        }

        Ok(first)
    }

    fn math_expression(&mut self) -> Parse<NodeId> {
        let mut lhs = self.mul_expression()?;
        loop {
            let operator = match self.kind() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => return Ok(lhs),
            };
            let token = self.bump();
            let info = self.source_info(&token);
            let rhs = self.mul_expression()?;
            lhs = self.arena.alloc(
                NodeKind::BinaryOpExpression(BinaryOpExpression { operator, lhs, rhs }),
                info,
            );
        }
    }

    fn mul_expression(&mut self) -> Parse<NodeId> {
        let mut lhs = self.unary_expression()?;
        loop {
            let operator = match self.kind() {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => return Ok(lhs),
            };
            let token = self.bump();
            let info = self.source_info(&token);
            let rhs = self.unary_expression()?;
            lhs = self.arena.alloc(
                NodeKind::BinaryOpExpression(BinaryOpExpression { operator, lhs, rhs }),
                info,
            );
        }
    }

    fn unary_expression(&mut self) -> Parse<NodeId> {
        let operator = match self.kind() {
            TokenKind::Not => UnaryOperator::Not,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Minus => {
                // A minus sign directly on a number literal folds into it.
                if self.kind_at(1) == TokenKind::Number {
                    return self.number_literal();
                }
                UnaryOperator::Minus
            }
            _ => return self.of_chain(),
        };
        let token = self.bump();
        let info = self.source_info(&token);
        let expression = self.unary_expression()?;
        Ok(self.arena.alloc(
            NodeKind::UnaryOpExpression(UnaryOpExpression {
                operator,
                expression,
            }),
            info,
        ))
    }

    /// `d of c of b of a` dereferences `a.b.c.d`: keys are written
    /// outermost-first, the root comes last.
    fn of_chain(&mut self) -> Parse<NodeId> {
        let first = self.term()?;
        if !self.check(TokenKind::Of) {
            return Ok(first);
        }

        let info = self.source_info(self.peek());
        let mut keys = vec![first];
        let root;
        loop {
            self.expect(TokenKind::Of, "`of`")?;
            let next = self.term()?;
            if self.check(TokenKind::Of) {
                keys.push(next);
            } else {
                root = next;
                break;
            }
        }
        for &key in &keys {
            if !matches!(
                self.arena.kind(key),
                NodeKind::Identifier(_)
                    | NodeKind::RawStringLiteral(_)
                    | NodeKind::TemplateStringLiteral(_)
                    | NodeKind::NumberLiteral(_)
            ) {
                return Err(Diagnostic::new(
                    ErrorKind::Parse,
                    self.arena.source(key).clone(),
                    "reference keys must be identifiers, strings, or numbers",
                ));
            }
        }
        // Stored in dereference order, so the written order reverses.
        keys.reverse();
        Ok(self.arena.alloc(
            NodeKind::OfExpression(OfExpression {
                root,
                reference_chain: keys,
            }),
            info,
        ))
    }

    fn term(&mut self) -> Parse<NodeId> {
        match self.kind() {
            TokenKind::Number | TokenKind::Minus => self.number_literal(),
            TokenKind::Str => self.string_literal(),
            TokenKind::True | TokenKind::False => {
                let token = self.bump();
                let info = self.source_info(&token);
                let value = token.kind == TokenKind::True;
                Ok(self
                    .arena
                    .alloc(NodeKind::BooleanLiteral(BooleanLiteral { value }), info))
            }
            TokenKind::JsEscape => {
                let token = self.bump();
                let info = self.source_info(&token);
                let text = self.text(&token);
                let code = text[1..text.len() - 1].to_string();
                Ok(self
                    .arena
                    .alloc(NodeKind::JavascriptEscape(JavascriptEscape { code }), info))
            }
            TokenKind::OpenBracket => self.list_literal(),
            TokenKind::OpenBrace => self.dict_literal(),
            TokenKind::OpenParen => {
                self.bump();
                let inner = self.expression()?;
                self.expect(TokenKind::CloseParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::Identifier => {
                let token = self.bump();
                let id = self.identifier_node_from(&token);
                if self.check(TokenKind::OpenParen) {
                    return self.invoke_expression(id, &token);
                }
                Ok(id)
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    fn invoke_expression(&mut self, function: NodeId, name_token: &Token) -> Parse<NodeId> {
        self.expect(TokenKind::OpenParen, "`(`")?;
        let mut arguments = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseParen, "`)` after arguments")?;
        Ok(self.arena.alloc(
            NodeKind::InvokeExpression(InvokeExpression {
                function,
                arguments,
            }),
            self.source_info(name_token),
        ))
    }

    // Literals

    fn literal_expression(&mut self) -> Parse<NodeId> {
        match self.kind() {
            TokenKind::Number | TokenKind::Minus => self.number_literal(),
            TokenKind::Str => self.string_literal(),
            TokenKind::True | TokenKind::False => self.term(),
            TokenKind::OpenBracket => self.list_literal(),
            TokenKind::OpenBrace => self.dict_literal(),
            _ => Err(self.error("expected a literal value")),
        }
    }

    fn number_literal(&mut self) -> Parse<NodeId> {
        let first = *self.peek();
        let negative = self.eat(TokenKind::Minus);
        let token = self.expect(TokenKind::Number, "a number")?;
        let mut text = self.text(&token).to_string();
        if negative {
            text.insert(0, '-');
        }
        let parsed = literal::parse_number(&text);
        let info = self.source_info(&first);
        if !parsed.valid {
            self.diagnostics.emit(
                ErrorKind::InvalidNumber,
                info.clone(),
                "invalid number syntax; this may be because of invalid numeric separators \
                 (underscores) or a decimal point in an exponentiation term",
            );
        }
        Ok(self.arena.alloc(
            NodeKind::NumberLiteral(NumberLiteral {
                value: parsed.value,
            }),
            info,
        ))
    }

    fn string_literal(&mut self) -> Parse<NodeId> {
        let token = self.expect(TokenKind::Str, "a string")?;
        let info = self.source_info(&token);
        match self.scan_string_token(&token) {
            StringContents::Raw(value) => Ok(self
                .arena
                .alloc(NodeKind::RawStringLiteral(RawStringLiteral { value }), info)),
            StringContents::Template(fragments) => Ok(self.arena.alloc(
                NodeKind::TemplateStringLiteral(TemplateStringLiteral { fragments }),
                info,
            )),
        }
    }

    fn scan_string_token(&self, token: &Token) -> StringContents {
        literal::scan_string(self.text(token), token.column.saturating_sub(1))
            .expect("string token was validated by the scanner")
            .contents
    }

    fn list_literal(&mut self) -> Parse<NodeId> {
        let token = self.expect(TokenKind::OpenBracket, "`[`")?;
        let info = self.source_info(&token);
        let mut values = Vec::new();
        if !self.check(TokenKind::CloseBracket) {
            loop {
                values.push(self.expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseBracket, "`]`")?;
        Ok(self
            .arena
            .alloc(NodeKind::ListLiteral(ListLiteral { values }), info))
    }

    fn dict_literal(&mut self) -> Parse<NodeId> {
        let token = self.expect(TokenKind::OpenBrace, "`{`")?;
        let info = self.source_info(&token);
        let mut keys = Vec::new();
        let mut values = Vec::new();
        if !self.check(TokenKind::CloseBrace) {
            loop {
                keys.push(self.object_key()?);
                self.expect(TokenKind::Colon, "`:`")?;
                values.push(self.expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseBrace, "`}`")?;
        Ok(self
            .arena
            .alloc(NodeKind::DictLiteral(DictLiteral { keys, values }), info))
    }

    fn object_key(&mut self) -> Parse<NodeId> {
        match self.kind() {
            TokenKind::Identifier => self.identifier_node(),
            TokenKind::Str => self.string_literal(),
            TokenKind::Number => self.number_literal(),
            _ => Err(self.error("expected an identifier, string, or number key")),
        }
    }

    fn identifier_node(&mut self) -> Parse<NodeId> {
        let token = self.expect(TokenKind::Identifier, "a name")?;
        if self.text(&token) == "_" {
            return Err(Diagnostic::new(
                ErrorKind::Parse,
                self.source_info(&token),
                "`_` is only allowed as a parameter",
            ));
        }
        Ok(self.identifier_node_from(&token))
    }

    fn identifier_node_from(&mut self, token: &Token) -> NodeId {
        let name = self.text(token).to_string();
        let info = self.source_info(token);
        self.arena.alloc_identifier(name, info)
    }
}

fn relational_operator(kind: TokenKind) -> Option<RelationalOperator> {
    Some(match kind {
        TokenKind::EqualsEquals => RelationalOperator::Equal,
        TokenKind::NotEquals => RelationalOperator::NotEqual,
        TokenKind::Less => RelationalOperator::Less,
        TokenKind::LessEquals => RelationalOperator::LessOrEqual,
        TokenKind::Greater => RelationalOperator::Greater,
        TokenKind::GreaterEquals => RelationalOperator::GreaterOrEqual,
        _ => return None,
    })
}
