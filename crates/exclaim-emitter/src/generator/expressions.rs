//! Expression lowering.

use exclaim_ast::NodeId;
use exclaim_ast::node::*;
use exclaim_binder::{ASYNC_FN_SUFFIX, SymbolKind};
use exclaim_common::ErrorKind;

use super::{CodeGenerator, EmitResult, js_number, js_string, template_text};
use crate::options::ParserTest;

impl CodeGenerator<'_> {
    pub(crate) fn emit_identifier(&mut self, data: &Identifier) -> EmitResult {
        // TODO: escape identifiers that collide with JavaScript reserved
        // words (`class`, `new`, ...) instead of emitting them verbatim.
        self.write(&data.name);
        Ok(())
    }

    pub(crate) fn emit_javascript_escape(&mut self, data: &JavascriptEscape) -> EmitResult {
        self.write(&data.code);
        Ok(())
    }

    pub(crate) fn emit_raw_string_literal(&mut self, data: &RawStringLiteral) -> EmitResult {
        let text = js_string(&data.value);
        self.write(&text);
        Ok(())
    }

    pub(crate) fn emit_template_string_literal(
        &mut self,
        data: &TemplateStringLiteral,
    ) -> EmitResult {
        self.write("`");
        for fragment in &data.fragments {
            match fragment {
                TemplateStringFragment::Text(text) => {
                    let escaped = template_text(text);
                    self.write(&escaped);
                }
                TemplateStringFragment::Javascript(code) => {
                    self.write("${");
                    self.write(code);
                    self.write("}");
                }
            }
        }
        self.write("`");
        Ok(())
    }

    pub(crate) fn emit_number_literal(&mut self, data: &NumberLiteral) -> EmitResult {
        let text = js_number(data.value);
        self.write(&text);
        Ok(())
    }

    pub(crate) fn emit_boolean_literal(&mut self, data: &BooleanLiteral) -> EmitResult {
        self.write(if data.value { "true" } else { "false" });
        Ok(())
    }

    pub(crate) fn emit_list_literal(&mut self, data: &ListLiteral) -> EmitResult {
        self.write("[");
        for (index, &value) in data.values.iter().enumerate() {
            if index > 0 {
                self.write(",");
            }
            self.emit(value)?;
        }
        self.write("]");
        Ok(())
    }

    pub(crate) fn emit_dict_literal(&mut self, data: &DictLiteral) -> EmitResult {
        self.write("{");
        for (index, (&key, &value)) in data.keys.iter().zip(data.values.iter()).enumerate() {
            if index > 0 {
                self.write(",");
            }
            match self.arena.kind(key) {
                NodeKind::Identifier(identifier) => {
                    let name = identifier.name.clone();
                    self.write(&name);
                }
                NodeKind::NumberLiteral(number) => {
                    let text = js_number(number.value);
                    self.write(&text);
                }
                NodeKind::RawStringLiteral(string) => {
                    let text = js_string(&string.value);
                    self.write(&text);
                }
                _ => {
                    // Computed key (template string).
                    self.write("[");
                    self.emit(key)?;
                    self.write("]");
                }
            }
            self.write(":");
            self.emit(value)?;
        }
        self.write("}");
        Ok(())
    }

    pub(crate) fn emit_binary_op_expression(&mut self, data: &BinaryOpExpression) -> EmitResult {
        let operator = match data.operator {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        self.write("(");
        self.emit(data.lhs)?;
        self.write(")");
        self.write(operator);
        self.write("(");
        self.emit(data.rhs)?;
        self.write(")");
        Ok(())
    }

    pub(crate) fn emit_unary_op_expression(&mut self, data: &UnaryOpExpression) -> EmitResult {
        let operator = match data.operator {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "!",
        };
        self.write(operator);
        self.write("(");
        self.emit(data.expression)?;
        self.write(")");
        Ok(())
    }

    /// Chains like `a < b <= c` lower to `((a)<(b))&&((b)<=(c))`. Inner
    /// expressions are re-emitted per segment, which is safe because
    /// expressions have no side effects in this language.
    pub(crate) fn emit_relational_expression(
        &mut self,
        data: &RelationalExpression,
    ) -> EmitResult {
        self.write("(");
        for (index, operator) in data.operators.iter().enumerate() {
            if index > 0 {
                self.write(")&&(");
            }
            self.write("(");
            self.emit(data.expressions[index])?;
            self.write(")");
            self.write(operator.as_str());
            self.write("(");
            self.emit(data.expressions[index + 1])?;
            self.write(")");
        }
        self.write(")");
        Ok(())
    }

    /// `x is integer` lowers through the parser table's test function; a
    /// parser without one gets a try/catch probe around its lowering, and
    /// an unknown parser name probes the runtime's dispatch-by-name entry
    /// point (with a warning, since nothing verifies the fallback).
    pub(crate) fn emit_is_expression(&mut self, id: NodeId, data: &IsExpression) -> EmitResult {
        let value = self.capture(data.expression)?;
        let value = format!("({value})");
        if data.is_not {
            self.write("!");
        }
        match self.options.parsers.get(&data.target_type) {
            Some(entry) => match entry.test {
                ParserTest::Test(test) => {
                    let text = test(&value);
                    self.write(&text);
                }
                ParserTest::TryParse => {
                    let probe = match entry.parse {
                        Some(parse) => parse("$x"),
                        None => format!(
                            "$runtime.runParser({},$x)",
                            js_string(&data.target_type)
                        ),
                    };
                    let text = format!(
                        "($x=>{{try{{{probe};return true;}}catch($e){{return false;}}}})({value})"
                    );
                    self.write(&text);
                }
            },
            None => {
                self.diagnostics.emit(
                    ErrorKind::UnknownParser,
                    self.arena.source(id).clone(),
                    format!("no parser named `{}`", data.target_type),
                );
                let text = format!(
                    "($x=>{{try{{$runtime.runParser({},$x);return true;}}catch($e){{return false;}}}})({value})",
                    js_string(&data.target_type)
                );
                self.write(&text);
            }
        }
        Ok(())
    }

    /// Invocations suspend in asynchronous contexts; user-defined functions
    /// are called through their async copy there, everything else is
    /// awaited directly.
    pub(crate) fn emit_invoke_expression(
        &mut self,
        _id: NodeId,
        data: &InvokeExpression,
    ) -> EmitResult {
        let name = self.arena.identifier_name(data.function).to_string();
        let is_user_function = matches!(
            self.info.resolve(self.current_table, &name, data.function),
            Some(info) if info.kind == SymbolKind::Function
        );

        if self.in_async {
            self.write("(await ");
        }
        self.write(&name);
        if self.in_async && is_user_function {
            self.write(ASYNC_FN_SUFFIX);
        }
        self.write("(");
        for (index, &argument) in data.arguments.iter().enumerate() {
            if index > 0 {
                self.write(",");
            }
            self.emit(argument)?;
        }
        self.write(")");
        if self.in_async {
            self.write(")");
        }
        Ok(())
    }

    pub(crate) fn emit_of_expression(&mut self, data: &OfExpression) -> EmitResult {
        self.emit(data.root)?;
        for &key in &data.reference_chain {
            let subscript = self.reference_key(key)?;
            self.write("[");
            self.write(&subscript);
            self.write("]");
        }
        Ok(())
    }
}
