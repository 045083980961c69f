//! Statement lowering.
//!
//! Writes to `data` and `temp` variables are where the persistence
//! rewriting happens: a `data` write becomes a persistence call followed by
//! a change notification (in that order, always both); a `temp` write is a
//! direct assignment followed by the notification. Everything else is a
//! plain JavaScript statement.

use exclaim_ast::NodeId;
use exclaim_ast::node::*;
use exclaim_binder::SymbolKind;
use exclaim_common::ErrorKind;

use super::{CodeGenerator, EmitResult, js_string};
use crate::options::ParserTest;

impl CodeGenerator<'_> {
    pub(crate) fn emit_for_each(&mut self, data: &ForEach) -> EmitResult {
        let variable = self.arena.identifier_name(data.loop_variable).to_string();
        let collection = self.capture(data.collection)?;
        self.write(&format!("for(let {variable} of ({collection})){{"));
        self.emit_statements(&data.statements)?;
        self.write("}");
        Ok(())
    }

    pub(crate) fn emit_while(&mut self, data: &While) -> EmitResult {
        let check = self.capture(data.check_expression)?;
        self.write(&format!("while({check}){{"));
        self.emit_statements(&data.statements)?;
        self.write("}");
        Ok(())
    }

    pub(crate) fn emit_if(&mut self, data: &If) -> EmitResult {
        let check = self.capture(data.check_expression)?;
        self.write(&format!("if({check}){{"));
        self.emit_statements(&data.then_statements)?;
        self.write("}");
        if let Some(else_statements) = &data.else_statements {
            self.write("else{");
            self.emit_statements(else_statements)?;
            self.write("}");
        }
        Ok(())
    }

    pub(crate) fn emit_send(&mut self, _id: NodeId, data: &Send) -> EmitResult {
        self.require_async()?;
        let message = self.capture(data.message)?;
        self.write(&format!("await $runtime.sendMessage(message,{message});"));
        Ok(())
    }

    pub(crate) fn emit_react(&mut self, data: &React) -> EmitResult {
        self.require_async()?;
        let target = match data.target_message {
            Some(target) => self.capture(target)?,
            None => "message".to_string(),
        };
        let reaction = self.capture(data.reaction)?;
        self.write(&format!(
            "await $runtime.reactToMessage(({target}),{reaction});"
        ));
        Ok(())
    }

    pub(crate) fn emit_fail(&mut self) -> EmitResult {
        self.write("throw new Error(\"Command failed\");");
        Ok(())
    }

    /// `set` writes to persisted or process-lifetime variables; anything
    /// else is a semantic error, reported and then emitted verbatim as a
    /// best-effort plain assignment.
    pub(crate) fn emit_set(&mut self, id: NodeId, data: &Set) -> EmitResult {
        let (root, chain) = self.lvalue_parts(data.variable);
        let Some(root) = root else {
            return self.plain_assignment(
                id,
                data,
                ErrorKind::SetOnNonPersistentVariable,
                "`set` needs a variable name",
            );
        };
        let name = self.arena.identifier_name(root).to_string();
        let resolved = self
            .info
            .resolve(self.current_table, &name, root)
            .map(|info| info.kind);

        match resolved {
            Some(SymbolKind::Data) => {
                self.require_async()?;
                let value = self.capture(data.expression)?;
                let flat = js_string(&name);
                if chain.is_empty() {
                    self.write(&format!(
                        "{{const $value={value};await $runtime.persistent.set({flat},$value);$runtime.notifySet({flat},$value);}}"
                    ));
                } else {
                    let keys = self.key_path(chain)?;
                    self.write(&format!(
                        "{{const $value={value};await $runtime.persistent.setNested({flat},[{keys}],$value);$runtime.notifySet({flat},{name});}}"
                    ));
                }
                Ok(())
            }
            Some(SymbolKind::Temp) => {
                let target = self.capture(data.variable)?;
                let value = self.capture(data.expression)?;
                let flat = js_string(&name);
                self.write(&format!(
                    "{target}={value};$runtime.notifySet({flat},{name});"
                ));
                Ok(())
            }
            Some(SymbolKind::Const) => self.plain_assignment(
                id,
                data,
                ErrorKind::AssignToConst,
                "cannot assign to a built-in context variable",
            ),
            Some(SymbolKind::Function) => self.plain_assignment(
                id,
                data,
                ErrorKind::AssignToFunction,
                "cannot assign to a function",
            ),
            Some(SymbolKind::Local) | None => self.plain_assignment(
                id,
                data,
                ErrorKind::SetOnNonPersistentVariable,
                "`set` is reserved for `data` and `temp` variables",
            ),
        }
    }

    /// Error-recovery lowering for `set`: report, then still emit the
    /// assignment so the output stays runnable best-effort.
    fn plain_assignment(
        &mut self,
        id: NodeId,
        data: &Set,
        kind: ErrorKind,
        message: &str,
    ) -> EmitResult {
        let name = match self.lvalue_parts(data.variable).0 {
            Some(root) => format!("`{}`: ", self.arena.identifier_name(root)),
            None => String::new(),
        };
        self.diagnostics.emit(
            kind,
            self.arena.source(id).clone(),
            format!("{name}{message}"),
        );
        let target = self.capture(data.variable)?;
        let value = self.capture(data.expression)?;
        self.write(&format!("{target}={value};"));
        Ok(())
    }

    pub(crate) fn emit_pick(&mut self, id: NodeId, data: &Pick) -> EmitResult {
        let collection = self.capture(data.collection)?;
        let collection = format!("({collection})");
        let prefix = self.assignment_prefix(data.assign_to);
        match self.options.distributions.get(&data.distribution) {
            Some(distribution) => {
                let index = distribution(&collection);
                self.write(&format!("{prefix}={collection}[{index}];"));
            }
            None => {
                self.diagnostics.emit(
                    ErrorKind::UnknownDistribution,
                    self.arena.source(id).clone(),
                    format!("no distribution named `{}`", data.distribution),
                );
                self.write(&format!(
                    "{prefix}=$runtime.runDistribution({},{collection});",
                    js_string(&data.distribution)
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn emit_parse(&mut self, id: NodeId, data: &Parse) -> EmitResult {
        let value = self.capture(data.expression)?;
        let value = format!("({value})");
        let lowering = match self.options.parsers.get(&data.parser) {
            Some(entry) => match (entry.parse, entry.test) {
                (Some(parse), _) => parse(&value),
                (None, ParserTest::Test(test)) => {
                    let test_code = test("$x");
                    format!(
                        "($x=>{{if(!{test_code})throw new Error({});return $x;}})({value})",
                        js_string(&format!("Expected {}", data.parser))
                    )
                }
                (None, ParserTest::TryParse) => format!(
                    "$runtime.runParser({},{value})",
                    js_string(&data.parser)
                ),
            },
            None => {
                self.diagnostics.emit(
                    ErrorKind::UnknownParser,
                    self.arena.source(id).clone(),
                    format!("no parser named `{}`", data.parser),
                );
                format!("$runtime.runParser({},{value})", js_string(&data.parser))
            }
        };

        let prefix = self.assignment_prefix(data.assign_to);
        match &data.else_statements {
            None => {
                self.write(&format!("{prefix}={lowering};"));
            }
            Some(else_statements) => {
                let name = self.arena.identifier_name(data.assign_to);
                // Hoist the declaration out of the try so the binding
                // survives it.
                if prefix.starts_with("let ") {
                    self.write(&format!("let {name};"));
                }
                self.write(&format!("try{{{name}={lowering};}}catch($err){{"));
                self.emit_statements(else_statements)?;
                self.write("}");
            }
        }
        Ok(())
    }

    pub(crate) fn emit_expr_statement(&mut self, data: &ExprStatement) -> EmitResult {
        let prefix = self.assignment_prefix(data.assign_to);
        let value = self.capture(data.expression)?;
        self.write(&format!("{prefix}={value};"));
        Ok(())
    }

    pub(crate) fn emit_collection_access(
        &mut self,
        id: NodeId,
        data: &CollectionAccess,
    ) -> EmitResult {
        let (root, chain) = self.lvalue_parts(data.collection);
        let collection = self.capture(data.collection)?;
        let collection = format!("({collection})");

        match data.variant {
            CollectionAccessVariant::Get => {
                let operand = self.capture(data.operand.expect("get takes an index"))?;
                let prefix =
                    self.assignment_prefix(data.assign_to.expect("get binds a result"));
                self.write(&format!("{prefix}={collection}[({operand})];"));
                return Ok(());
            }
            CollectionAccessVariant::Size => {
                let prefix =
                    self.assignment_prefix(data.assign_to.expect("size binds a result"));
                self.write(&format!("{prefix}={collection}.length;"));
                return Ok(());
            }
            CollectionAccessVariant::Add | CollectionAccessVariant::Remove => {}
        }

        // Mutations. Classify the root to decide the persistence tail.
        let resolved = root.and_then(|root| {
            let name = self.arena.identifier_name(root);
            self.info
                .resolve(self.current_table, name, root)
                .map(|info| (name.to_string(), info.kind))
        });
        if let Some((_, SymbolKind::Data)) = &resolved {
            self.require_async()?;
        }

        let operand = self.capture(data.operand.expect("mutations take an element"))?;
        match data.variant {
            CollectionAccessVariant::Add => {
                self.write(&format!("{collection}.push(({operand}));"));
            }
            CollectionAccessVariant::Remove => {
                self.write(&format!(
                    "($c=>{{const $i=$c.indexOf(({operand}));if($i>=0)$c.splice($i,1);}})({collection});"
                ));
            }
            _ => unreachable!(),
        }

        match resolved {
            Some((name, SymbolKind::Data)) => {
                let flat = js_string(&name);
                if chain.is_empty() {
                    self.write(&format!(
                        "await $runtime.persistent.set({flat},{name});$runtime.notifySet({flat},{name});"
                    ));
                } else {
                    let keys = self.key_path(chain)?;
                    self.write(&format!(
                        "await $runtime.persistent.setNested({flat},[{keys}],{collection});$runtime.notifySet({flat},{name});"
                    ));
                }
            }
            Some((name, SymbolKind::Temp)) => {
                let flat = js_string(&name);
                self.write(&format!("$runtime.notifySet({flat},{name});"));
            }
            Some((name, SymbolKind::Const)) => {
                self.diagnostics.emit(
                    ErrorKind::AssignToConst,
                    self.arena.source(id).clone(),
                    format!("`{name}`: cannot mutate a built-in context variable"),
                );
            }
            Some((name, SymbolKind::Function)) => {
                self.diagnostics.emit(
                    ErrorKind::AssignToFunction,
                    self.arena.source(id).clone(),
                    format!("`{name}`: cannot mutate a function"),
                );
            }
            Some((_, SymbolKind::Local)) | None => {}
        }
        Ok(())
    }

    /// Lowers a reference chain to comma-separated key expressions for the
    /// persistence API's nested form.
    pub(crate) fn key_path(&mut self, chain: &[NodeId]) -> Result<String, super::Suspend> {
        let mut keys = String::new();
        for (index, &key) in chain.iter().enumerate() {
            if index > 0 {
                keys.push(',');
            }
            let text = self.reference_key(key)?;
            keys.push_str(&text);
        }
        Ok(keys)
    }
}
