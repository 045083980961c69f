//! Declaration lowering and program assembly.
//!
//! A program emits in a fixed bucket order: imports, the context object,
//! variable shadow declarations, functions, then a `declareAll` call whose
//! completion gates command/event/group wiring and finally the runtime's
//! start routine.

use exclaim_ast::NodeId;
use exclaim_ast::node::*;
use exclaim_binder::ASYNC_FN_SUFFIX;

use super::{CodeGenerator, EmitResult, js_string};

impl CodeGenerator<'_> {
    pub(crate) fn emit_program(&mut self, data: &Program) -> EmitResult {
        let mut module_imports = Vec::new();
        let mut file_imports = Vec::new();
        let mut variables = Vec::new();
        let mut functions = Vec::new();
        let mut wired = Vec::new();
        for &declaration in &data.declarations {
            match self.arena.kind(declaration) {
                NodeKind::ModuleImport(_) => module_imports.push(declaration),
                NodeKind::FileImport(_) => file_imports.push(declaration),
                NodeKind::DeclareVariable(_) => variables.push(declaration),
                NodeKind::FunctionDefinition(_) => functions.push(declaration),
                _ => wired.push(declaration),
            }
        }

        let runtime = js_string(&self.options.runtime_module);
        self.write(&format!("import{{$runtime}}from{runtime};\n"));
        for &id in &module_imports {
            self.emit(id)?;
            self.write("\n");
        }
        for &id in &file_imports {
            self.emit(id)?;
            self.write("\n");
        }

        self.write("const $context=$runtime.context;\n");
        if !self.options.global_fields.is_empty() {
            let fields = self.options.global_fields.join(",");
            self.write(&format!("const{{{fields}}}=$context;\n"));
        }

        for &id in &variables {
            self.emit(id)?;
            self.write("\n");
        }
        for &id in &functions {
            self.emit(id)?;
            self.write("\n");
        }

        // Register every data variable with the persistence store, then
        // wire commands and listeners only once that completes.
        let mut entries = String::new();
        for &id in &variables {
            let NodeKind::DeclareVariable(declare) = self.arena.kind(id) else {
                continue;
            };
            if declare.variant != VariableVariant::Data {
                continue;
            }
            let name = self.arena.identifier_name(declare.name).to_string();
            let default = self.capture(declare.value)?;
            if !entries.is_empty() {
                entries.push(',');
            }
            entries.push_str(&format!(
                "[{},{default},$v=>{{{name}=$v;}}]",
                js_string(&name)
            ));
        }
        self.write(&format!(
            "$runtime.persistent.declareAll([{entries}]).then(()=>{{\n"
        ));
        for &id in &wired {
            self.emit(id)?;
            self.write("\n");
        }
        self.write("return $runtime.start();});\n");
        Ok(())
    }

    /// File imports that survive to emission are passthroughs; inlined ones
    /// were replaced by their declarations during parsing.
    pub(crate) fn emit_file_import(&mut self, data: &FileImport) -> EmitResult {
        let filename = js_string(&data.filename);
        self.write(&format!("import{filename};"));
        Ok(())
    }

    pub(crate) fn emit_module_import(&mut self, data: &ModuleImport) -> EmitResult {
        let members = data
            .members
            .iter()
            .map(|&member| self.arena.identifier_name(member))
            .collect::<Vec<_>>()
            .join(",");
        let filename = js_string(&data.filename);
        self.write(&format!("import{{{members}}}from{filename};"));
        Ok(())
    }

    /// Both variants declare a module-level shadow; `data` shadows are kept
    /// in sync by the persistence layer's update callback.
    pub(crate) fn emit_declare_variable(&mut self, data: &DeclareVariable) -> EmitResult {
        let name = self.arena.identifier_name(data.name).to_string();
        let value = self.capture(data.value)?;
        self.write(&format!("let {name}={value};"));
        Ok(())
    }

    /// Groups lower to a block so nested function declarations stay
    /// namespaced; the group's name only survives in command paths.
    pub(crate) fn emit_group_definition(&mut self, data: &GroupDefinition) -> EmitResult {
        let name = self.arena.identifier_name(data.name).to_string();
        self.group_path.push(name);
        self.write("{");
        let result = (|| {
            for &member in &data.members {
                self.emit(member)?;
            }
            Ok(())
        })();
        self.group_path.pop();
        result?;
        self.write("}");
        Ok(())
    }

    pub(crate) fn emit_command_definition(&mut self, data: &CommandDefinition) -> EmitResult {
        let name = self.arena.identifier_name(data.name);
        let path = self
            .group_path
            .iter()
            .map(|group| js_string(group))
            .collect::<Vec<_>>()
            .join(",");
        self.write(&format!(
            "$runtime.commands.add({},[{path}],async(message,$rest)=>{{const author=message.author;",
            js_string(name)
        ));
        self.destructure_arguments(data);

        let saved = self.in_async;
        self.in_async = true;
        let body = self.emit_statements(&data.statements);
        self.in_async = saved;
        body?;
        self.write("});");
        Ok(())
    }

    /// Turns the raw remainder-of-input string into the declared
    /// positional parameters. Insufficient arity returns the sentinel the
    /// dispatch layer uses to fall through to a less-specific command.
    fn destructure_arguments(&mut self, data: &CommandDefinition) {
        let params: Vec<String> = data
            .parameters
            .iter()
            .map(|&param| self.arena.identifier_name(param).to_string())
            .collect();
        let arity = params.len();

        match data.rest_param_variant {
            RestParamVariant::None | RestParamVariant::List => {
                let rest = data
                    .rest_param
                    .map(|rest| self.arena.identifier_name(rest).to_string());
                if arity == 0 && rest.is_none() {
                    return;
                }
                self.write(
                    "const $args=$rest.trim().split(/\\s+/).filter($t=>$t.length>0);",
                );
                if arity > 0 {
                    self.write(&format!(
                        "if($args.length<{arity})return\"failed-args\";"
                    ));
                }
                let mut bindings = params.join(",");
                if let Some(rest) = rest {
                    if !bindings.is_empty() {
                        bindings.push(',');
                    }
                    bindings.push_str(&format!("...{rest}"));
                }
                self.write(&format!("const[{bindings}]=$args;"));
            }
            RestParamVariant::String => {
                let rest = data
                    .rest_param
                    .map(|rest| self.arena.identifier_name(rest).to_string())
                    .expect("string rest variant always names its parameter");
                if arity == 0 {
                    self.write(&format!("const {rest}=$rest;"));
                    return;
                }
                // One \S+ group per fixed parameter, then the greedy
                // remainder.
                let mut pattern = String::from("/^\\s*");
                for index in 0..arity {
                    if index > 0 {
                        pattern.push_str("\\s+");
                    }
                    pattern.push_str("(\\S+)");
                }
                pattern.push_str("\\s+([\\s\\S]+)$/");
                self.write(&format!(
                    "const $match={pattern}.exec($rest);if($match===null)return\"failed-args\";"
                ));
                self.write(&format!(
                    "const[,{},{rest}]=$match;",
                    params.join(",")
                ));
            }
        }
    }

    /// Every function emits twice: a synchronous version for plain call
    /// sites and a `$async`-suffixed version for suspending contexts. When
    /// the body itself needs suspension the synchronous attempt is rolled
    /// back and replaced by a stub that directs callers to the async entry
    /// point.
    pub(crate) fn emit_function_definition(&mut self, data: &FunctionDefinition) -> EmitResult {
        let name = self.arena.identifier_name(data.name).to_string();
        let mut params: Vec<String> = data
            .parameters
            .iter()
            .map(|&param| self.arena.identifier_name(param).to_string())
            .collect();
        if let Some(rest) = data.rest_param {
            params.push(format!("...{}", self.arena.identifier_name(rest)));
        }
        let signature = format!("({})", params.join(","));

        let saved = self.in_async;
        let checkpoint = self.out.len();
        self.write(&format!("function {name}{signature}{{"));
        self.in_async = false;
        let sync_body = self.function_body(&data.statements);
        self.in_async = saved;
        match sync_body {
            Ok(()) => self.write("}"),
            Err(_) => {
                self.out.truncate(checkpoint);
                let message = js_string(&format!(
                    "{name} requires an asynchronous caller; use {name}{ASYNC_FN_SUFFIX}"
                ));
                self.write(&format!(
                    "function {name}{signature}{{throw new Error({message});}}"
                ));
            }
        }
        self.write("\n");

        self.write(&format!(
            "async function {name}{ASYNC_FN_SUFFIX}{signature}{{"
        ));
        self.in_async = true;
        let async_body = self.function_body(&data.statements);
        self.in_async = saved;
        async_body?;
        self.write("}");
        Ok(())
    }

    /// A body whose final statement produces a value returns that value.
    fn function_body(&mut self, statements: &[NodeId]) -> EmitResult {
        self.emit_statements(statements)?;
        if let Some(&last) = statements.last()
            && let Some(target) = self.arena.kind(last).assign_target()
        {
            let name = self.arena.identifier_name(target);
            self.write(&format!("return {name};"));
        }
        Ok(())
    }

    pub(crate) fn emit_event_listener_definition(
        &mut self,
        data: &EventListenerDefinition,
    ) -> EmitResult {
        let params = self
            .options
            .events
            .get(&data.event)
            .map(|params| params.join(","))
            .unwrap_or_default();
        self.write(&format!(
            "$runtime.events.register({},async({params})=>{{",
            js_string(&data.event)
        ));
        let saved = self.in_async;
        self.in_async = true;
        let body = self.emit_statements(&data.statements);
        self.in_async = saved;
        body?;
        self.write("});");
        Ok(())
    }
}
