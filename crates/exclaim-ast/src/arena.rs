//! Node arena.
//!
//! Nodes live in one `Vec` per compilation; a `NodeId` is the index at which
//! a node was allocated. Allocation order is program order within any block
//! of sibling statements, which is the invariant the symbol table's
//! declared-before-use check relies on: if `a.id < b.id` and both sit in
//! separate statements of the same block, `a`'s statement comes first.

use exclaim_common::SourceInfo;
use smallvec::SmallVec;

use crate::node::{Identifier, NodeKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug)]
pub struct AstNode {
    pub id: NodeId,
    pub source: SourceInfo,
    pub kind: NodeKind,
}

pub type Children = SmallVec<[NodeId; 4]>;

#[derive(Debug, Default)]
pub struct AstArena {
    nodes: Vec<AstNode>,
}

impl AstArena {
    pub fn new() -> AstArena {
        AstArena::default()
    }

    pub fn with_capacity(capacity: usize) -> AstArena {
        AstArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Construct a node. Identities are handed out monotonically and are
    /// never reused within a compilation.
    pub fn alloc(&mut self, kind: NodeKind, source: SourceInfo) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(AstNode { id, source, kind });
        id
    }

    /// Shorthand for allocating an identifier written in program text.
    pub fn alloc_identifier(&mut self, name: impl Into<String>, source: SourceInfo) -> NodeId {
        self.alloc(
            NodeKind::Identifier(Identifier {
                name: name.into(),
                implicit: false,
            }),
            source,
        )
    }

    /// Shorthand for a compiler-synthesized identifier (the implicit result
    /// placeholder, injected context names).
    pub fn alloc_implicit_identifier(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(
            NodeKind::Identifier(Identifier {
                name: name.into(),
                implicit: true,
            }),
            SourceInfo::builtin(),
        )
    }

    pub fn get(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.get(id).kind
    }

    pub fn source(&self, id: NodeId) -> &SourceInfo {
        &self.get(id).source
    }

    pub fn identifier(&self, id: NodeId) -> Option<&Identifier> {
        match self.kind(id) {
            NodeKind::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }

    /// Name of an identifier node. Panics on non-identifier nodes; callers
    /// hold ids that are identifiers by construction.
    pub fn identifier_name(&self, id: NodeId) -> &str {
        &self
            .identifier(id)
            .expect("node is not an identifier")
            .name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AstNode> {
        self.nodes.iter()
    }

    /// The syntactically-contained subnodes of `id`, in left-to-right source
    /// order. This is the substrate for generic tree walking; the two
    /// passes otherwise use the strongly-typed payloads directly.
    pub fn children(&self, id: NodeId) -> Children {
        let mut children = Children::new();
        match self.kind(id) {
            NodeKind::Program(program) => children.extend(program.declarations.iter().copied()),
            NodeKind::FileImport(_) => {}
            NodeKind::ModuleImport(import) => children.extend(import.members.iter().copied()),
            NodeKind::DeclareVariable(declare) => {
                children.push(declare.name);
                children.push(declare.value);
            }
            NodeKind::GroupDefinition(group) => {
                children.push(group.name);
                children.extend(group.members.iter().copied());
            }
            NodeKind::CommandDefinition(command) => {
                children.push(command.name);
                children.extend(command.parameters.iter().copied());
                children.extend(command.rest_param);
                children.extend(command.statements.iter().copied());
            }
            NodeKind::FunctionDefinition(function) => {
                children.push(function.name);
                children.extend(function.parameters.iter().copied());
                children.extend(function.rest_param);
                children.extend(function.statements.iter().copied());
            }
            NodeKind::EventListenerDefinition(listener) => {
                children.extend(listener.statements.iter().copied());
            }
            NodeKind::ForEach(for_each) => {
                children.push(for_each.loop_variable);
                children.push(for_each.collection);
                children.extend(for_each.statements.iter().copied());
            }
            NodeKind::While(while_loop) => {
                children.push(while_loop.check_expression);
                children.extend(while_loop.statements.iter().copied());
            }
            NodeKind::If(if_statement) => {
                children.push(if_statement.check_expression);
                children.extend(if_statement.then_statements.iter().copied());
                if let Some(else_statements) = &if_statement.else_statements {
                    children.extend(else_statements.iter().copied());
                }
            }
            NodeKind::Send(send) => children.push(send.message),
            NodeKind::React(react) => {
                children.extend(react.target_message);
                children.push(react.reaction);
            }
            NodeKind::Fail(_) => {}
            NodeKind::Set(set) => {
                children.push(set.variable);
                children.push(set.expression);
            }
            NodeKind::Pick(pick) => {
                children.push(pick.collection);
                children.push(pick.assign_to);
            }
            NodeKind::Parse(parse) => {
                children.push(parse.expression);
                children.push(parse.assign_to);
                if let Some(else_statements) = &parse.else_statements {
                    children.extend(else_statements.iter().copied());
                }
            }
            NodeKind::ExprStatement(statement) => {
                children.push(statement.expression);
                children.push(statement.assign_to);
            }
            NodeKind::CollectionAccess(access) => {
                children.extend(access.operand);
                children.push(access.collection);
                children.extend(access.assign_to);
            }
            NodeKind::IsExpression(is_expression) => children.push(is_expression.expression),
            NodeKind::RelationalExpression(relational) => {
                children.extend(relational.expressions.iter().copied());
            }
            NodeKind::BinaryOpExpression(binary) => {
                children.push(binary.lhs);
                children.push(binary.rhs);
            }
            NodeKind::UnaryOpExpression(unary) => children.push(unary.expression),
            NodeKind::InvokeExpression(invoke) => {
                children.push(invoke.function);
                children.extend(invoke.arguments.iter().copied());
            }
            // Deliberately root-last: generic consumers process this node
            // structurally, and the keys precede the root there.
            NodeKind::OfExpression(of_expression) => {
                children.extend(of_expression.reference_chain.iter().copied());
                children.push(of_expression.root);
            }
            NodeKind::ListLiteral(list) => children.extend(list.values.iter().copied()),
            NodeKind::DictLiteral(dict) => {
                for (key, value) in dict.keys.iter().zip(dict.values.iter()) {
                    children.push(*key);
                    children.push(*value);
                }
            }
            NodeKind::Identifier(_)
            | NodeKind::JavascriptEscape(_)
            | NodeKind::RawStringLiteral(_)
            | NodeKind::TemplateStringLiteral(_)
            | NodeKind::NumberLiteral(_)
            | NodeKind::BooleanLiteral(_) => {}
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{BinaryOpExpression, BinaryOperator, NumberLiteral, OfExpression};

    fn number(arena: &mut AstArena, value: f64) -> NodeId {
        arena.alloc(
            NodeKind::NumberLiteral(NumberLiteral { value }),
            SourceInfo::builtin(),
        )
    }

    #[test]
    fn ids_are_monotonic() {
        let mut arena = AstArena::new();
        let a = number(&mut arena, 1.0);
        let b = number(&mut arena, 2.0);
        let c = arena.alloc(
            NodeKind::BinaryOpExpression(BinaryOpExpression {
                operator: BinaryOperator::Add,
                lhs: a,
                rhs: b,
            }),
            SourceInfo::builtin(),
        );
        assert!(a < b && b < c);
        assert_eq!(arena.get(c).id, c);
    }

    #[test]
    fn of_expression_children_are_root_last() {
        let mut arena = AstArena::new();
        let root = arena.alloc_identifier("a", SourceInfo::builtin());
        let key_b = arena.alloc_identifier("b", SourceInfo::builtin());
        let key_c = arena.alloc_identifier("c", SourceInfo::builtin());
        let of = arena.alloc(
            NodeKind::OfExpression(OfExpression {
                root,
                reference_chain: vec![key_b, key_c],
            }),
            SourceInfo::builtin(),
        );
        assert_eq!(arena.children(of).as_slice(), &[key_b, key_c, root]);
    }

    #[test]
    fn implicit_identifiers_are_builtin() {
        let mut arena = AstArena::new();
        let it = arena.alloc_implicit_identifier("it");
        assert!(arena.identifier(it).unwrap().implicit);
        assert!(arena.source(it).is_builtin());
        assert_eq!(arena.identifier_name(it), "it");
    }
}
