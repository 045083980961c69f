//! Generic depth-first traversal with enter/exit hooks.
//!
//! Every node is visited exactly once pre-order (enter) and once post-order
//! (exit). For both, the generic hook fires before the variant-specific
//! hook. Recursion into `children` happens regardless of whether a specific
//! hook exists for the variant; listeners only implement the hooks they
//! care about.

use crate::arena::{AstArena, NodeId};
use crate::node::*;

macro_rules! define_listener {
    ($({ $variant:ident, $data:ident, $visit:ident, $enter:ident, $exit:ident })*) => {
        pub trait AstListener {
            fn enter_node(&mut self, arena: &AstArena, id: NodeId) {
                let _ = (arena, id);
            }

            fn exit_node(&mut self, arena: &AstArena, id: NodeId) {
                let _ = (arena, id);
            }

            $(
                fn $enter(&mut self, arena: &AstArena, id: NodeId, data: &$data) {
                    let _ = (arena, id, data);
                }

                fn $exit(&mut self, arena: &AstArena, id: NodeId, data: &$data) {
                    let _ = (arena, id, data);
                }
            )*
        }

        fn dispatch_enter<L: AstListener + ?Sized>(arena: &AstArena, id: NodeId, listener: &mut L) {
            match arena.kind(id) {
                $(NodeKind::$variant(data) => listener.$enter(arena, id, data),)*
            }
        }

        fn dispatch_exit<L: AstListener + ?Sized>(arena: &AstArena, id: NodeId, listener: &mut L) {
            match arena.kind(id) {
                $(NodeKind::$variant(data) => listener.$exit(arena, id, data),)*
            }
        }
    };
}
with_ast_variants!(define_listener);

pub fn walk<L: AstListener + ?Sized>(arena: &AstArena, id: NodeId, listener: &mut L) {
    listener.enter_node(arena, id);
    dispatch_enter(arena, id, listener);
    for child in arena.children(id) {
        walk(arena, child, listener);
    }
    listener.exit_node(arena, id);
    dispatch_exit(arena, id, listener);
}

#[cfg(test)]
mod tests {
    use super::*;
    use exclaim_common::SourceInfo;

    #[derive(Default)]
    struct CountingListener {
        entered: Vec<NodeId>,
        exited: Vec<NodeId>,
        identifiers: Vec<String>,
    }

    impl AstListener for CountingListener {
        fn enter_node(&mut self, _arena: &AstArena, id: NodeId) {
            self.entered.push(id);
        }

        fn exit_node(&mut self, _arena: &AstArena, id: NodeId) {
            self.exited.push(id);
        }

        fn enter_identifier(&mut self, _arena: &AstArena, _id: NodeId, data: &Identifier) {
            self.identifiers.push(data.name.clone());
        }
    }

    #[test]
    fn visits_every_node_once_pre_and_post() {
        let mut arena = AstArena::new();
        let lhs = arena.alloc_identifier("x", SourceInfo::builtin());
        let rhs = arena.alloc(
            NodeKind::NumberLiteral(NumberLiteral { value: 1.0 }),
            SourceInfo::builtin(),
        );
        let sum = arena.alloc(
            NodeKind::BinaryOpExpression(BinaryOpExpression {
                operator: BinaryOperator::Add,
                lhs,
                rhs,
            }),
            SourceInfo::builtin(),
        );
        let send = arena.alloc(NodeKind::Send(Send { message: sum }), SourceInfo::builtin());

        let mut listener = CountingListener::default();
        walk(&arena, send, &mut listener);

        // Pre-order on the way in, post-order on the way out.
        assert_eq!(listener.entered, vec![send, sum, lhs, rhs]);
        assert_eq!(listener.exited, vec![lhs, rhs, sum, send]);
        assert_eq!(listener.identifiers, vec!["x".to_string()]);
    }
}
