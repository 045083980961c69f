//! Single-dispatch visitor.
//!
//! `accept` calls the variant-specific transform if the visitor defines one,
//! otherwise the default falls through to the node's first child. Concrete
//! visitors (the code generator) define a handler for every variant; the
//! fallback mainly matters for partial visitors in tests.

use crate::arena::{AstArena, NodeId};
use crate::node::*;

macro_rules! define_visitor {
    ($({ $variant:ident, $data:ident, $visit:ident, $enter:ident, $exit:ident })*) => {
        pub trait AstVisitor<T> {
            fn before_visit(&mut self, arena: &AstArena, id: NodeId) {
                let _ = (arena, id);
            }

            fn after_visit(&mut self, arena: &AstArena, id: NodeId) {
                let _ = (arena, id);
            }

            fn visit(&mut self, arena: &AstArena, id: NodeId) -> T
            where
                Self: Sized,
            {
                accept(arena, id, self)
            }

            /// Degenerate default used when no variant handler exists:
            /// descend into the first child. Panics on a leaf, which is a
            /// visitor bug, not an input error.
            fn visit_children(&mut self, arena: &AstArena, id: NodeId) -> T
            where
                Self: Sized,
            {
                let children = arena.children(id);
                let first = children
                    .first()
                    .copied()
                    .expect("visitor has no handler for a leaf node");
                accept(arena, first, self)
            }

            $(
                fn $visit(&mut self, arena: &AstArena, id: NodeId, data: &$data) -> T
                where
                    Self: Sized,
                {
                    let _ = data;
                    self.visit_children(arena, id)
                }
            )*
        }

        pub fn accept<T, V: AstVisitor<T>>(arena: &AstArena, id: NodeId, visitor: &mut V) -> T {
            visitor.before_visit(arena, id);
            let result = match arena.kind(id) {
                $(NodeKind::$variant(data) => visitor.$visit(arena, id, data),)*
            };
            visitor.after_visit(arena, id);
            result
        }
    };
}
with_ast_variants!(define_visitor);

#[cfg(test)]
mod tests {
    use super::*;
    use exclaim_common::SourceInfo;

    /// Only handles identifiers; everything else must fall through to the
    /// first child.
    struct FirstIdentifier;

    impl AstVisitor<String> for FirstIdentifier {
        fn visit_identifier(&mut self, _arena: &AstArena, _id: NodeId, data: &Identifier) -> String {
            data.name.clone()
        }
    }

    #[test]
    fn falls_back_to_first_child() {
        let mut arena = AstArena::new();
        let variable = arena.alloc_identifier("score", SourceInfo::builtin());
        let value = arena.alloc(
            NodeKind::NumberLiteral(NumberLiteral { value: 3.0 }),
            SourceInfo::builtin(),
        );
        let set = arena.alloc(
            NodeKind::Set(Set {
                variable,
                expression: value,
            }),
            SourceInfo::builtin(),
        );

        let mut visitor = FirstIdentifier;
        assert_eq!(accept(&arena, set, &mut visitor), "score");
    }
}
