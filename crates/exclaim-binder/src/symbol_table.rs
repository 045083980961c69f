//! Lexical symbol tables.
//!
//! Tables live in an arena and chain to their parent by id; the binder
//! creates and abandons them following scope nesting, and `SemanticInfo`
//! keeps the whole arena alive for the code generator.

use exclaim_ast::NodeId;
use rustc_hash::FxHashMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Host-injected magic variable; read-only.
    Const,
    /// Script-declared, persisted externally across runs.
    Data,
    /// Script-declared, process lifetime.
    Temp,
    /// Ordinary lexically-scoped variable.
    Local,
    /// User-defined function.
    Function,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SymbolInfo {
    pub kind: SymbolKind,
    /// The identifier node that declared this symbol. For `Local` symbols
    /// this drives the declared-before-use visibility check.
    pub declared_by: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolTableId(pub u32);

#[derive(Debug, Default)]
pub struct SymbolTable {
    parent: Option<SymbolTableId>,
    fields: FxHashMap<String, SymbolInfo>,
}

#[derive(Debug, Default)]
pub struct SymbolTables {
    tables: Vec<SymbolTable>,
}

impl SymbolTables {
    pub fn new() -> SymbolTables {
        SymbolTables::default()
    }

    pub fn alloc(&mut self, parent: Option<SymbolTableId>) -> SymbolTableId {
        let id = SymbolTableId(self.tables.len() as u32);
        self.tables.push(SymbolTable {
            parent,
            fields: FxHashMap::default(),
        });
        id
    }

    pub fn parent(&self, table: SymbolTableId) -> Option<SymbolTableId> {
        self.tables[table.0 as usize].parent
    }

    /// Force a binding in, bypassing the shadowing check. Used for fixed
    /// bindings seeded at table construction (parameters, injected context
    /// names), which win even over same-named locals in ancestor tables.
    pub fn provide(&mut self, table: SymbolTableId, name: impl Into<String>, info: SymbolInfo) {
        self.tables[table.0 as usize]
            .fields
            .insert(name.into(), info);
    }

    /// Add an incrementally-declared binding. Refuses when a `Local` of the
    /// same name is already visible from `table` (a local may not be
    /// silently replaced); any other kind may be shadowed.
    pub fn add_field(&mut self, table: SymbolTableId, name: &str, info: SymbolInfo) -> bool {
        if matches!(
            self.resolve(table, name, info.declared_by),
            Some(existing) if existing.kind == SymbolKind::Local
        ) {
            return false;
        }
        self.tables[table.0 as usize]
            .fields
            .insert(name.to_string(), info);
        true
    }

    /// Look a name up from `table` outwards, as seen from the identifier
    /// node `use_site`. Non-local symbols are always visible. A `Local` is
    /// visible only if it was declared at or before the use site (by node
    /// identity); otherwise the search *continues to the parent* rather
    /// than stopping, so a later redeclaration in the same block cannot
    /// retroactively hide an outer binding from an earlier reference.
    pub fn resolve(
        &self,
        table: SymbolTableId,
        name: &str,
        use_site: NodeId,
    ) -> Option<&SymbolInfo> {
        let mut current = Some(table);
        while let Some(id) = current {
            let entry = &self.tables[id.0 as usize];
            if let Some(info) = entry.fields.get(name)
                && (info.kind != SymbolKind::Local || info.declared_by <= use_site)
            {
                return Some(info);
            }
            current = entry.parent;
        }
        None
    }

    /// Like `resolve`, but also reports which table held the binding.
    pub fn resolve_with_table(
        &self,
        table: SymbolTableId,
        name: &str,
        use_site: NodeId,
    ) -> Option<(SymbolTableId, &SymbolInfo)> {
        let mut current = Some(table);
        while let Some(id) = current {
            let entry = &self.tables[id.0 as usize];
            if let Some(info) = entry.fields.get(name)
                && (info.kind != SymbolKind::Local || info.declared_by <= use_site)
            {
                return Some((id, info));
            }
            current = entry.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(id: u32) -> SymbolInfo {
        SymbolInfo {
            kind: SymbolKind::Local,
            declared_by: NodeId(id),
        }
    }

    #[test]
    fn add_field_rejects_visible_locals() {
        let mut tables = SymbolTables::new();
        let root = tables.alloc(None);
        assert!(tables.add_field(root, "x", local(1)));
        // Second declaration of the same local is rejected; the original
        // declaring identifier stays authoritative.
        assert!(!tables.add_field(root, "x", local(5)));
        let info = tables.resolve(root, "x", NodeId(10)).unwrap();
        assert_eq!(info.declared_by, NodeId(1));
    }

    #[test]
    fn locals_may_shadow_outer_non_locals() {
        let mut tables = SymbolTables::new();
        let root = tables.alloc(None);
        tables.provide(
            root,
            "count",
            SymbolInfo {
                kind: SymbolKind::Temp,
                declared_by: NodeId(0),
            },
        );
        let inner = tables.alloc(Some(root));
        assert!(tables.add_field(inner, "count", local(7)));
        let info = tables.resolve(inner, "count", NodeId(9)).unwrap();
        assert_eq!(info.kind, SymbolKind::Local);
    }

    #[test]
    fn later_locals_are_invisible_to_earlier_references() {
        let mut tables = SymbolTables::new();
        let root = tables.alloc(None);
        tables.provide(
            root,
            "count",
            SymbolInfo {
                kind: SymbolKind::Temp,
                declared_by: NodeId(0),
            },
        );
        let inner = tables.alloc(Some(root));
        // Declared at node 20, referenced at node 10: the inner local must
        // not win, and resolution must keep walking to the outer table.
        assert!(tables.add_field(inner, "count", local(20)));
        let earlier = tables.resolve(inner, "count", NodeId(10)).unwrap();
        assert_eq!(earlier.kind, SymbolKind::Temp);
        let later = tables.resolve(inner, "count", NodeId(25)).unwrap();
        assert_eq!(later.kind, SymbolKind::Local);
    }

    #[test]
    fn non_locals_ignore_identity_order() {
        let mut tables = SymbolTables::new();
        let root = tables.alloc(None);
        tables.provide(
            root,
            "message",
            SymbolInfo {
                kind: SymbolKind::Const,
                declared_by: NodeId(999),
            },
        );
        assert!(tables.resolve(root, "message", NodeId(1)).is_some());
    }
}
