//! Results of binding resolution, consumed by the code generator.

use exclaim_ast::NodeId;
use rustc_hash::FxHashMap;

use crate::symbol_table::{SymbolInfo, SymbolTableId, SymbolTables};

pub struct SemanticInfo {
    pub tables: SymbolTables,
    /// The per-compilation root table, pre-populated with the host's magic
    /// constant names.
    pub root_table: SymbolTableId,
    /// Node identity → the symbol table created for that node. Populated
    /// for every scope-opening node; the code generator tracks its current
    /// table through this map while it descends.
    pub node_tables: FxHashMap<NodeId, SymbolTableId>,
}

impl SemanticInfo {
    /// Resolve a name as seen from `table` at the given use site.
    pub fn resolve(
        &self,
        table: SymbolTableId,
        name: &str,
        use_site: NodeId,
    ) -> Option<&SymbolInfo> {
        self.tables.resolve(table, name, use_site)
    }
}
