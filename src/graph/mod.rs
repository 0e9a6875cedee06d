//! Dependency graph: the per-table adjacency and column-naming maps the
//! search engine and topological sorter consume.
//!
//! Every per-table dictionary the builder populates (`deps`, `inv`,
//! `fkey_cols`, `fkeys`, `inv_fkeys`, `table_fkey_needs`, `table_cols`) is
//! bundled into one owned [`GraphState`] value rather than threaded as
//! parallel arguments, similar to how a schema module bundles
//! table/column/FK maps into a single struct passed around by reference.

pub mod builder;
pub mod partition;
pub mod toposort;

pub use builder::GraphBuilder;
pub use partition::{partition, Partition};
pub use toposort::{outsider_topo_sort, topo_sort};

use crate::schema::{ColumnInfo, TableId};
use ahash::{AHashMap, AHashSet};

/// Everything discovered about the reached subgraph of the source schema.
///
/// Table names are interned to [`TableId`]s on first sight so every later
/// map can use a cheap `Copy` key instead of cloning strings.
#[derive(Debug, Default)]
pub struct GraphState {
    names: Vec<String>,
    index: AHashMap<String, TableId>,

    /// Tables reached by the BFS (root inclusive).
    pub reached: AHashSet<TableId>,

    /// `deps[t]` = tables `t` has a foreign key into.
    pub deps: AHashMap<TableId, AHashSet<TableId>>,
    /// `inv[t]` = tables that have a foreign key into `t`.
    pub inv: AHashMap<TableId, AHashSet<TableId>>,

    /// `fkey_cols[parent][child_col]` = the parent's own column that
    /// `child_col` refers to.
    pub fkey_cols: AHashMap<TableId, AHashMap<String, String>>,
    /// `fkeys[child][parent]` = the child's column referencing `parent`.
    pub fkeys: AHashMap<TableId, AHashMap<TableId, String>>,
    /// `inv_fkeys[parent][child]` = the child's column referencing `parent`
    /// (same values as `fkeys`, indexed from the parent's side for the
    /// outsider disjunction in the search engine).
    pub inv_fkeys: AHashMap<TableId, AHashMap<TableId, String>>,

    /// Columns of a table that some other table's FK constraint names —
    /// either as the referenced column, or as the table's own referencing
    /// column. Exactly the columns the parsed projection CSV must carry.
    pub table_fkey_needs: AHashMap<TableId, AHashSet<String>>,
    /// Full column map for each reached table.
    pub table_cols: AHashMap<TableId, AHashMap<String, ColumnInfo>>,

    /// Direct descendants of the root, filled in by [`partition::partition`].
    pub direct_descendants: AHashSet<TableId>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the id for `name`, interning it if this is the first time
    /// the graph has seen this table.
    pub fn intern(&mut self, name: &str) -> TableId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = TableId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// The name a previously interned id was given.
    pub fn name_of(&self, id: TableId) -> &str {
        &self.names[id.0 as usize]
    }

    /// The id previously assigned to `name`, if any.
    pub fn id_of(&self, name: &str) -> Option<TableId> {
        self.index.get(name).copied()
    }

    /// `reached - direct_descendants`.
    pub fn outsiders(&self) -> AHashSet<TableId> {
        self.reached
            .difference(&self.direct_descendants)
            .copied()
            .collect()
    }
}
