//! Graph builder: breadth-first discovery of the reached subgraph from a
//! single root table.

use super::GraphState;
use crate::db::SchemaIntrospector;
use crate::error::SliceError;
use crate::schema::TableId;
use std::collections::VecDeque;

pub struct GraphBuilder;

impl GraphBuilder {
    /// Breadth-first discovery starting from `root_table`.
    ///
    /// For each dequeued table `T`: query its children (tables that
    /// reference `T`), query its parents (tables `T` references), and
    /// record its full column list. Any table seen for the first time
    /// through either query is enqueued.
    pub async fn discover(
        introspector: &dyn SchemaIntrospector,
        root_table: &str,
    ) -> Result<(GraphState, TableId), SliceError> {
        let mut state = GraphState::new();
        let root = state.intern(root_table);

        let mut reached = ahash::AHashSet::default();
        reached.insert(root);
        let mut queue = VecDeque::new();
        queue.push_back(root);

        while let Some(t) = queue.pop_front() {
            let t_name = state.name_of(t).to_string();

            // Children of T: tables whose FK points at T. T is the parent
            // of this edge, so `fkey_cols`/`table_fkey_needs` record T's
            // own referenced column here.
            for edge in introspector.children_of(&t_name).await? {
                let c = state.intern(&edge.child_table);

                state.deps.entry(c).or_default().insert(t);
                state.inv.entry(t).or_default().insert(c);
                state
                    .fkey_cols
                    .entry(t)
                    .or_default()
                    .insert(edge.child_column.clone(), edge.parent_column.clone());
                state
                    .table_fkey_needs
                    .entry(t)
                    .or_default()
                    .insert(edge.parent_column.clone());
                state
                    .fkeys
                    .entry(c)
                    .or_default()
                    .insert(t, edge.child_column.clone());
                state
                    .inv_fkeys
                    .entry(t)
                    .or_default()
                    .insert(c, edge.child_column.clone());

                if reached.insert(c) {
                    queue.push_back(c);
                }
            }

            // Parents of T: tables T's own FK points at. T is the child of
            // this edge; its own referencing column must be recorded in
            // `table_fkey_needs[T]` so T's parsed projection carries it —
            // an upstream outsider pass reads it back as seed values.
            for edge in introspector.parents_of(&t_name).await? {
                let f = state.intern(&edge.parent_table);

                state.deps.entry(t).or_default().insert(f);
                state.inv.entry(f).or_default().insert(t);
                state
                    .table_fkey_needs
                    .entry(t)
                    .or_default()
                    .insert(edge.child_column.clone());
                state
                    .fkeys
                    .entry(t)
                    .or_default()
                    .insert(f, edge.child_column.clone());

                if reached.insert(f) {
                    queue.push_back(f);
                }
            }

            let cols = introspector.columns_of(&t_name).await?;
            state.table_cols.insert(t, cols.into_iter().collect());
        }

        state.reached = reached;
        Ok((state, root))
    }
}
