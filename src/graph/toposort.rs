//! Topological Sorter (spec §4.4): Kahn's algorithm over an arbitrary
//! subset of a [`GraphState`]'s tables, generalized from the teacher's
//! `SchemaGraph::topo_sort` to work over an id set rather than a dense
//! `0..n` table-id range, since we run it twice over two different subsets
//! of the same graph (the full reached set, then the outsiders alone).

use crate::error::SliceError;
use crate::schema::TableId;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// Order `subset` so that every table appears before anything in `subset`
/// that depends on it (parents before children), using only the edges of
/// `deps`/`inv` that stay within `subset`.
///
/// A self-referential FK (`deps[t]` contains `t` itself) is tolerated: it
/// is skipped when computing in-degree rather than counted as a cycle
/// (spec boundary case — a table referencing itself must still produce an
/// order).
///
/// Returns [`SliceError::Cycle`] naming how many tables were left
/// unordered if the induced subgraph isn't acyclic.
pub fn topo_sort(
    subset: &AHashSet<TableId>,
    deps: &AHashMap<TableId, AHashSet<TableId>>,
    inv: &AHashMap<TableId, AHashSet<TableId>>,
) -> Result<Vec<TableId>, SliceError> {
    let n = subset.len();

    let mut in_degree: AHashMap<TableId, usize> = AHashMap::default();
    for &t in subset {
        let degree = deps
            .get(&t)
            .map(|parents| parents.iter().filter(|&&p| p != t && subset.contains(&p)).count())
            .unwrap_or(0);
        in_degree.insert(t, degree);
    }

    let mut queue: VecDeque<TableId> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&t, _)| t)
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(t) = queue.pop_front() {
        order.push(t);
        if let Some(children) = inv.get(&t) {
            for &c in children {
                if c == t || !subset.contains(&c) {
                    continue;
                }
                let degree = in_degree.get_mut(&c).expect("child is in subset");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(c);
                }
            }
        }
    }

    if order.len() != n {
        return Err(SliceError::Cycle(n - order.len(), n));
    }

    Ok(order)
}

/// Order the outsider subset so that every table appears *after* every
/// other outsider that references it (children before parents) — the
/// reverse of [`topo_sort`]'s parents-before-children order.
///
/// Spec §4.5.1 has an outsider `T`'s WHERE clause read seed values from
/// each `dependant ∈ inv[T]`'s already-written parsed CSV, so a dependant
/// (an outsider that references `T`) must be extracted *before* `T`
/// itself — the opposite discipline from the descendant/global passes,
/// where a table's own parents must be extracted first. Implemented by
/// running the same Kahn's algorithm as [`topo_sort`] with `deps`/`inv`
/// swapped: in-degree counts children instead of parents, so a table
/// with no referencing outsiders is seeded first.
pub fn outsider_topo_sort(
    outsiders: &AHashSet<TableId>,
    deps: &AHashMap<TableId, AHashSet<TableId>>,
    inv: &AHashMap<TableId, AHashSet<TableId>>,
) -> Result<Vec<TableId>, SliceError> {
    topo_sort(outsiders, inv, deps)
}
