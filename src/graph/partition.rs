//! Partitioner (spec §4.3): splits the reached set into direct descendants
//! of the root and outsiders.

use super::GraphState;
use crate::error::SliceError;
use crate::schema::TableId;
use ahash::AHashSet;
use std::collections::VecDeque;

/// The two disjoint halves of a graph's reached set.
pub struct Partition {
    pub direct_descendants: AHashSet<TableId>,
    pub outsiders: AHashSet<TableId>,
}

/// Walk `inv` breadth-first from `root` to find every table reachable by
/// following "is referenced by" edges forward — the root's transitive
/// dependants. Everything else in `reached` is an outsider: a table pulled
/// in only because something downstream of the root points at it.
pub fn partition(state: &GraphState, root: TableId) -> Result<Partition, SliceError> {
    let mut direct_descendants = AHashSet::default();
    direct_descendants.insert(root);
    let mut queue = VecDeque::new();
    queue.push_back(root);

    while let Some(t) = queue.pop_front() {
        if let Some(children) = state.inv.get(&t) {
            for &c in children {
                if direct_descendants.insert(c) {
                    queue.push_back(c);
                }
            }
        }
    }

    let outsiders: AHashSet<TableId> = state
        .reached
        .difference(&direct_descendants)
        .copied()
        .collect();

    if direct_descendants.len() + outsiders.len() != state.reached.len() {
        return Err(SliceError::Invariant(format!(
            "partition sizes do not add up: {} descendants + {} outsiders != {} reached",
            direct_descendants.len(),
            outsiders.len(),
            state.reached.len()
        )));
    }
    if !direct_descendants.is_disjoint(&outsiders) {
        return Err(SliceError::Invariant(
            "direct descendants and outsiders overlap".to_string(),
        ));
    }

    Ok(Partition {
        direct_descendants,
        outsiders,
    })
}
