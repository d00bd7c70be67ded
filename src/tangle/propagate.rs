use std::collections::HashSet;

use super::store::VertexStore;
use super::vertex::{Flag, ShortId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Confirmed,
    Conflicting,
}

impl Resolution {
    pub fn flag(self) -> Flag {
        match self {
            Self::Confirmed => Flag::Referenced,
            Self::Conflicting => Flag::Conflicting,
        }
    }
}

/// Walks the unresolved past cone of `root` and decides how each vertex in it
/// resolves.
///
/// The walk starts at `root`'s parents and never expands through a vertex
/// that is missing from the store or already referenced/conflicting, so its
/// cost is bounded by the unresolved frontier. Vertices in `excluded` resolve
/// as conflicting, everything else as confirmed. `root` itself is never part
/// of the result.
///
/// Only vertices that were unresolved when the walk started are visited, so
/// applying the result afterwards is equivalent to marking while walking.
pub fn resolve_ancestors<'a>(
    store: &'a VertexStore,
    root: &'a ShortId,
    excluded: &HashSet<ShortId>,
) -> Vec<(ShortId, Resolution)> {
    let Some(root_vertex) = store.get(root.as_str()) else {
        return Vec::new();
    };

    let mut worklist = root_vertex.parent_ids().iter().rev().collect::<Vec<_>>();
    let mut seen = HashSet::from([root]);
    let mut resolved = Vec::new();

    while let Some(id) = worklist.pop() {
        if !seen.insert(id) {
            continue;
        }

        let Some(vertex) = store.get(id.as_str()) else {
            continue;
        };
        if vertex.flags.is_resolved() {
            continue;
        }

        let resolution = if excluded.contains(id) {
            Resolution::Conflicting
        } else {
            Resolution::Confirmed
        };
        resolved.push((id.clone(), resolution));

        worklist.extend(vertex.parent_ids().iter().rev());
    }

    resolved
}
