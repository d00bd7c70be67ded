use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use super::vertex::{ShortId, Vertex};

/// Vertices keyed by short id, plus the order they were admitted in.
///
/// Every id in the admission order has exactly one map entry and vice versa.
#[derive(Debug, Default)]
pub struct VertexStore {
    vertices: HashMap<ShortId, Vertex>,
    admission: BTreeMap<u64, ShortId>,
    next_admission: u64,
}

impl VertexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a vertex or merges `parents` into the existing one.
    ///
    /// Passing `None` leaves the recorded parents untouched, so a stub stays a
    /// stub. Returns the vertex and whether it was freshly admitted.
    pub fn upsert(
        &mut self,
        short_id: ShortId,
        full_id: &str,
        parents: Option<&[ShortId]>,
    ) -> (&Vertex, bool) {
        let admission = &mut self.admission;
        let next_admission = &mut self.next_admission;
        let (vertex, is_new) = match self.vertices.entry(short_id) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => {
                let admitted = *next_admission;
                *next_admission += 1;
                admission.insert(admitted, entry.key().clone());
                let vertex = Vertex::new(entry.key().clone(), full_id.to_owned(), admitted);
                (entry.insert(vertex), true)
            }
        };
        if let Some(parents) = parents {
            vertex.merge_parents(parents);
        }

        (vertex, is_new)
    }

    pub fn get(&self, short_id: &str) -> Option<&Vertex> {
        self.vertices.get(short_id)
    }

    pub(crate) fn get_mut(&mut self, short_id: &str) -> Option<&mut Vertex> {
        self.vertices.get_mut(short_id)
    }

    pub fn contains(&self, short_id: &str) -> bool {
        self.vertices.contains_key(short_id)
    }

    /// Removes the vertex and its admission slot. Edges are left to the caller.
    pub fn remove(&mut self, short_id: &str) -> Option<Vertex> {
        let vertex = self.vertices.remove(short_id)?;
        self.admission.remove(&vertex.admitted);
        Some(vertex)
    }

    pub fn oldest(&self) -> Option<&ShortId> {
        self.admission.values().next()
    }

    pub fn admission_order(&self) -> impl Iterator<Item = &ShortId> {
        self.admission.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.admission.clear();
        self.next_admission = 0;
    }
}
