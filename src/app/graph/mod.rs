use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tangle_visualizer::tangle::{
    Counts, GraphSubscriber, ShortId, Vertex, VertexOp, VertexState,
};

mod build;
mod interaction;
mod view;

/// What the renderer keeps of a vertex.
#[derive(Clone, Debug)]
pub(super) struct NodeSnapshot {
    pub(super) id: ShortId,
    pub(super) full_id: String,
    pub(super) parents: Vec<ShortId>,
    pub(super) state: VertexState,
    pub(super) is_milestone: bool,
    pub(super) is_tip: bool,
    pub(super) is_selected: bool,
    pub(super) admitted: u64,
}

impl From<&Vertex> for NodeSnapshot {
    fn from(vertex: &Vertex) -> Self {
        Self {
            id: vertex.short_id.clone(),
            full_id: vertex.full_id.clone(),
            parents: vertex.parent_ids().to_vec(),
            state: vertex.state(),
            is_milestone: vertex.flags.is_milestone,
            is_tip: vertex.flags.is_tip,
            is_selected: vertex.flags.is_selected,
            admitted: vertex.admitted,
        }
    }
}

pub(super) enum RenderChange {
    Vertex(NodeSnapshot, VertexOp),
    Counts(Counts),
    Confirmed(ShortId),
}

/// Engine subscriber that only queues changes; the app applies them once the
/// engine call that produced them has returned.
pub(super) struct RenderSink {
    changes: Rc<RefCell<Vec<RenderChange>>>,
}

impl RenderSink {
    pub(super) fn new(changes: Rc<RefCell<Vec<RenderChange>>>) -> Self {
        Self { changes }
    }
}

impl GraphSubscriber for RenderSink {
    fn on_vertex(&mut self, vertex: &Vertex, op: VertexOp) {
        self.changes
            .borrow_mut()
            .push(RenderChange::Vertex(NodeSnapshot::from(vertex), op));
    }

    fn on_counts(&mut self, counts: Counts) {
        self.changes.borrow_mut().push(RenderChange::Counts(counts));
    }

    fn on_confirmed(&mut self, id: &ShortId, _excluded: &[ShortId]) {
        self.changes
            .borrow_mut()
            .push(RenderChange::Confirmed(id.clone()));
    }
}

pub(super) struct RenderNode {
    pub(super) snapshot: NodeSnapshot,
    pub(super) x: f32,
    pub(super) y: f32,
    pub(super) velocity: f32,
    /// Fades from 1 to 0 after the vertex is named in a confirmation.
    pub(super) flash: f32,
}

#[derive(Default)]
pub(super) struct RenderGraph {
    pub(super) nodes: Vec<RenderNode>,
    pub(super) index_by_id: HashMap<ShortId, usize>,
    pub(super) newest_admitted: Option<u64>,
    pub(super) revision: u64,
    pub(super) layout_scratch: LayoutScratch,
}

#[derive(Default)]
pub(super) struct LayoutScratch {
    pub(super) forces: Vec<f32>,
    pub(super) buckets: HashMap<i32, Vec<usize>>,
}

impl RenderGraph {
    pub(super) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(super) fn get(&self, id: &ShortId) -> Option<&RenderNode> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub(super) fn clear(&mut self) {
        self.nodes.clear();
        self.index_by_id.clear();
        self.newest_admitted = None;
        self.revision = self.revision.wrapping_add(1);
    }
}
