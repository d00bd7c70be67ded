use tangle_visualizer::tangle::{ShortId, VertexOp, VertexState};
use tangle_visualizer::util::stable_unit;

use super::{NodeSnapshot, RenderGraph, RenderNode};

pub(in crate::app) const COLUMN_SPACING: f32 = 5.0;
const SPAWN_JITTER: f32 = 90.0;
const STUB_LAG_COLUMNS: f32 = 3.0;
const FLASH_DECAY_PER_SEC: f32 = 0.8;

pub(in crate::app) fn column_x(admitted: u64) -> f32 {
    admitted as f32 * COLUMN_SPACING
}

impl RenderGraph {
    pub(in crate::app) fn apply_vertex(&mut self, snapshot: NodeSnapshot, op: VertexOp) {
        match op {
            VertexOp::Add => self.insert(snapshot),
            VertexOp::Update => match self.index_by_id.get(&snapshot.id) {
                Some(&index) => self.nodes[index].snapshot = snapshot,
                None => self.insert(snapshot),
            },
            VertexOp::Delete => self.remove(&snapshot.id),
        }
        self.revision = self.revision.wrapping_add(1);
    }

    pub(in crate::app) fn flash(&mut self, id: &ShortId) {
        if let Some(&index) = self.index_by_id.get(id) {
            self.nodes[index].flash = 1.0;
        }
    }

    /// Returns whether any flash is still visible.
    pub(in crate::app) fn fade_flashes(&mut self, delta_seconds: f32) -> bool {
        let mut active = false;
        for node in &mut self.nodes {
            if node.flash > 0.0 {
                node.flash = (node.flash - FLASH_DECAY_PER_SEC * delta_seconds).max(0.0);
                active |= node.flash > 0.0;
            }
        }
        active
    }

    fn insert(&mut self, snapshot: NodeSnapshot) {
        if let Some(&index) = self.index_by_id.get(&snapshot.id) {
            self.nodes[index].snapshot = snapshot;
            return;
        }

        // Stubs arrive after the child that names them; keep them to its left.
        let x = match (snapshot.state, self.newest_admitted) {
            (VertexState::Unknown, Some(newest)) => {
                column_x(newest) - COLUMN_SPACING * STUB_LAG_COLUMNS
            }
            _ => column_x(snapshot.admitted),
        };
        let y = self.spawn_height(&snapshot);

        self.newest_admitted = Some(
            self.newest_admitted
                .map_or(snapshot.admitted, |newest| newest.max(snapshot.admitted)),
        );
        self.index_by_id.insert(snapshot.id.clone(), self.nodes.len());
        self.nodes.push(RenderNode {
            snapshot,
            x,
            y,
            velocity: 0.0,
            flash: 0.0,
        });
    }

    fn spawn_height(&self, snapshot: &NodeSnapshot) -> f32 {
        let (sum, count) = snapshot
            .parents
            .iter()
            .filter_map(|parent| self.get(parent))
            .fold((0.0_f32, 0usize), |(sum, count), parent| (sum + parent.y, count + 1));
        let base = if count > 0 { sum / count as f32 } else { 0.0 };
        base + stable_unit(snapshot.id.as_str()) * SPAWN_JITTER
    }

    fn remove(&mut self, id: &ShortId) {
        let Some(index) = self.index_by_id.remove(id) else {
            return;
        };
        self.nodes.swap_remove(index);
        if let Some(moved) = self.nodes.get(index) {
            self.index_by_id.insert(moved.snapshot.id.clone(), index);
        }
    }
}
