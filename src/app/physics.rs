use super::graph::RenderGraph;

const PARENT_SPRING: f32 = 0.035;
const REPULSION_RADIUS: f32 = 26.0;
const REPULSION_STRENGTH: f32 = 2.4;
const CENTER_PULL: f32 = 0.0009;
const VELOCITY_DAMPING: f32 = 0.84;
const MAX_SPEED: f32 = 18.0;

/// One relaxation step on the vertical axis; x is fixed by admission order.
///
/// Children are pulled toward their parents' height, vertices in nearby
/// columns push each other apart, and the band drifts back toward y = 0.
/// Returns whether anything is still moving.
pub(super) fn step_layout(graph: &mut RenderGraph, delta_seconds: f32) -> bool {
    let node_count = graph.nodes.len();
    if node_count == 0 {
        return false;
    }

    let time_step_scale = (delta_seconds * 60.0).clamp(0.25, 3.0);
    let scratch = &mut graph.layout_scratch;
    scratch.forces.clear();
    scratch.forces.resize(node_count, 0.0);
    // Columns scroll with admission order; keep only those with live nodes.
    scratch.buckets.clear();

    for (index, node) in graph.nodes.iter().enumerate() {
        for parent in &node.snapshot.parents {
            let Some(&parent_index) = graph.index_by_id.get(parent) else {
                continue;
            };
            let delta = graph.nodes[parent_index].y - node.y;
            scratch.forces[index] += delta * PARENT_SPRING;
            scratch.forces[parent_index] -= delta * PARENT_SPRING * 0.5;
        }

        let bucket = (node.x / REPULSION_RADIUS).floor() as i32;
        scratch.buckets.entry(bucket).or_default().push(index);
    }

    let radius_sq = REPULSION_RADIUS * REPULSION_RADIUS;
    for (&bucket, members) in &scratch.buckets {
        for &index in members {
            let node = &graph.nodes[index];
            for neighbor_bucket in bucket..=bucket + 1 {
                let Some(neighbors) = scratch.buckets.get(&neighbor_bucket) else {
                    continue;
                };
                for &other in neighbors {
                    if neighbor_bucket == bucket && other <= index {
                        continue;
                    }
                    let other_node = &graph.nodes[other];
                    let dx = node.x - other_node.x;
                    let dy = node.y - other_node.y;
                    let distance_sq = dx * dx + dy * dy;
                    if distance_sq >= radius_sq {
                        continue;
                    }

                    let distance = distance_sq.sqrt();
                    let direction = if dy.abs() > 0.0001 {
                        dy.signum()
                    } else if index < other {
                        1.0
                    } else {
                        -1.0
                    };
                    let push = REPULSION_STRENGTH * (1.0 - distance / REPULSION_RADIUS);
                    scratch.forces[index] += direction * push;
                    scratch.forces[other] -= direction * push;
                }
            }
        }
    }

    let damping = VELOCITY_DAMPING.powf(time_step_scale);
    let mut any_motion = false;
    for (node, force) in graph.nodes.iter_mut().zip(scratch.forces.iter()) {
        let force = force - node.y * CENTER_PULL;
        let velocity =
            ((node.velocity + force * time_step_scale) * damping).clamp(-MAX_SPEED, MAX_SPEED);
        node.velocity = if velocity.abs() < 0.01 { 0.0 } else { velocity };
        node.y += node.velocity * time_step_scale;
        any_motion |= node.velocity != 0.0;
    }

    any_motion
}

#[cfg(test)]
mod tests {
    use tangle_visualizer::tangle::{ShortId, VertexOp, VertexState};

    use super::super::graph::NodeSnapshot;
    use super::*;

    fn add(graph: &mut RenderGraph, id: &str, parents: &[&str], admitted: u64) {
        graph.apply_vertex(
            NodeSnapshot {
                id: ShortId::truncate(id, 7),
                full_id: id.to_owned(),
                parents: parents
                    .iter()
                    .map(|parent| ShortId::truncate(parent, 7))
                    .collect(),
                state: VertexState::Solid,
                is_milestone: false,
                is_tip: false,
                is_selected: false,
                admitted,
            },
            VertexOp::Add,
        );
    }

    #[test]
    fn empty_graph_is_at_rest() {
        let mut graph = RenderGraph::default();
        assert!(!step_layout(&mut graph, 1.0 / 60.0));
    }

    #[test]
    fn buckets_track_live_nodes_not_session_age() {
        const LIVE: u64 = 50;
        let mut graph = RenderGraph::default();
        for admitted in 0..20_000u64 {
            add(&mut graph, &format!("{admitted:07}"), &[], admitted);
            if admitted >= LIVE {
                let expired = admitted - LIVE;
                let id = ShortId::truncate(&format!("{expired:07}"), 7);
                let snapshot = graph.get(&id).expect("still live").snapshot.clone();
                graph.apply_vertex(snapshot, VertexOp::Delete);
            }
            if admitted % 100 == 0 {
                step_layout(&mut graph, 1.0 / 60.0);
            }
        }
        step_layout(&mut graph, 1.0 / 60.0);

        assert_eq!(graph.len(), LIVE as usize);
        assert!(
            graph.layout_scratch.buckets.len() <= graph.len(),
            "{} buckets for {} nodes",
            graph.layout_scratch.buckets.len(),
            graph.len()
        );
    }

    #[test]
    fn overlapping_neighbors_separate() {
        let mut graph = RenderGraph::default();
        add(&mut graph, "aaaaaaa", &[], 0);
        add(&mut graph, "bbbbbbb", &[], 1);
        graph.nodes[0].y = 0.0;
        graph.nodes[1].y = 0.0;

        for _ in 0..120 {
            step_layout(&mut graph, 1.0 / 60.0);
        }

        let gap = (graph.nodes[0].y - graph.nodes[1].y).abs();
        assert!(gap > 10.0, "nodes stayed stacked: gap {gap}");
        assert!(graph.nodes.iter().all(|node| node.y.is_finite()));
    }
}
