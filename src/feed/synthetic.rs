use std::collections::{HashSet, VecDeque};

use crate::tangle::InboundEvent;
use crate::util::stable_hash;

const RECENT_WINDOW: usize = 24;
const PARENT_WINDOW: usize = 8;
const SOLID_LAG: usize = 4;
const MILESTONE_INTERVAL: u64 = 12;
const EXCLUSION_MODULUS: u64 = 9;

/// Deterministic stand-in for a node's event stream.
///
/// Every step issues one vertex that approves one or two recent vertices.
/// New vertices are tips until approved, solidify a few steps later, and
/// every [`MILESTONE_INTERVAL`] steps a milestone confirms its past cone
/// with a small excluded set.
#[derive(Debug)]
pub struct SyntheticTangle {
    seed: u64,
    step: u64,
    recent: VecDeque<String>,
    tips: HashSet<String>,
    unsolid: VecDeque<String>,
    unconfirmed: Vec<String>,
}

impl SyntheticTangle {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            step: 0,
            recent: VecDeque::with_capacity(RECENT_WINDOW),
            tips: HashSet::new(),
            unsolid: VecDeque::new(),
            unconfirmed: Vec::new(),
        }
    }

    /// Vertices issued so far.
    pub fn steps(&self) -> u64 {
        self.step
    }

    /// Events describing the next vertex and the state changes it causes.
    pub fn next_events(&mut self) -> Vec<InboundEvent> {
        let step = self.step;
        self.step += 1;

        let id = self.vertex_id(step);
        let parents = self.pick_parents(step);
        let is_milestone = step > 0 && step % MILESTONE_INTERVAL == 0;

        let mut events = vec![InboundEvent::Vertex {
            id: id.clone(),
            parents: parents.clone(),
            is_solid: is_milestone.then_some(true),
            is_referenced: is_milestone.then_some(true),
            is_conflicting: None,
            is_milestone: None,
            is_tip: Some(true),
        }];

        for parent in &parents {
            if self.tips.remove(parent) {
                events.push(InboundEvent::Tip {
                    id: parent.clone(),
                    is_tip: false,
                });
            }
        }
        self.tips.insert(id.clone());

        if !is_milestone {
            self.unsolid.push_back(id.clone());
        }
        while self.unsolid.len() > SOLID_LAG {
            if let Some(solid) = self.unsolid.pop_front() {
                events.push(InboundEvent::Solid { id: solid });
            }
        }

        if is_milestone {
            let excluded_ids = self
                .unconfirmed
                .iter()
                .filter(|candidate| {
                    stable_hash((self.seed, candidate.as_str())) % EXCLUSION_MODULUS == 0
                })
                .cloned()
                .collect();
            self.unconfirmed.clear();
            events.push(InboundEvent::Milestone { id: id.clone() });
            events.push(InboundEvent::Confirmed {
                id: id.clone(),
                excluded_ids,
            });
        } else {
            self.unconfirmed.push(id.clone());
        }

        self.recent.push_back(id);
        while self.recent.len() > RECENT_WINDOW {
            self.recent.pop_front();
        }

        events
    }

    fn vertex_id(&self, step: u64) -> String {
        (0..4u8)
            .map(|lane| format!("{:016x}", stable_hash((self.seed, step, lane))))
            .collect()
    }

    fn pick_parents(&self, step: u64) -> Vec<String> {
        let window = self.recent.len().min(PARENT_WINDOW);
        if window == 0 {
            return Vec::new();
        }

        let newest = self.recent.len() - 1;
        let mut parents = Vec::with_capacity(2);
        for lane in ["trunk", "branch"] {
            let offset = (stable_hash((self.seed, step, lane)) % window as u64) as usize;
            let parent = &self.recent[newest - offset];
            if !parents.contains(parent) {
                parents.push(parent.clone());
            }
        }
        parents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tangle::{EngineConfig, GraphEngine};

    #[test]
    fn same_seed_same_stream() {
        let mut left = SyntheticTangle::new(42);
        let mut right = SyntheticTangle::new(42);
        for _ in 0..50 {
            assert_eq!(left.next_events(), right.next_events());
        }
    }

    #[test]
    fn first_vertex_has_no_parents_and_ids_are_full_length() {
        let mut tangle = SyntheticTangle::new(1);
        let events = tangle.next_events();
        let InboundEvent::Vertex { id, parents, .. } = &events[0] else {
            panic!("expected vertex event first");
        };
        assert!(parents.is_empty());
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn milestones_issue_confirmations() {
        let mut tangle = SyntheticTangle::new(3);
        let confirmations = (0..MILESTONE_INTERVAL * 3 + 1)
            .flat_map(|_| tangle.next_events())
            .filter(|event| matches!(event, InboundEvent::Confirmed { .. }))
            .count();
        assert_eq!(confirmations, 3);
    }

    #[test]
    fn drives_engine_to_confirmed_state() {
        let mut engine = GraphEngine::new(EngineConfig {
            vertex_limit: 100,
            ..EngineConfig::default()
        });
        engine.start();

        let mut tangle = SyntheticTangle::new(9);
        for _ in 0..300 {
            for event in tangle.next_events() {
                engine.handle_event(event);
            }
        }

        let counts = engine.counts();
        assert_eq!(engine.len(), 100);
        assert_eq!(counts.total, 100);
        assert!(counts.referenced > 0);
        assert!(counts.solid > 0);
        assert!(counts.tips >= 1);
        assert_eq!(
            counts.referenced,
            engine.vertices().filter(|vertex| vertex.flags.is_referenced).count()
        );
    }
}
