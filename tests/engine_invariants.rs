//! Property-based invariant tests for the graph engine.
//!
//! Random event streams over a small id space (so events hit known, stub and
//! evicted vertices alike) must keep, after every single event:
//!
//! 1. Each counter equal to the number of stored vertices holding its flag.
//! 2. Solid, referenced and conflicting flags set for the vertex's lifetime.
//! 3. No vertex both referenced and conflicting.
//! 4. The store within the vertex limit.
//! 5. Admission order and store agreeing one-to-one.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use tangle_visualizer::tangle::{
    Counts, EngineConfig, Flag, GraphEngine, InboundEvent, ShortId, VertexFlags,
};

// ── Helpers ─────────────────────────────────────────────────────────────

const ID_SPACE: usize = 24;

fn full_id(index: usize) -> String {
    format!("{index:07}{}", "f".repeat(57))
}

fn id_strategy() -> impl Strategy<Value = String> {
    (0..ID_SPACE).prop_map(full_id)
}

fn event_strategy() -> impl Strategy<Value = InboundEvent> {
    prop_oneof![
        4 => (
            id_strategy(),
            prop::collection::vec(id_strategy(), 0..3),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
        )
            .prop_map(|(id, parents, is_solid, is_referenced, is_conflicting, is_tip)| {
                InboundEvent::Vertex {
                    id,
                    parents,
                    is_solid,
                    is_referenced,
                    is_conflicting,
                    is_milestone: None,
                    is_tip,
                }
            }),
        2 => id_strategy().prop_map(|id| InboundEvent::Solid { id }),
        1 => id_strategy().prop_map(|id| InboundEvent::Milestone { id }),
        2 => (id_strategy(), any::<bool>()).prop_map(|(id, is_tip)| InboundEvent::Tip { id, is_tip }),
        2 => (id_strategy(), prop::collection::vec(id_strategy(), 0..4))
            .prop_map(|(id, excluded_ids)| InboundEvent::Confirmed { id, excluded_ids }),
    ]
}

fn recount(engine: &GraphEngine) -> Counts {
    let mut counts = Counts::default();
    for vertex in engine.vertices() {
        counts.total += 1;
        counts.solid += usize::from(vertex.flags.is_solid);
        counts.referenced += usize::from(vertex.flags.is_referenced);
        counts.conflicting += usize::from(vertex.flags.is_conflicting);
        counts.tips += usize::from(vertex.flags.is_tip);
    }
    counts
}

fn one_way_flags(flags: &VertexFlags) -> [bool; 3] {
    [flags.is_solid, flags.is_referenced, flags.is_conflicting]
}

fn check_invariants(
    engine: &GraphEngine,
    limit: usize,
    previous: &HashMap<ShortId, (u64, [bool; 3])>,
) -> Result<HashMap<ShortId, (u64, [bool; 3])>, TestCaseError> {
    prop_assert_eq!(engine.counts(), recount(engine));
    prop_assert!(engine.len() <= limit, "{} vertices over limit {}", engine.len(), limit);

    let order = engine.admission_order().collect::<Vec<_>>();
    prop_assert_eq!(order.len(), engine.len());
    prop_assert_eq!(order.iter().collect::<HashSet<_>>().len(), order.len());

    let mut current = HashMap::new();
    for vertex in engine.vertices() {
        prop_assert!(
            !(vertex.flags.is_referenced && vertex.flags.is_conflicting),
            "{} is both referenced and conflicting",
            vertex.short_id
        );

        let flags = one_way_flags(&vertex.flags);
        if let Some((admitted, before)) = previous.get(&vertex.short_id)
            && *admitted == vertex.admitted
        {
            for (was, now) in before.iter().zip(flags) {
                prop_assert!(!*was || now, "one-way flag cleared on {}", vertex.short_id);
            }
        }
        current.insert(vertex.short_id.clone(), (vertex.admitted, flags));
    }

    Ok(current)
}

// ═════════════════════════════════════════════════════════════════════════
// Invariants hold after every event
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invariants_hold_for_any_stream(
        limit in 1usize..16,
        events in prop::collection::vec(event_strategy(), 0..200),
    ) {
        let mut engine = GraphEngine::new(EngineConfig {
            vertex_limit: limit,
            ..EngineConfig::default()
        });
        engine.start();

        let mut previous = HashMap::new();
        for event in events {
            engine.handle_event(event);
            previous = check_invariants(&engine, limit, &previous)?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Lowering the limit mid-stream re-establishes the bound
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn shrinking_limit_evicts_immediately(
        events in prop::collection::vec(event_strategy(), 0..120),
        new_limit in 0usize..8,
    ) {
        let mut engine = GraphEngine::new(EngineConfig {
            vertex_limit: ID_SPACE,
            ..EngineConfig::default()
        });
        engine.start();
        for event in events {
            engine.handle_event(event);
        }

        engine.set_vertex_limit(new_limit);
        check_invariants(&engine, new_limit, &HashMap::new())?;
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Selection survives only as long as its vertex
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn at_most_one_selected_vertex(
        events in prop::collection::vec(event_strategy(), 1..120),
        picks in prop::collection::vec(0..ID_SPACE, 1..10),
    ) {
        let mut engine = GraphEngine::new(EngineConfig {
            vertex_limit: 8,
            ..EngineConfig::default()
        });
        engine.start();

        for (index, event) in events.into_iter().enumerate() {
            engine.handle_event(event);
            let pick = picks[index % picks.len()];
            engine.select(Some(&full_id(pick)));

            let selected = engine
                .vertices()
                .filter(|vertex| vertex.flags.get(Flag::Selected))
                .map(|vertex| vertex.short_id.clone())
                .collect::<Vec<_>>();
            prop_assert!(selected.len() <= 1);
            prop_assert_eq!(
                selected.first(),
                engine.selected().map(|vertex| &vertex.short_id)
            );
        }
    }
}
