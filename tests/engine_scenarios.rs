//! End-to-end scenarios through the public engine API.

use std::cell::RefCell;
use std::rc::Rc;

use tangle_visualizer::tangle::{
    Counts, EngineConfig, GraphEngine, GraphSubscriber, InboundEvent, ShortId, Vertex, VertexOp,
};

#[derive(Clone, Debug, PartialEq)]
enum Seen {
    Vertex(String, VertexOp),
    Counts(Counts),
}

#[derive(Clone, Default)]
struct Sink {
    seen: Rc<RefCell<Vec<Seen>>>,
}

impl Sink {
    fn drain(&self) -> Vec<Seen> {
        std::mem::take(&mut *self.seen.borrow_mut())
    }
}

impl GraphSubscriber for Sink {
    fn on_vertex(&mut self, vertex: &Vertex, op: VertexOp) {
        self.seen
            .borrow_mut()
            .push(Seen::Vertex(vertex.short_id.to_string(), op));
    }

    fn on_counts(&mut self, counts: Counts) {
        self.seen.borrow_mut().push(Seen::Counts(counts));
    }
}

fn engine_with_sink(vertex_limit: usize) -> (GraphEngine, Sink) {
    let mut engine = GraphEngine::new(EngineConfig {
        vertex_limit,
        ..EngineConfig::default()
    });
    let sink = Sink::default();
    engine.subscribe(Box::new(sink.clone()));
    engine.start();
    (engine, sink)
}

fn vertex(id: &str, parents: &[&str]) -> InboundEvent {
    InboundEvent::vertex(id, parents.iter().map(|parent| parent.to_string()).collect())
}

fn referenced_vertex(id: &str, parents: &[&str]) -> InboundEvent {
    InboundEvent::Vertex {
        id: id.to_owned(),
        parents: parents.iter().map(|parent| parent.to_string()).collect(),
        is_solid: Some(true),
        is_referenced: Some(true),
        is_conflicting: None,
        is_milestone: Some(true),
        is_tip: None,
    }
}

fn confirmed(id: &str, excluded: &[&str]) -> InboundEvent {
    InboundEvent::Confirmed {
        id: id.to_owned(),
        excluded_ids: excluded.iter().map(|id| id.to_string()).collect(),
    }
}

#[test]
fn first_vertex_adds_then_reports_counts() {
    let (mut engine, sink) = engine_with_sink(5000);
    engine.handle_event(vertex("aaaaaaa1aaaaaaaaaaaaaaaa", &[]));

    assert_eq!(
        sink.drain(),
        vec![
            Seen::Vertex("aaaaaaa".into(), VertexOp::Add),
            Seen::Counts(Counts {
                total: 1,
                solid: 0,
                referenced: 0,
                conflicting: 0,
                tips: 0,
            }),
        ]
    );
}

#[test]
fn tip_status_toggles_back_to_zero() {
    let (mut engine, sink) = engine_with_sink(5000);
    engine.handle_event(vertex("v1000000", &[]));
    assert_eq!(engine.counts().tips, 0);

    engine.handle_event(InboundEvent::Tip {
        id: "v1000000".into(),
        is_tip: true,
    });
    assert_eq!(engine.counts().tips, 1);

    engine.handle_event(InboundEvent::Tip {
        id: "v1000000".into(),
        is_tip: false,
    });
    assert_eq!(engine.counts().tips, 0);

    let tip_counts = sink
        .drain()
        .into_iter()
        .filter_map(|seen| match seen {
            Seen::Counts(counts) => Some(counts.tips),
            Seen::Vertex(..) => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(tip_counts, [0, 1, 0]);
}

#[test]
fn exceeding_the_limit_evicts_only_the_oldest() {
    let (mut engine, sink) = engine_with_sink(5000);
    for index in 0..5001 {
        engine.handle_event(vertex(&format!("{index:07}ffff"), &[]));
    }

    let deletes = sink
        .drain()
        .into_iter()
        .filter(|seen| matches!(seen, Seen::Vertex(_, VertexOp::Delete)))
        .collect::<Vec<_>>();
    assert_eq!(deletes, vec![Seen::Vertex("0000000".into(), VertexOp::Delete)]);
    assert_eq!(engine.counts().total, 5000);
    assert_eq!(engine.len(), 5000);
    assert!(engine.vertex("0000000").is_none());
    assert!(engine.vertex("0005000").is_some());
}

#[test]
fn confirming_a_chain_marks_exactly_its_ancestors() {
    let (mut engine, sink) = engine_with_sink(5000);
    engine.handle_event(vertex("ddddddd1", &[]));
    engine.handle_event(vertex("ccccccc1", &["ddddddd1"]));
    engine.handle_event(vertex("bbbbbbb1", &["ccccccc1"]));
    engine.handle_event(referenced_vertex("aaaaaaa1", &["bbbbbbb1"]));
    let before = engine.counts().referenced;
    sink.drain();

    engine.handle_event(confirmed("aaaaaaa1", &[]));

    assert_eq!(engine.counts().referenced, before + 3);
    for id in ["bbbbbbb", "ccccccc", "ddddddd"] {
        assert!(engine.vertex(id).expect("present").flags.is_referenced);
    }

    let updates = sink
        .drain()
        .into_iter()
        .filter(|seen| matches!(seen, Seen::Vertex(_, VertexOp::Update)))
        .count();
    assert_eq!(updates, 3);
}

#[test]
fn conflicting_vertex_blocks_the_walk() {
    let (mut engine, _sink) = engine_with_sink(5000);
    engine.handle_event(vertex("ccccccc1", &[]));
    engine.handle_event(vertex("bbbbbbb1", &["ccccccc1"]));
    engine.handle_event(referenced_vertex("eeeeeee1", &["bbbbbbb1"]));
    engine.handle_event(confirmed("eeeeeee1", &["bbbbbbb1", "ccccccc1"]));
    assert!(engine.vertex("bbbbbbb").expect("present").flags.is_conflicting);
    assert!(engine.vertex("ccccccc").expect("present").flags.is_conflicting);

    // A fresh unresolved ancestor behind the conflicting one stays untouched.
    engine.handle_event(vertex("ccccccc1", &["fffffff1"]));
    engine.handle_event(vertex("fffffff1", &[]));
    engine.handle_event(referenced_vertex("aaaaaaa1", &["bbbbbbb1"]));
    let before = engine.counts();

    engine.handle_event(confirmed("aaaaaaa1", &[]));

    let after = engine.counts();
    assert_eq!(after, before);
    assert!(!engine.vertex("fffffff").expect("present").flags.is_resolved());
}

#[test]
fn repeated_vertex_event_changes_nothing() {
    let (mut engine, sink) = engine_with_sink(5000);
    engine.handle_event(vertex("aaaaaaa1", &["bbbbbbb1"]));
    let snapshot = engine.vertex("aaaaaaa").cloned();
    let counts = engine.counts();
    sink.drain();

    engine.handle_event(vertex("aaaaaaa1", &["bbbbbbb1"]));

    assert_eq!(engine.vertex("aaaaaaa").cloned(), snapshot);
    assert_eq!(engine.counts(), counts);
    assert_eq!(
        sink.drain(),
        vec![Seen::Vertex("aaaaaaa".into(), VertexOp::Update)]
    );
}

#[test]
fn two_engines_keep_independent_state() {
    let (mut first, _first_sink) = engine_with_sink(10);
    let (mut second, _second_sink) = engine_with_sink(10);

    first.handle_event(vertex("aaaaaaa1", &[]));
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());

    second.handle_event(vertex("bbbbbbb1", &[]));
    assert!(first.vertex("bbbbbbb").is_none());
    assert_eq!(
        second.admission_order().collect::<Vec<_>>(),
        vec![&ShortId::truncate("bbbbbbb", 7)]
    );
}
