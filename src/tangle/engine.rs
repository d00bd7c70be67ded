use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};

use super::counters::{AggregateCounters, Counts};
use super::event::{FlagUpdates, InboundEvent, TangleEvent, VertexRef};
use super::propagate::resolve_ancestors;
use super::store::VertexStore;
use super::vertex::{DEFAULT_SHORT_ID_LEN, Flag, ShortId, Vertex};

pub const DEFAULT_VERTEX_LIMIT: usize = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Working-set size; the oldest admitted vertices are evicted beyond it.
    pub vertex_limit: usize,
    /// Characters of the full id kept as the vertex key.
    pub short_id_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vertex_limit: DEFAULT_VERTEX_LIMIT,
            short_id_len: DEFAULT_SHORT_ID_LEN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexOp {
    Add,
    Update,
    Delete,
}

/// Receives the engine's output, typically a rendering layer.
///
/// Callbacks run synchronously inside [`GraphEngine::handle_event`] and the
/// other mutating calls. A subscriber must not call back into the engine;
/// anything it wants to request (a new selection, a restart) has to be queued
/// and applied by its owner after the current call returns.
///
/// [`GraphEngine::subscribe`] takes an owned `'static` subscriber, so one that
/// borrows the engine it is registered with does not compile:
///
/// ```compile_fail
/// use tangle_visualizer::tangle::{
///     Counts, EngineConfig, GraphEngine, GraphSubscriber, Vertex, VertexOp,
/// };
///
/// struct Echo<'a> {
///     engine: &'a mut GraphEngine,
/// }
///
/// impl GraphSubscriber for Echo<'_> {
///     fn on_vertex(&mut self, vertex: &Vertex, _op: VertexOp) {
///         self.engine.select(Some(vertex.short_id.as_str()));
///     }
///
///     fn on_counts(&mut self, _counts: Counts) {}
/// }
///
/// let mut engine = GraphEngine::new(EngineConfig::default());
/// let echo = Echo { engine: &mut engine };
/// engine.subscribe(Box::new(echo));
/// ```
///
/// Sharing the engine through `Rc<RefCell<_>>` and borrowing it from a
/// callback panics at runtime instead.
pub trait GraphSubscriber {
    fn on_vertex(&mut self, vertex: &Vertex, op: VertexOp);

    fn on_counts(&mut self, counts: Counts);

    /// Raw confirmation hook, fired after the engine has propagated it.
    fn on_confirmed(&mut self, _id: &ShortId, _excluded: &[ShortId]) {}
}

/// Bounded, incrementally maintained model of the vertex graph.
pub struct GraphEngine {
    config: EngineConfig,
    store: VertexStore,
    counters: AggregateCounters,
    subscriber: Option<Box<dyn GraphSubscriber>>,
    running: bool,
    selected: Option<ShortId>,
    reported_counts: Counts,
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: VertexStore::new(),
            counters: AggregateCounters::new(),
            subscriber: None,
            running: false,
            selected: None,
            reported_counts: Counts::default(),
        }
    }

    /// Registers the subscriber, replacing any previous one.
    pub fn subscribe(&mut self, subscriber: Box<dyn GraphSubscriber>) {
        self.subscriber = Some(subscriber);
    }

    pub fn unsubscribe(&mut self) -> Option<Box<dyn GraphSubscriber>> {
        self.subscriber.take()
    }

    /// Starts a fresh session with an empty graph.
    pub fn start(&mut self) {
        self.reset();
        self.running = true;
        info!(
            vertex_limit = self.config.vertex_limit,
            short_id_len = self.config.short_id_len,
            "visualizer session started"
        );
    }

    /// Discards the graph. Idempotent; no callback fires until the next
    /// [`start`](Self::start). The subscriber stays registered.
    pub fn stop(&mut self) {
        if self.running {
            info!(vertices = self.store.len(), "visualizer session stopped");
        }
        self.running = false;
        self.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn counts(&self) -> Counts {
        self.counters.counts()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Looks a vertex up by full or short id.
    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.store.get(self.key(id).as_str())
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.store.iter()
    }

    /// Ids from oldest to newest admission.
    pub fn admission_order(&self) -> impl Iterator<Item = &ShortId> {
        self.store.admission_order()
    }

    pub fn selected(&self) -> Option<&Vertex> {
        self.selected
            .as_ref()
            .and_then(|id| self.store.get(id.as_str()))
    }

    /// Changes the working-set limit, evicting at once if occupancy exceeds it.
    pub fn set_vertex_limit(&mut self, vertex_limit: usize) {
        if vertex_limit == self.config.vertex_limit {
            return;
        }
        info!(
            from = self.config.vertex_limit,
            to = vertex_limit,
            "vertex limit changed"
        );
        self.config.vertex_limit = vertex_limit;
        if self.running {
            self.enforce_limit();
        }
    }

    /// Moves the selection to `id` (full or short), or clears it with `None`.
    ///
    /// Returns whether the selection changed. Ids not in the graph clear it.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        let next = id
            .map(|id| self.key(id))
            .filter(|id| self.store.contains(id.as_str()));
        if next == self.selected {
            return false;
        }

        if let Some(previous) = self.selected.take()
            && self.write_flag(&previous, Flag::Selected, false)
        {
            self.notify_vertex(&previous, VertexOp::Update);
        }

        if let Some(next) = next {
            if self.write_flag(&next, Flag::Selected, true) {
                self.notify_vertex(&next, VertexOp::Update);
            }
            self.selected = Some(next);
        }
        true
    }

    /// Breadth-first past cone of `id` over parents still in the graph,
    /// nearest first, at most `limit` entries.
    pub fn ancestors(&self, id: &str, limit: usize) -> Vec<ShortId> {
        let key = self.key(id);
        let Some(root) = self.store.get(key.as_str()) else {
            return Vec::new();
        };

        let mut queue = VecDeque::from([root]);
        let mut visited = HashSet::from([&root.short_id]);
        let mut ancestors = Vec::new();

        while let Some(vertex) = queue.pop_front() {
            for parent in vertex.parent_ids() {
                if ancestors.len() >= limit {
                    return ancestors;
                }
                let Some(parent_vertex) = self.store.get(parent.as_str()) else {
                    continue;
                };
                if visited.insert(parent) {
                    ancestors.push(parent.clone());
                    queue.push_back(parent_vertex);
                }
            }
        }

        ancestors
    }

    /// Applies one transport event. Ignored while the engine is stopped.
    pub fn handle_event(&mut self, event: InboundEvent) {
        if !self.running {
            return;
        }

        match event.normalize(self.config.short_id_len) {
            TangleEvent::Vertex {
                vertex,
                parents,
                flags,
            } => self.on_vertex_event(vertex, parents, flags),
            TangleEvent::Solid { id } => self.on_mark(&id, Flag::Solid, true),
            TangleEvent::Milestone { id } => self.on_mark(&id, Flag::Milestone, true),
            TangleEvent::Tip { id, is_tip } => self.on_mark(&id, Flag::Tip, is_tip),
            TangleEvent::Confirmed { id, excluded } => self.on_confirmed(&id, excluded),
        }
    }

    fn on_vertex_event(&mut self, vertex: VertexRef, parents: Vec<VertexRef>, flags: FlagUpdates) {
        let id = vertex.short_id;
        let parent_ids = parents
            .iter()
            .map(|parent| parent.short_id.clone())
            .collect::<Vec<_>>();

        let (_, is_new) = self
            .store
            .upsert(id.clone(), &vertex.full_id, Some(&parent_ids));
        if is_new {
            self.counters.on_admitted();
        }
        for (flag, value) in flags.supplied() {
            self.write_flag(&id, flag, value);
        }
        self.notify_vertex(&id, if is_new { VertexOp::Add } else { VertexOp::Update });
        self.notify_counts();

        for parent in parents {
            if parent.short_id == id {
                continue;
            }
            let (_, parent_is_new) = self
                .store
                .upsert(parent.short_id.clone(), &parent.full_id, None);
            if parent_is_new {
                self.counters.on_admitted();
                self.notify_vertex(&parent.short_id, VertexOp::Add);
                self.notify_counts();
            }
            if let Some(parent_vertex) = self.store.get_mut(parent.short_id.as_str()) {
                parent_vertex.link_child(&id);
            }
        }

        self.enforce_limit();
    }

    fn on_mark(&mut self, id: &ShortId, flag: Flag, value: bool) {
        if !self.store.contains(id.as_str()) {
            debug!(id = %id, flag = flag.label(), "ignoring mark for unknown vertex");
            return;
        }
        if self.write_flag(id, flag, value) {
            self.notify_vertex(id, VertexOp::Update);
            self.notify_counts();
        }
    }

    fn on_confirmed(&mut self, id: &ShortId, excluded: Vec<ShortId>) {
        match self.store.get(id.as_str()) {
            None => {
                debug!(id = %id, "ignoring confirmation of unknown vertex");
            }
            Some(vertex) if vertex.flags.is_conflicting => {
                debug!(id = %id, "ignoring confirmation of conflicting vertex");
            }
            Some(_) => {
                let excluded_set = excluded.iter().cloned().collect::<HashSet<_>>();
                let resolutions = resolve_ancestors(&self.store, id, &excluded_set);
                debug!(id = %id, resolved = resolutions.len(), "propagated confirmation");

                for (ancestor, resolution) in resolutions {
                    if self.write_flag(&ancestor, resolution.flag(), true) {
                        self.notify_vertex(&ancestor, VertexOp::Update);
                        self.notify_counts();
                    }
                }
            }
        }

        if let Some(subscriber) = self.subscriber.as_mut() {
            subscriber.on_confirmed(id, &excluded);
        }
    }

    /// The only place vertex flags change. Keeps the counters in step and
    /// refuses transitions that would break one-way or exclusive flags.
    fn write_flag(&mut self, id: &ShortId, flag: Flag, value: bool) -> bool {
        let Some(vertex) = self.store.get_mut(id.as_str()) else {
            return false;
        };

        let old_value = vertex.flags.get(flag);
        if old_value == value {
            return false;
        }
        if flag.is_one_way() && !value {
            debug!(id = %id, flag = flag.label(), "ignoring attempt to clear one-way flag");
            return false;
        }
        let blocked = match flag {
            Flag::Referenced => vertex.flags.is_conflicting,
            Flag::Conflicting => vertex.flags.is_referenced,
            _ => false,
        };
        if blocked {
            debug!(id = %id, flag = flag.label(), "ignoring conflicting terminal marking");
            return false;
        }

        vertex.flags.set(flag, value);
        self.counters.on_flag_transition(flag, old_value, value);
        true
    }

    fn enforce_limit(&mut self) {
        while self.store.len() > self.config.vertex_limit {
            let Some(oldest) = self.store.oldest().cloned() else {
                break;
            };
            self.evict(&oldest);
        }
    }

    /// Removes a vertex, then any stub parent it was the last child of.
    fn evict(&mut self, id: &ShortId) {
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
            if self.write_flag(id, Flag::Selected, false) {
                self.notify_vertex(id, VertexOp::Update);
            }
        }

        let Some(vertex) = self.store.remove(id.as_str()) else {
            return;
        };
        self.counters.on_removed(&vertex.flags);
        debug!(id = %id, admitted = vertex.admitted, "evicted vertex");

        if let Some(subscriber) = self.subscriber.as_mut() {
            subscriber.on_vertex(&vertex, VertexOp::Delete);
        }
        self.notify_counts();

        for parent in vertex.parent_ids() {
            let orphaned_stub = match self.store.get_mut(parent.as_str()) {
                Some(parent_vertex) => {
                    parent_vertex.unlink_child(id);
                    parent_vertex.is_stub() && parent_vertex.children.is_empty()
                }
                None => false,
            };
            if orphaned_stub {
                self.evict(parent);
            }
        }
    }

    fn notify_vertex(&mut self, id: &ShortId, op: VertexOp) {
        if let (Some(subscriber), Some(vertex)) =
            (self.subscriber.as_mut(), self.store.get(id.as_str()))
        {
            subscriber.on_vertex(vertex, op);
        }
    }

    fn notify_counts(&mut self) {
        let counts = self.counters.counts();
        if counts == self.reported_counts {
            return;
        }
        self.reported_counts = counts;
        if let Some(subscriber) = self.subscriber.as_mut() {
            subscriber.on_counts(counts);
        }
    }

    fn key(&self, id: &str) -> ShortId {
        ShortId::truncate(id, self.config.short_id_len)
    }

    fn reset(&mut self) {
        self.store.clear();
        self.counters.reset();
        self.selected = None;
        self.reported_counts = Counts::default();
    }
}
