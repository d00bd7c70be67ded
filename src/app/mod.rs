use std::cell::RefCell;
use std::collections::HashSet;
use std::mem;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

use eframe::egui::{Context, Vec2};
use tangle_visualizer::feed::{FeedMessage, FeedSource, spawn_feed};
use tangle_visualizer::tangle::{Counts, EngineConfig, GraphEngine, ShortId};
use tracing::{info, warn};

use graph::{RenderChange, RenderGraph, RenderSink};

mod graph;
mod physics;
mod render_utils;
mod ui;

/// Upper bound on feed messages applied per frame so a burst cannot stall
/// the UI.
const MAX_EVENTS_PER_FRAME: usize = 2000;

#[derive(Clone, Debug)]
pub struct Settings {
    pub config: EngineConfig,
    pub source: FeedSource,
    /// Feed pacing as passed to [`spawn_feed`]; `None` runs unpaced.
    pub rate: Option<u32>,
}

pub struct TangleApp {
    settings: Settings,
    engine: GraphEngine,
    changes: Rc<RefCell<Vec<RenderChange>>>,
    feed: Option<Receiver<FeedMessage>>,
    feed_status: FeedStatus,
    events_applied: u64,
    view: ViewModel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum FeedStatus {
    Streaming,
    Finished,
    Failed(String),
}

struct ViewModel {
    graph: RenderGraph,
    counts: Counts,
    paused: bool,
    feed_replayable: bool,
    vertex_limit: usize,
    search: String,
    pan: Vec2,
    zoom: f32,
    follow_newest: bool,
    search_match_cache: Option<SearchMatchCache>,
    cone_cache: Option<ConeCache>,
    requests: ViewRequests,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<SearchMatches>,
}

struct SearchMatches {
    /// Best score first, newest first among equal scores.
    ranked: Vec<ShortId>,
    lookup: HashSet<ShortId>,
}

/// Ancestors of the selected vertex, recomputed when the graph changes.
struct ConeCache {
    selected: ShortId,
    graph_revision: u64,
    members: Arc<HashSet<ShortId>>,
}

/// Actions the panels ask for; the app performs them against the engine
/// after drawing.
#[derive(Default)]
struct ViewRequests {
    select: Option<Option<String>>,
    vertex_limit: Option<usize>,
    restart_session: bool,
    replay_feed: bool,
}

impl TangleApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let mut engine = GraphEngine::new(settings.config);
        engine.subscribe(Box::new(RenderSink::new(Rc::clone(&changes))));
        engine.start();

        info!(
            source = %settings.source.describe(),
            vertex_limit = settings.config.vertex_limit,
            short_id_len = settings.config.short_id_len,
            "starting tangle session"
        );

        let feed = Some(spawn_feed(settings.source.clone(), settings.rate));
        let view = ViewModel::new(
            settings.config.vertex_limit,
            settings.source.is_replayable(),
        );
        Self {
            settings,
            engine,
            changes,
            feed,
            feed_status: FeedStatus::Streaming,
            events_applied: 0,
            view,
        }
    }

    fn pump_feed(&mut self) {
        if self.view.paused {
            return;
        }
        let Some(feed) = self.feed.take() else {
            return;
        };

        let mut keep = true;
        for _ in 0..MAX_EVENTS_PER_FRAME {
            match feed.try_recv() {
                Ok(FeedMessage::Event(event)) => {
                    self.engine.handle_event(event);
                    self.events_applied += 1;
                    self.apply_render_changes();
                }
                Ok(FeedMessage::Error(error)) => {
                    warn!(%error, "feed failed");
                    self.feed_status = FeedStatus::Failed(error);
                    keep = false;
                    break;
                }
                Ok(FeedMessage::Finished) => {
                    info!(events = self.events_applied, "feed finished");
                    self.feed_status = FeedStatus::Finished;
                    keep = false;
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.feed_status =
                        FeedStatus::Failed("Background feed worker disconnected".to_owned());
                    keep = false;
                    break;
                }
            }
        }

        if keep {
            self.feed = Some(feed);
        }
    }

    fn apply_render_changes(&mut self) {
        let changes = mem::take(&mut *self.changes.borrow_mut());
        for change in changes {
            match change {
                RenderChange::Vertex(snapshot, op) => self.view.graph.apply_vertex(snapshot, op),
                RenderChange::Counts(counts) => self.view.counts = counts,
                RenderChange::Confirmed(id) => self.view.graph.flash(&id),
            }
        }
    }

    fn apply_view_requests(&mut self) {
        let requests = mem::take(&mut self.view.requests);

        if let Some(selected) = requests.select {
            self.engine.select(selected.as_deref());
        }
        if let Some(vertex_limit) = requests.vertex_limit {
            self.settings.config.vertex_limit = vertex_limit;
            self.engine.set_vertex_limit(vertex_limit);
        }
        self.apply_render_changes();

        // A consumed stdin cannot be read again; replay degrades to restart.
        let replay = requests.replay_feed && self.settings.source.is_replayable();
        if requests.restart_session || requests.replay_feed {
            self.restart_session();
        }
        if replay {
            self.replay_feed();
        }
    }

    fn restart_session(&mut self) {
        info!("restarting tangle session");
        self.engine.stop();
        self.engine.start();
        self.changes.borrow_mut().clear();
        self.view.reset_session();
        self.events_applied = 0;
    }

    fn replay_feed(&mut self) {
        info!(source = %self.settings.source.describe(), "replaying feed");
        self.feed = Some(spawn_feed(self.settings.source.clone(), self.settings.rate));
        self.feed_status = FeedStatus::Streaming;
    }
}

impl eframe::App for TangleApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.pump_feed();

        let feed_label = match &self.feed_status {
            FeedStatus::Streaming if self.view.paused => "paused".to_owned(),
            FeedStatus::Streaming => format!("streaming from {}", self.settings.source.describe()),
            FeedStatus::Finished => "feed finished".to_owned(),
            FeedStatus::Failed(error) => format!("feed failed: {error}"),
        };
        self.view
            .show(ctx, &self.engine, &feed_label, self.events_applied);
        self.apply_view_requests();

        if self.feed.is_some() {
            ctx.request_repaint();
        }
    }
}
