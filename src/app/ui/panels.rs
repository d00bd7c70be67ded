use eframe::egui::{self, Align, Context, Layout, RichText, Ui, Vec2};
use tangle_visualizer::tangle::{Counts, Flag, GraphEngine, VertexState};
use tangle_visualizer::util::format_percent;

use super::super::render_utils::{TIP_STROKE_COLOR, state_color};
use super::super::{RenderGraph, ViewModel, ViewRequests};

impl ViewModel {
    pub(in crate::app) fn new(vertex_limit: usize, feed_replayable: bool) -> Self {
        Self {
            graph: RenderGraph::default(),
            counts: Counts::default(),
            paused: false,
            feed_replayable,
            vertex_limit,
            search: String::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            follow_newest: true,
            search_match_cache: None,
            cone_cache: None,
            requests: ViewRequests::default(),
        }
    }

    /// Drops everything derived from the previous session's vertices.
    pub(in crate::app) fn reset_session(&mut self) {
        self.graph.clear();
        self.counts = Counts::default();
        self.search_match_cache = None;
        self.cone_cache = None;
        self.follow_newest = true;
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        engine: &GraphEngine,
        feed_label: &str,
        events_applied: u64,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("tangle visualizer");
                    ui.separator();
                    self.draw_counts(ui);
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!("events: {events_applied}"));
                        ui.label(feed_label);
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui, engine));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui, engine));
    }

    fn draw_counts(&self, ui: &mut Ui) {
        let counts = self.counts;
        ui.label(RichText::new(format!("vertices: {}", counts.total)).strong());

        for flag in [Flag::Solid, Flag::Referenced, Flag::Conflicting, Flag::Tip] {
            let Some(count) = counts.get(flag) else {
                continue;
            };
            let text = format!(
                "{}: {} ({})",
                flag.label(),
                count,
                format_percent(counts.percent(flag))
            );
            ui.label(RichText::new(text).color(flag_color(flag)));
        }
    }
}

fn flag_color(flag: Flag) -> egui::Color32 {
    match flag {
        Flag::Solid => state_color(VertexState::Solid),
        Flag::Referenced => state_color(VertexState::Confirmed),
        Flag::Conflicting => state_color(VertexState::Conflicting),
        Flag::Tip => TIP_STROKE_COLOR,
        Flag::Milestone | Flag::Selected => egui::Color32::from_gray(220),
    }
}
