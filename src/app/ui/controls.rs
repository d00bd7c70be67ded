use eframe::egui::{self, Color32, RichText, Ui, Vec2};
use tangle_visualizer::tangle::VertexState;

use super::super::ViewModel;
use super::super::render_utils::{
    MILESTONE_COLOR, SEARCH_MATCH_COLOR, SELECTED_COLOR, TIP_STROKE_COLOR, state_color,
};

const MIN_VERTEX_LIMIT: usize = 100;
const MAX_VERTEX_LIMIT: usize = 20_000;
const MAX_SEARCH_ROWS: usize = 20;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Session");
        ui.separator();
        ui.add_space(4.0);

        ui.horizontal_wrapped(|ui| {
            let pause_label = if self.paused { "Resume" } else { "Pause" };
            if ui
                .button(pause_label)
                .on_hover_text("Stop applying feed events; the feed keeps buffering.")
                .clicked()
            {
                self.paused = !self.paused;
            }
            if ui
                .button("Restart session")
                .on_hover_text("Clear the graph and counters, keep the current feed.")
                .clicked()
            {
                self.requests.restart_session = true;
            }
            if ui
                .add_enabled(self.feed_replayable, egui::Button::new("Replay feed"))
                .on_hover_text("Clear the graph and start the feed from the beginning.")
                .on_disabled_hover_text("Stdin cannot be read a second time.")
                .clicked()
            {
                self.requests.replay_feed = true;
            }
        });

        ui.separator();

        // Widen the range so a limit given on the command line is not clamped.
        let limit_range =
            MIN_VERTEX_LIMIT.min(self.vertex_limit)..=MAX_VERTEX_LIMIT.max(self.vertex_limit);
        let limit_slider = ui
            .add(
                egui::Slider::new(&mut self.vertex_limit, limit_range)
                    .logarithmic(true)
                    .text("Vertex limit"),
            )
            .on_hover_text("Oldest vertices are evicted once the graph grows past this.");
        if limit_slider.changed() {
            self.requests.vertex_limit = Some(self.vertex_limit);
        }

        ui.checkbox(&mut self.follow_newest, "Follow newest vertex");
        if ui.button("Reset view").clicked() {
            self.pan = Vec2::ZERO;
            self.zoom = 1.0;
            self.follow_newest = true;
        }

        ui.separator();
        ui.label("Search (vertex id)")
            .on_hover_text("Fuzzy-highlight matching vertices; click a result to select it.");
        ui.text_edit_singleline(&mut self.search);
        self.draw_search_results(ui);

        ui.separator();
        draw_legend(ui);
    }

    fn draw_search_results(&mut self, ui: &mut Ui) {
        let Some(matches) = self.search_matches() else {
            return;
        };
        if matches.ranked.is_empty() {
            ui.label("No vertices match.");
            return;
        }

        ui.small(format!("{} matching vertices", matches.ranked.len()));
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("search_results_scroll")
            .max_height(240.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for id in matches.ranked.iter().take(MAX_SEARCH_ROWS) {
                    let Some(node) = self.graph.get(id) else {
                        continue;
                    };
                    ui.horizontal(|ui| {
                        if ui.link(RichText::new(id.as_str()).monospace()).clicked() {
                            clicked = Some(id.as_str().to_owned());
                        }
                        ui.label(
                            RichText::new(node.snapshot.state.label())
                                .color(state_color(node.snapshot.state)),
                        );
                    });
                }
            });

        if let Some(id) = clicked {
            self.request_selection(Some(id));
        }
    }
}

fn draw_legend(ui: &mut Ui) {
    ui.label(RichText::new("Legend").strong());

    let swatch = |ui: &mut Ui, color: Color32, label: &str| {
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(Vec2::splat(12.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 5.0, color);
            ui.label(label);
        });
    };
    for state in [
        VertexState::Unknown,
        VertexState::Unsolid,
        VertexState::Solid,
        VertexState::Confirmed,
        VertexState::Conflicting,
    ] {
        swatch(ui, state_color(state), state.label());
    }
    swatch(ui, MILESTONE_COLOR, "milestone");

    let ring = |ui: &mut Ui, color: Color32, label: &str| {
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(Vec2::splat(12.0), egui::Sense::hover());
            ui.painter()
                .circle_stroke(rect.center(), 5.0, egui::Stroke::new(1.6, color));
            ui.label(label);
        });
    };
    ring(ui, TIP_STROKE_COLOR, "tip");
    ring(ui, SELECTED_COLOR, "selected");
    ring(ui, SEARCH_MATCH_COLOR, "search match");
}
