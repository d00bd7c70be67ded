use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tangle_visualizer::tangle::{GraphEngine, ShortId};

use super::super::physics::step_layout;
use super::super::render_utils::{
    FLASH_COLOR, MILESTONE_COLOR, SEARCH_MATCH_COLOR, SELECTED_COLOR, TIP_STROKE_COLOR,
    blend_color, circle_visible, dim_color, draw_background, edge_visible, node_radius,
    state_color, world_to_screen,
};
use super::super::{ConeCache, SearchMatchCache, SearchMatches, ViewModel};
use super::build::column_x;

/// Screen distance kept between the newest vertex and the right edge while
/// following.
const FOLLOW_MARGIN: f32 = 80.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn search_matches(&mut self) -> Option<Arc<SearchMatches>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.graph.revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .graph
            .nodes
            .iter()
            .filter_map(|node| {
                fuzzy_match_score(&matcher, &node.snapshot.full_id, query)
                    .map(|score| (score, node.snapshot.admitted, node.snapshot.id.clone()))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

        let ranked = scored.into_iter().map(|(_, _, id)| id).collect::<Vec<_>>();
        let lookup = ranked.iter().cloned().collect();
        let matches = Arc::new(SearchMatches { ranked, lookup });

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.graph.revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    /// The selected vertex's past cone within the working set.
    pub(in crate::app) fn selection_cone(
        &mut self,
        engine: &GraphEngine,
    ) -> Option<Arc<HashSet<ShortId>>> {
        let selected = engine.selected()?.short_id.clone();

        if let Some(cached) = &self.cone_cache
            && cached.graph_revision == self.graph.revision
            && cached.selected == selected
        {
            return Some(Arc::clone(&cached.members));
        }

        let members = Arc::new(
            engine
                .ancestors(selected.as_str(), engine.len())
                .into_iter()
                .collect::<HashSet<_>>(),
        );
        self.cone_cache = Some(ConeCache {
            selected,
            graph_revision: self.graph.revision,
            members: Arc::clone(&members),
        });
        Some(members)
    }

    fn follow_newest_vertex(&mut self, rect: egui::Rect) -> bool {
        let Some(newest) = self.graph.newest_admitted else {
            return false;
        };

        let target = rect.width() * 0.5 - FOLLOW_MARGIN - column_x(newest) * self.zoom;
        let delta = target - self.pan.x;
        if delta.abs() < 0.5 {
            self.pan.x = target;
            return false;
        }
        self.pan.x += delta * 0.2;
        true
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, engine: &GraphEngine) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let mut animating = step_layout(&mut self.graph, delta_seconds);
        animating |= self.graph.fade_flashes(delta_seconds);
        if self.follow_newest {
            animating |= self.follow_newest_vertex(rect);
        }

        if self.graph.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Waiting for vertices...",
                FontId::proportional(16.0),
                Color32::from_gray(170),
            );
            return;
        }

        let cone = self.selection_cone(engine);
        let selected_id = engine.selected().map(|vertex| vertex.short_id.clone());
        let search_matches = self.search_matches();
        let pan = self.pan;
        let zoom = self.zoom;

        let screen_positions = self
            .graph
            .nodes
            .iter()
            .map(|node| world_to_screen(rect, pan, zoom, vec2(node.x, node.y)))
            .collect::<Vec<Pos2>>();
        let screen_radii = self
            .graph
            .nodes
            .iter()
            .map(|node| node_radius(node.snapshot.is_milestone, zoom))
            .collect::<Vec<f32>>();
        let visible_indices = (0..self.graph.len())
            .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index]))
            .collect::<Vec<_>>();

        let hovered = Self::hovered_index(ui, &visible_indices, &screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let in_cone = |id: &ShortId| cone.as_ref().is_some_and(|cone| cone.contains(id));
        let is_selected = |id: &ShortId| selected_id.as_ref() == Some(id);
        let edge_width = (1.0 * zoom.sqrt()).clamp(0.5, 2.5);

        for (index, node) in self.graph.nodes.iter().enumerate() {
            let child_highlighted = is_selected(&node.snapshot.id) || in_cone(&node.snapshot.id);
            for parent in &node.snapshot.parents {
                // Parents already evicted are simply not drawn.
                let Some(&parent_index) = self.graph.index_by_id.get(parent) else {
                    continue;
                };
                let start = screen_positions[index];
                let end = screen_positions[parent_index];
                if !edge_visible(rect, start, end) {
                    continue;
                }

                let stroke = if child_highlighted && in_cone(parent) {
                    Stroke::new(edge_width * 2.2, Color32::from_rgb(246, 206, 104))
                } else if cone.is_some() {
                    Stroke::new(edge_width, Color32::from_rgba_unmultiplied(80, 90, 104, 90))
                } else {
                    Stroke::new(edge_width, Color32::from_rgba_unmultiplied(96, 104, 118, 150))
                };
                painter.line_segment([start, end], stroke);
            }
        }

        for &index in &visible_indices {
            let node = &self.graph.nodes[index];
            let snapshot = &node.snapshot;
            let position = screen_positions[index];
            let radius = screen_radii[index];

            let mut color = state_color(snapshot.state);
            if snapshot.is_milestone {
                color = blend_color(color, MILESTONE_COLOR, 0.65);
            }
            if cone.is_some() && !snapshot.is_selected && !in_cone(&snapshot.id) {
                color = dim_color(color, 0.5);
            }
            if node.flash > 0.0 {
                color = blend_color(color, FLASH_COLOR, node.flash);
            }
            painter.circle_filled(position, radius, color);

            if snapshot.is_tip {
                painter.circle_stroke(position, radius, Stroke::new(1.6, TIP_STROKE_COLOR));
            }
            if search_matches
                .as_ref()
                .is_some_and(|matches| matches.lookup.contains(&snapshot.id))
            {
                painter.circle_stroke(
                    position,
                    radius + 2.5,
                    Stroke::new(1.4, SEARCH_MATCH_COLOR),
                );
            }
            if snapshot.is_selected {
                painter.circle_stroke(position, radius + 4.0, Stroke::new(2.0, SELECTED_COLOR));
            }
            if node.flash > 0.0 {
                let alpha = (node.flash * 160.0) as u8;
                painter.circle_stroke(
                    position,
                    radius + 10.0 * (1.0 - node.flash) + 2.0,
                    Stroke::new(1.2, Color32::from_rgba_unmultiplied(210, 255, 220, alpha)),
                );
            }

            if hovered == Some(index) || snapshot.is_selected || zoom > 2.5 {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    snapshot.id.as_str(),
                    FontId::monospace(11.0),
                    Color32::from_gray(230),
                );
            }
        }

        if let Some(index) = hovered {
            let snapshot = &self.graph.nodes[index].snapshot;
            let mut panel_text = format!(
                "{}  |  {}  |  parents {}",
                snapshot.id,
                snapshot.state.label(),
                snapshot.parents.len()
            );
            if snapshot.is_milestone {
                panel_text.push_str("  |  milestone");
            }
            if snapshot.is_tip {
                panel_text.push_str("  |  tip");
            }
            painter.text(
                rect.left_top() + Vec2::splat(10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if animating || response.dragged() {
            ui.ctx().request_repaint();
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let selection =
                hovered.map(|index| self.graph.nodes[index].snapshot.id.as_str().to_owned());
            self.request_selection(selection);
        }
    }
}
