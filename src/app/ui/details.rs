use eframe::egui::{self, RichText, Ui};
use tangle_visualizer::tangle::{Flag, GraphEngine, ShortId};

use super::super::ViewModel;
use super::super::render_utils::state_color;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui, engine: &GraphEngine) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(vertex) = engine.selected() else {
            ui.label("Click a vertex in the graph or a search result.");
            return;
        };

        let cone_size = self.selection_cone(engine).map_or(0, |cone| cone.len());
        let mut clicked = None;

        ui.label(RichText::new(vertex.short_id.as_str()).strong().monospace());
        ui.small(vertex.full_id.as_str());
        ui.add_space(6.0);

        let state = vertex.state();
        ui.label(RichText::new(format!("State: {}", state.label())).color(state_color(state)));
        let flags = Flag::ALL
            .into_iter()
            .filter(|&flag| flag != Flag::Selected && vertex.flags.get(flag))
            .map(Flag::label)
            .collect::<Vec<_>>();
        if flags.is_empty() {
            ui.label("Flags: none");
        } else {
            ui.label(format!("Flags: {}", flags.join(", ")));
        }
        ui.label(format!("Admission: #{}", vertex.admitted));
        ui.label(format!("Past cone in view: {cone_size} vertices"));

        ui.separator();
        if vertex.is_stub() {
            ui.label("Parents: not yet received");
        } else {
            ui.label(RichText::new(format!("Parents ({})", vertex.parent_ids().len())).strong());
            id_links(ui, engine, "parent_links_scroll", vertex.parent_ids(), &mut clicked);
        }

        ui.separator();
        ui.label(RichText::new(format!("Children ({})", vertex.children.len())).strong());
        id_links(ui, engine, "child_links_scroll", &vertex.children, &mut clicked);

        ui.separator();
        if ui.button("Clear selection").clicked() {
            self.request_selection(None);
        }
        if let Some(id) = clicked {
            self.request_selection(Some(id));
        }
    }
}

fn id_links(
    ui: &mut Ui,
    engine: &GraphEngine,
    scroll_id: &'static str,
    ids: &[ShortId],
    clicked: &mut Option<String>,
) {
    if ids.is_empty() {
        ui.label("none");
        return;
    }

    egui::ScrollArea::vertical()
        .id_salt(scroll_id)
        .max_height(160.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for id in ids {
                match engine.vertex(id.as_str()) {
                    Some(linked) => {
                        ui.horizontal(|ui| {
                            if ui.link(RichText::new(id.as_str()).monospace()).clicked() {
                                *clicked = Some(id.as_str().to_owned());
                            }
                            let state = linked.state();
                            ui.label(RichText::new(state.label()).color(state_color(state)));
                        });
                    }
                    None => {
                        ui.label(RichText::new(format!("{id} (evicted)")).weak().monospace());
                    }
                }
            }
        });
}
