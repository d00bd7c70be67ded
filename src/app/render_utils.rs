use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};
use tangle_visualizer::tangle::VertexState;

pub(super) const MILESTONE_COLOR: Color32 = Color32::from_rgb(190, 120, 240);
pub(super) const TIP_STROKE_COLOR: Color32 = Color32::from_rgb(245, 170, 60);
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const SEARCH_MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
pub(super) const FLASH_COLOR: Color32 = Color32::from_rgb(210, 255, 220);

pub(super) fn state_color(state: VertexState) -> Color32 {
    match state {
        VertexState::Unknown => Color32::from_rgb(90, 96, 110),
        VertexState::Unsolid => Color32::from_rgb(120, 140, 170),
        VertexState::Solid => Color32::from_rgb(70, 150, 220),
        VertexState::Confirmed => Color32::from_rgb(80, 200, 120),
        VertexState::Conflicting => Color32::from_rgb(230, 80, 80),
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + factor * 0.55)) as u8,
    )
}

/// Screen radius of a vertex; milestones are drawn larger.
pub(super) fn node_radius(is_milestone: bool, zoom: f32) -> f32 {
    let base = if is_milestone { 7.5 } else { 4.5 };
    (base * zoom.powf(0.5)).clamp(1.5, 24.0)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    // Vertical guides only; the horizontal axis is admission time.
    let step = (80.0 * zoom.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    let min_x = start.x.min(end.x);
    let max_x = start.x.max(end.x);
    let min_y = start.y.min(end.y);
    let max_y = start.y.max(end.y);
    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}
