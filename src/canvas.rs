//! Canvas view transform and box painting.
//!
//! The image may be displayed at any size; the transform maps between
//! image-pixel coordinates and screen coordinates, and every stroke, handle,
//! and label scales with the current zoom.

use egui::{Color32, FontId, Painter, Pos2, Stroke, StrokeKind, Vec2};

use crate::editor::HANDLE_SIZE;
use crate::model::{AnnotationBox, BoxId, FaultType, Provenance, Rect};

pub const AI_COLOR: Color32 = Color32::from_rgb(0xff, 0x00, 0x00);
pub const USER_COLOR: Color32 = Color32::from_rgb(0x00, 0xff, 0x00);
pub const POTENTIAL_COLOR: Color32 = Color32::from_rgb(0xff, 0xff, 0x00);
pub const SELECTED_COLOR: Color32 = Color32::WHITE;

const LABEL_FONT_SIZE: f32 = 12.0;

// ── View transform ──────────────────────────────────────────────────────────

pub struct CanvasView {
    pub image_size: (f32, f32),
    pub pan: Vec2,
    pub zoom: f32,
}

impl CanvasView {
    pub fn new(image_size: (f32, f32)) -> Self {
        Self {
            image_size,
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }

    /// Initial zoom: show the whole image, never upscale past 1:1.
    pub fn fit(&mut self, canvas_rect: egui::Rect) {
        let sx = canvas_rect.width() / self.image_size.0;
        let sy = canvas_rect.height() / self.image_size.1;
        self.zoom = sx.min(sy).min(1.0).max(0.05);
        self.pan = Vec2::ZERO;
    }

    /// Convert image-space coords to screen-space
    pub fn image_to_screen(&self, canvas_rect: egui::Rect, img_pos: Pos2) -> Pos2 {
        let center = canvas_rect.center();
        center
            + self.pan
            + (img_pos.to_vec2() - egui::vec2(self.image_size.0, self.image_size.1) * 0.5)
                * self.zoom
    }

    /// Convert screen-space coords to image-space
    pub fn screen_to_image(&self, canvas_rect: egui::Rect, screen_pos: Pos2) -> Pos2 {
        let center = canvas_rect.center();
        let rel = screen_pos - center - self.pan;
        egui::pos2(
            rel.x / self.zoom + self.image_size.0 * 0.5,
            rel.y / self.zoom + self.image_size.1 * 0.5,
        )
    }

    pub fn image_rect_on_screen(&self, canvas_rect: egui::Rect) -> egui::Rect {
        let top_left = self.image_to_screen(canvas_rect, Pos2::ZERO);
        let bot_right = self.image_to_screen(
            canvas_rect,
            egui::pos2(self.image_size.0, self.image_size.1),
        );
        egui::Rect::from_min_max(top_left, bot_right)
    }

    pub fn rect_to_screen(&self, canvas_rect: egui::Rect, rect: &Rect) -> egui::Rect {
        egui::Rect::from_min_max(
            self.image_to_screen(canvas_rect, egui::pos2(rect.x, rect.y)),
            self.image_to_screen(canvas_rect, egui::pos2(rect.right(), rect.bottom())),
        )
    }

    /// Wheel zoom about the cursor so the point under it stays put.
    pub fn zoom_at(&mut self, canvas_rect: egui::Rect, cursor: Pos2, scroll_delta: f32) {
        let zoom_factor = 1.0 + scroll_delta * 0.002;
        let new_zoom = (self.zoom * zoom_factor).clamp(0.1, 10.0);
        let center = canvas_rect.center();
        let cursor_rel = cursor - center - self.pan;
        self.pan -= cursor_rel * (new_zoom / self.zoom - 1.0);
        self.zoom = new_zoom;
    }
}

// ── Painting ────────────────────────────────────────────────────────────────

/// Provenance decides the color; a "potential" fault type overrides it.
pub fn box_color(fault_type: FaultType, provenance: &Provenance) -> Color32 {
    if fault_type.is_potential() {
        return POTENTIAL_COLOR;
    }
    match provenance {
        Provenance::Manual => USER_COLOR,
        Provenance::Detected { .. } => AI_COLOR,
    }
}

pub fn draw_boxes(
    painter: &Painter,
    view: &CanvasView,
    canvas_rect: egui::Rect,
    boxes: &[AnnotationBox],
    selected: Option<BoxId>,
) {
    for b in boxes {
        draw_box(painter, view, canvas_rect, b, selected == Some(b.id));
    }
}

fn draw_box(
    painter: &Painter,
    view: &CanvasView,
    canvas_rect: egui::Rect,
    b: &AnnotationBox,
    is_selected: bool,
) {
    let rect = view.rect_to_screen(canvas_rect, &b.rect);
    let color = box_color(b.fault_type, &b.provenance);

    let (stroke_color, stroke_width) = if is_selected {
        (SELECTED_COLOR, 3.0 * view.zoom)
    } else {
        (color, 2.0 * view.zoom)
    };
    painter.rect_stroke(
        rect,
        0.0,
        Stroke::new(stroke_width, stroke_color),
        StrokeKind::Middle,
    );

    if is_selected {
        draw_handles(painter, view, rect);
    }

    draw_label(painter, view, rect.min, &b.label());
}

/// The in-progress candidate: outline plus a translucent fill so it reads
/// differently from committed boxes.
pub fn draw_preview(
    painter: &Painter,
    view: &CanvasView,
    canvas_rect: egui::Rect,
    rect: &Rect,
    fault_type: FaultType,
) {
    let screen = view.rect_to_screen(canvas_rect, rect);
    let color = box_color(fault_type, &Provenance::Manual);

    painter.rect_filled(
        screen,
        0.0,
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), 0x20),
    );
    painter.rect_stroke(
        screen,
        0.0,
        Stroke::new(2.0 * view.zoom, color),
        StrokeKind::Middle,
    );
}

fn draw_handles(painter: &Painter, view: &CanvasView, rect: egui::Rect) {
    let size = HANDLE_SIZE * view.zoom;
    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];

    for corner in corners {
        let handle = egui::Rect::from_center_size(corner, Vec2::splat(size));
        painter.rect_filled(handle, 0.0, Color32::WHITE);
        painter.rect_stroke(
            handle,
            0.0,
            Stroke::new(1.0, Color32::BLACK),
            StrokeKind::Middle,
        );
    }
}

fn draw_label(painter: &Painter, view: &CanvasView, box_top_left: Pos2, text: &str) {
    let font = FontId::proportional(LABEL_FONT_SIZE * view.zoom);
    let galley = painter.layout_no_wrap(text.to_string(), font, Color32::BLACK);

    let pad = 3.0 * view.zoom;
    let text_pos = Pos2::new(
        box_top_left.x + pad,
        box_top_left.y - galley.size().y - pad,
    );
    let background = egui::Rect::from_min_size(
        Pos2::new(box_top_left.x, text_pos.y - pad),
        galley.size() + Vec2::new(2.0 * pad, 2.0 * pad),
    );

    painter.rect_filled(background, 0.0, Color32::WHITE);
    painter.galley(text_pos, galley, Color32::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_image_round_trip() {
        let mut view = CanvasView::new((800.0, 600.0));
        view.pan = egui::vec2(13.0, -7.0);
        view.zoom = 0.75;
        let canvas = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(1000.0, 700.0));

        let img = egui::pos2(123.0, 456.0);
        let screen = view.image_to_screen(canvas, img);
        let back = view.screen_to_image(canvas, screen);
        assert!((back.x - img.x).abs() < 1e-3);
        assert!((back.y - img.y).abs() < 1e-3);
    }

    #[test]
    fn test_fit_never_upscales() {
        let mut view = CanvasView::new((200.0, 100.0));
        let canvas = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(1000.0, 700.0));
        view.fit(canvas);
        assert_eq!(view.zoom, 1.0);

        let mut view = CanvasView::new((2000.0, 1000.0));
        view.fit(canvas);
        assert!((view.zoom - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_potential_type_overrides_provenance_color() {
        assert_eq!(
            box_color(FaultType::TinyPotentialSpot, &Provenance::Manual),
            POTENTIAL_COLOR
        );
        assert_eq!(
            box_color(
                FaultType::TinyPotentialSpot,
                &Provenance::Detected { confidence: 0.9 }
            ),
            POTENTIAL_COLOR
        );
        assert_eq!(
            box_color(FaultType::LooseJoint, &Provenance::Manual),
            USER_COLOR
        );
        assert_eq!(
            box_color(FaultType::LooseJoint, &Provenance::Detected { confidence: 0.9 }),
            AI_COLOR
        );
    }
}
