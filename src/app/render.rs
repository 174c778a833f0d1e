use crate::editor::BoxPreview;
use crate::editor::router::{ResizeHandle, handle_rect};
use crate::fit::ImageGeometry;
use crate::model::{FontWeight, TextBox};
use eframe::egui;

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(90, 160, 255);
const FULL_UV: egui::Rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect) {
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(235));
}

fn image_rect(origin: egui::Pos2, geometry: &ImageGeometry) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(geometry.offset_x, geometry.offset_y),
        egui::vec2(geometry.image.width, geometry.image.height),
    )
}

pub(super) fn draw_image(
    painter: &egui::Painter,
    origin: egui::Pos2,
    geometry: &ImageGeometry,
    texture: egui::TextureId,
) {
    painter.image(
        texture,
        image_rect(origin, geometry),
        FULL_UV,
        egui::Color32::WHITE,
    );
}

pub(super) fn draw_image_placeholder(
    painter: &egui::Painter,
    origin: egui::Pos2,
    geometry: &ImageGeometry,
    source: &str,
) {
    let rect = image_rect(origin, geometry);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(210));
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        format!("Image unavailable\n{source}"),
        egui::FontId::proportional(14.0),
        egui::Color32::from_gray(90),
    );
}

/// The mask raster always covers the whole stage.
pub(super) fn draw_mask(painter: &egui::Painter, stage: egui::Rect, texture: egui::TextureId) {
    painter.image(texture, stage, FULL_UV, egui::Color32::WHITE);
}

pub(super) fn draw_text_boxes(
    painter: &egui::Painter,
    origin: egui::Pos2,
    boxes: &[TextBox],
    preview: Option<BoxPreview>,
) {
    for text_box in boxes {
        let mut shown = text_box.clone();
        if let Some(p) = preview.filter(|p| p.key == text_box.key) {
            shown.x = p.x;
            shown.y = p.y;
            shown.width = p.width;
        }
        draw_text_box(painter, origin, &shown);
    }
}

fn draw_text_box(painter: &egui::Painter, origin: egui::Pos2, text_box: &TextBox) {
    let rect = text_box.bounds().translate(origin.to_vec2());

    if !text_box.is_editing {
        let clipped = painter.with_clip_rect(rect.intersect(painter.clip_rect()));
        let font_id = egui::FontId::proportional(text_box.font_size);
        let color = text_box.font_color.to_color32();
        let galley =
            clipped.layout(text_box.text.clone(), font_id, color, rect.width().max(1.0));
        clipped.galley(rect.min, galley.clone(), color);
        if text_box.font_weight == FontWeight::Bold {
            // egui's default fonts have no bold face.
            clipped.galley(rect.min + egui::vec2(0.6, 0.0), galley, color);
        }
    }

    if text_box.is_selected {
        painter.rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(1.5, SELECTION_COLOR),
            egui::StrokeKind::Middle,
        );
    } else {
        painter.rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(1.0, egui::Color32::from_black_alpha(60)),
            egui::StrokeKind::Middle,
        );
    }

    if text_box.is_transforming {
        for handle in [ResizeHandle::Left, ResizeHandle::Right] {
            let r = handle_rect(text_box, handle).translate(origin.to_vec2());
            painter.rect_filled(r, 1.0, egui::Color32::WHITE);
            painter.rect_stroke(
                r,
                1.0,
                egui::Stroke::new(1.0, SELECTION_COLOR),
                egui::StrokeKind::Middle,
            );
        }
    }
}
