//! Rasterizing the paint layer on its own, for inpainting masks and for the
//! on-screen paint texture.

use crate::error::ExportError;
use crate::model::{Rgba, StrokeSegment, StrokeTool};
use image::RgbaImage;
use std::path::Path;
use tiny_skia::{
    BlendMode, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

/// Every stroke is drawn in this translucent color.
pub const MASK_COLOR: Rgba = Rgba {
    r: 238,
    g: 232,
    b: 170,
    a: 204,
};

/// Pen paints over what is there; eraser removes existing coverage.
pub fn blend_mode(tool: StrokeTool) -> BlendMode {
    match tool {
        StrokeTool::Pen => BlendMode::SourceOver,
        StrokeTool::Eraser => BlendMode::DestinationOut,
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &StrokeSegment) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(MASK_COLOR.r, MASK_COLOR.g, MASK_COLOR.b, MASK_COLOR.a);
    paint.anti_alias = true;
    paint.blend_mode = blend_mode(stroke.tool);

    let mut points = stroke.iter_points();
    let Some(first) = points.next() else {
        return;
    };

    if stroke.point_count() == 1 {
        // A press without movement leaves a round dot.
        if let Some(dot) = PathBuilder::from_circle(first.x, first.y, stroke.stroke_width * 0.5) {
            pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in points {
        pb.line_to(p.x, p.y);
    }
    let Some(path) = pb.finish() else {
        log::debug!("Skipping degenerate {:?} stroke", stroke.tool);
        return;
    };
    let style = Stroke {
        width: stroke.stroke_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &style, Transform::identity(), None);
}

/// Renders the strokes onto a transparent `width` x `height` raster, in list
/// order, each with its tool's blend mode.
pub fn render_mask(
    lines: &[StrokeSegment],
    width: u32,
    height: u32,
) -> Result<RgbaImage, ExportError> {
    let mut pixmap =
        Pixmap::new(width, height).ok_or(ExportError::EmptySurface { width, height })?;
    for stroke in lines {
        draw_stroke(&mut pixmap, stroke);
    }

    let mut img = RgbaImage::new(width, height);
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    Ok(img)
}

pub fn save_mask(
    lines: &[StrokeSegment],
    width: u32,
    height: u32,
    path: &Path,
) -> Result<(), ExportError> {
    let img = render_mask(lines, width, height)?;
    img.save(path)?;
    log::info!(
        "Exported {}x{} mask with {} stroke(s) to {}",
        width,
        height,
        lines.len(),
        path.display()
    );
    Ok(())
}
