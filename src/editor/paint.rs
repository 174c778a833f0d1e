//! Freehand stroke accumulation for one page's paint mask.

use crate::model::{Point, StrokeSegment, StrokeTool};

/// Tracks whether a paint gesture is in progress. The strokes themselves
/// always live on the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintController {
    drawing: bool,
}

impl PaintController {
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Starts a new stroke at `pos`. The width is captured now and never
    /// changes for this stroke.
    pub fn begin_stroke(
        &mut self,
        lines: &mut Vec<StrokeSegment>,
        pos: Point,
        tool: StrokeTool,
        stroke_width: f32,
    ) -> bool {
        if !(stroke_width.is_finite() && stroke_width > 0.0) {
            log::warn!("Ignoring stroke with width {stroke_width}");
            return false;
        }
        lines.push(StrokeSegment::new(tool, pos, stroke_width));
        self.drawing = true;
        log::debug!("Began {:?} stroke #{} at ({}, {})", tool, lines.len(), pos.x, pos.y);
        true
    }

    /// Appends `pos` to the last stroke.
    pub fn extend_stroke(&mut self, lines: &mut [StrokeSegment], pos: Point) -> bool {
        if !self.drawing {
            return false;
        }
        let Some(last) = lines.last_mut() else {
            return false;
        };
        last.push(pos);
        true
    }

    /// Stops the gesture. Returns whether one was in progress.
    pub fn end_stroke(&mut self) -> bool {
        std::mem::take(&mut self.drawing)
    }

    pub fn clear_all(&mut self, lines: &mut Vec<StrokeSegment>) {
        lines.clear();
    }
}
