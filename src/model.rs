use eframe::egui;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Narrowest width a text box may be stored with. Anything thinner can no
/// longer be grabbed with the pointer.
pub const MIN_TEXT_BOX_WIDTH: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageKey(Uuid);

impl PageKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxKey(Uuid);

impl BoxKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BoxKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const BLUE: Rgba = Rgba::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// A positioned, resizable, editable text overlay.
///
/// The three flags form one of four states: idle (nothing set), selected,
/// editing (selected + editing) or transforming (selected + transforming).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextBox {
    pub key: BoxKey,
    #[serde(default)]
    pub block_id: Option<String>,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_color: Rgba,
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    pub font_size: f32,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub is_editing: bool,
    #[serde(default)]
    pub is_transforming: bool,
}

impl TextBox {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            key: BoxKey::new(),
            block_id: None,
            text: text.into(),
            x,
            y,
            width: width.max(MIN_TEXT_BOX_WIDTH),
            height: height.max(0.0),
            font_color: Rgba::BLACK,
            font_family: "Arial".to_string(),
            font_weight: FontWeight::Normal,
            font_size: 16.0,
            is_selected: false,
            is_editing: false,
            is_transforming: false,
        }
    }

    pub fn with_font(
        mut self,
        color: Rgba,
        family: impl Into<String>,
        weight: FontWeight,
        size: f32,
    ) -> Self {
        self.font_color = color;
        self.font_family = family.into();
        self.font_weight = weight;
        self.font_size = size;
        self
    }

    pub fn is_idle(&self) -> bool {
        !self.is_selected && !self.is_editing && !self.is_transforming
    }

    pub fn bounds(&self) -> egui::Rect {
        egui::Rect::from_min_size(
            egui::pos2(self.x, self.y),
            egui::vec2(self.width, self.height),
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrokeTool {
    #[default]
    Pen,
    Eraser,
}

/// One continuous freehand gesture on the paint mask.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrokeSegment {
    pub tool: StrokeTool,
    /// Flat `x, y, x, y, ...` sequence in stage coordinates.
    pub points: Vec<f32>,
    pub stroke_width: f32,
}

impl StrokeSegment {
    pub fn new(tool: StrokeTool, start: Point, stroke_width: f32) -> Self {
        Self {
            tool,
            points: vec![start.x, start.y],
            stroke_width,
        }
    }

    pub fn push(&mut self, p: Point) {
        self.points.push(p.x);
        self.points.push(p.y);
    }

    pub fn point_count(&self) -> usize {
        self.points.len() / 2
    }

    pub fn iter_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.chunks_exact(2).map(|c| Point::new(c[0], c[1]))
    }
}

/// Detection metadata produced outside the editor. Boxes are `[x, y, w, h]`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentData {
    #[serde(default)]
    pub text_bounding_box: Option<[f32; 4]>,
    #[serde(default)]
    pub bubble_bounding_box: Option<[f32; 4]>,
    #[serde(default)]
    pub text_class: Option<String>,
    #[serde(default)]
    pub inpaint_bounding_boxes: Vec<[f32; 4]>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub key: PageKey,
    pub name: String,
    pub order: u32,
    pub source_image: String,
    #[serde(default)]
    pub text_boxes: Vec<TextBox>,
    #[serde(default)]
    pub segment_data: Vec<SegmentData>,
    #[serde(default)]
    pub lines: Vec<StrokeSegment>,
}

impl Page {
    pub fn new(order: u32, source_image: impl Into<String>) -> Self {
        Self {
            key: PageKey::new(),
            name: page_name(order),
            order,
            source_image: source_image.into(),
            text_boxes: Vec::new(),
            segment_data: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn text_box(&self, key: BoxKey) -> Option<&TextBox> {
        self.text_boxes.iter().find(|b| b.key == key)
    }
}

pub fn page_name(order: u32) -> String {
    format!("Page {order}")
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub pages: Vec<Page>,
    pub selected_page_key: Option<PageKey>,
}

impl Document {
    /// Builds a document that selects its first page, if it has one.
    pub fn new(pages: Vec<Page>) -> Self {
        let selected_page_key = pages.first().map(|p| p.key);
        Self {
            pages,
            selected_page_key,
        }
    }

    pub fn page(&self, key: PageKey) -> Option<&Page> {
        self.pages.iter().find(|p| p.key == key)
    }

    pub fn selected_page(&self) -> Option<&Page> {
        self.selected_page_key.and_then(|k| self.page(k))
    }
}

/// The page shown on first launch.
pub fn demo_page(source_image: impl Into<String>) -> Page {
    let mut page = Page::new(1, source_image);
    page.text_boxes = vec![
        TextBox::new("Sample Text Box 1", 50.0, 50.0, 150.0, 50.0).with_font(
            Rgba::BLACK,
            "Arial",
            FontWeight::Normal,
            16.0,
        ),
        TextBox::new("Sample Text Box 2", 250.0, 100.0, 200.0, 80.0).with_font(
            Rgba::BLUE,
            "Verdana",
            FontWeight::Bold,
            20.0,
        ),
    ];
    page.lines = vec![
        StrokeSegment {
            tool: StrokeTool::Pen,
            points: vec![10.0, 10.0, 50.0, 50.0, 90.0, 10.0],
            stroke_width: 5.0,
        },
        StrokeSegment {
            tool: StrokeTool::Eraser,
            points: vec![150.0, 150.0, 200.0, 200.0],
            stroke_width: 10.0,
        },
    ];
    page
}
