//! The editor session: one state container that owns the document store and
//! routes every command to the page that is currently selected.

use crate::error::{ExportError, ImportError, StoreError};
use crate::fit::{self, FitPolicy, ImageGeometry, Size};
use crate::mask;
use crate::model::{BoxKey, Document, Page, PageKey, Point, SegmentData, StrokeTool, TextBox};
use crate::store::{DocumentStore, PagePatch, StoreEvent};
use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub mod paint;
pub mod router;
pub mod text;

pub use paint::PaintController;
pub use router::{BoxPreview, Hit, KeyEvent, KeyKind, PointerEvent, PointerKind, ResizeHandle};

pub const DEFAULT_STAGE_SIZE: f32 = 800.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditorConfig {
    /// Target box used by the letterbox policy and whenever the image size
    /// is unknown.
    pub stage: Size,
    pub fit_policy: FitPolicy,
    pub brush_width: f32,
    pub brush_min: f32,
    pub brush_max: f32,
}

impl EditorConfig {
    /// Replaces brush limits that are not finite, not positive or inverted
    /// with the defaults, and a non-finite brush width with the default width.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let limits_ok = self.brush_min.is_finite()
            && self.brush_max.is_finite()
            && self.brush_min > 0.0
            && self.brush_min <= self.brush_max;
        if !limits_ok {
            log::warn!(
                "Invalid brush limits {}..{}, using {}..{}",
                self.brush_min,
                self.brush_max,
                defaults.brush_min,
                defaults.brush_max
            );
            self.brush_min = defaults.brush_min;
            self.brush_max = defaults.brush_max;
        }
        if !self.brush_width.is_finite() {
            log::warn!("Invalid brush width {}, using {}", self.brush_width, defaults.brush_width);
            self.brush_width = defaults.brush_width;
        }
        self
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            stage: Size::new(DEFAULT_STAGE_SIZE, DEFAULT_STAGE_SIZE),
            fit_policy: FitPolicy::Native,
            brush_width: 5.0,
            brush_min: 5.0,
            brush_max: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    pub tool: StrokeTool,
    pub width: f32,
}

pub type SelectionListener = Box<dyn FnMut(Option<BoxKey>)>;

pub struct Editor {
    store: DocumentStore,
    config: EditorConfig,
    brush: Brush,
    paint: PaintController,
    paint_mode: bool,
    gesture: Option<router::Gesture>,
    image_sizes: HashMap<String, Size>,
    initialized_pages: HashSet<PageKey>,
    active_box: Option<BoxKey>,
    selection_listeners: Vec<SelectionListener>,
}

impl Editor {
    pub fn new(store: DocumentStore, config: EditorConfig) -> Self {
        let config = config.sanitized();
        let brush = Brush {
            tool: StrokeTool::Pen,
            width: config.brush_width.clamp(config.brush_min, config.brush_max),
        };
        let mut editor = Self {
            store,
            config,
            brush,
            paint: PaintController::default(),
            paint_mode: false,
            gesture: None,
            image_sizes: HashMap::new(),
            initialized_pages: HashSet::new(),
            active_box: None,
            selection_listeners: Vec::new(),
        };
        editor.sync();
        editor
    }

    // ── Snapshots ──────────────────────────────────────────────────────────

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn document(&self) -> &Document {
        self.store.document()
    }

    pub fn selected_page(&self) -> Option<&Page> {
        self.store.selected_page()
    }

    pub fn text_boxes(&self) -> &[TextBox] {
        self.selected_page()
            .map(|p| p.text_boxes.as_slice())
            .unwrap_or(&[])
    }

    /// Key of the selected text box on the selected page.
    pub fn active_box(&self) -> Option<BoxKey> {
        self.active_box
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.store.subscribe(listener);
    }

    /// Registers a listener called with the new active box whenever it
    /// changes. A box that is already active is reported right away.
    pub fn on_selection_change(&mut self, mut listener: impl FnMut(Option<BoxKey>) + 'static) {
        if self.active_box.is_some() {
            listener(self.active_box);
        }
        self.selection_listeners.push(Box::new(listener));
    }

    // ── Pages ──────────────────────────────────────────────────────────────

    pub fn add_page(&mut self, source_image: impl Into<String>) -> PageKey {
        let key = self.store.add_page(source_image).key;
        self.reset_interaction();
        self.sync();
        key
    }

    pub fn update_page(&mut self, key: PageKey, patch: PagePatch) -> Result<(), StoreError> {
        self.store.update_page(key, patch)?;
        self.sync();
        Ok(())
    }

    pub fn delete_page(&mut self, key: PageKey) -> Result<(), StoreError> {
        let was_selected = self.store.selected_page_key() == Some(key);
        self.store.delete_page(key)?;
        self.initialized_pages.remove(&key);
        if was_selected {
            self.reset_interaction();
        }
        self.sync();
        Ok(())
    }

    pub fn select_page(&mut self, key: PageKey) -> Result<(), StoreError> {
        if self.store.selected_page_key() == Some(key) {
            return Ok(());
        }
        self.store.select_page(key)?;
        self.reset_interaction();
        self.sync();
        Ok(())
    }

    /// Replaces the selected page's detection data with a JSON array of
    /// segments. Returns how many were read.
    pub fn import_segments(&mut self, json: &str) -> Result<usize, ImportError> {
        let segments: Vec<SegmentData> = serde_json::from_str(json)?;
        let key = self.store.selected_page_key().ok_or(ImportError::NoPage)?;
        let count = segments.len();
        self.update_page(
            key,
            PagePatch {
                segment_data: Some(segments),
                ..Default::default()
            },
        )?;
        Ok(count)
    }

    // ── Image fit ──────────────────────────────────────────────────────────

    /// Records the decoded size of an image, or forgets it with `None`.
    pub fn set_image_size(&mut self, source_image: &str, size: Option<Size>) {
        match size {
            Some(size) => {
                self.image_sizes.insert(source_image.to_string(), size);
            }
            None => {
                self.image_sizes.remove(source_image);
            }
        }
    }

    pub fn set_stage_target(&mut self, stage: Size) {
        self.config.stage = stage;
    }

    pub fn set_fit_policy(&mut self, policy: FitPolicy) {
        self.config.fit_policy = policy;
    }

    pub fn fit_policy(&self) -> FitPolicy {
        self.config.fit_policy
    }

    /// Geometry of the selected page's image on the stage.
    pub fn geometry(&self) -> ImageGeometry {
        let native = self
            .selected_page()
            .and_then(|p| self.image_sizes.get(&p.source_image).copied());
        fit::fit_image(native, self.config.stage, self.config.fit_policy)
    }

    // ── Brush and paint mode ───────────────────────────────────────────────

    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Only strokes begun after this call use the new width. Limits are
    /// finite and ordered once the editor is built.
    pub fn set_brush_width(&mut self, width: f32) {
        if !width.is_finite() {
            log::warn!("Ignoring brush width {width}");
            return;
        }
        self.brush.width = width.clamp(self.config.brush_min, self.config.brush_max);
    }

    pub fn set_tool(&mut self, tool: StrokeTool) {
        self.brush.tool = tool;
    }

    pub fn paint_mode(&self) -> bool {
        self.paint_mode
    }

    /// Switching paint mode on always clears text selection on the page.
    pub fn set_paint_mode(&mut self, enabled: bool) {
        if self.paint_mode == enabled {
            return;
        }
        self.paint_mode = enabled;
        self.reset_interaction();
        if enabled {
            self.deselect_all();
        }
        log::debug!("Paint mode {}", if enabled { "on" } else { "off" });
        self.sync();
    }

    // ── Text boxes ─────────────────────────────────────────────────────────

    fn edit_boxes(&mut self, key: BoxKey, f: impl FnOnce(&mut Vec<TextBox>) -> bool) -> bool {
        let Some(page) = self.selected_page() else {
            log::debug!("No page selected for text box {key}");
            return false;
        };
        if page.text_box(key).is_none() {
            log::debug!("Text box {key} not on {}", page.name);
            return false;
        }
        let page_key = page.key;
        let changed = self
            .store
            .edit_page(page_key, |p| f(&mut p.text_boxes))
            .unwrap_or(false);
        self.sync();
        changed
    }

    pub fn select_box(&mut self, key: BoxKey) -> bool {
        self.edit_boxes(key, |boxes| text::select(boxes, key))
    }

    pub fn toggle_edit(&mut self, key: BoxKey) -> bool {
        self.edit_boxes(key, |boxes| text::toggle_edit(boxes, key))
    }

    pub fn toggle_transform(&mut self, key: BoxKey) -> bool {
        self.edit_boxes(key, |boxes| text::toggle_transform(boxes, key))
    }

    pub fn change_text(&mut self, key: BoxKey, text: &str) -> bool {
        self.edit_boxes(key, |boxes| text::change_text(boxes, key, text))
    }

    pub fn resize_box(&mut self, key: BoxKey, width: f32, height: f32) -> bool {
        self.edit_boxes(key, |boxes| text::resize(boxes, key, width, height))
    }

    pub fn drag_end(&mut self, key: BoxKey, x: f32, y: f32) -> bool {
        self.edit_boxes(key, |boxes| text::drag_end(boxes, key, x, y))
    }

    pub fn deselect_all(&mut self) {
        let Some(key) = self.store.selected_page_key() else {
            return;
        };
        let any_active = self
            .text_boxes()
            .iter()
            .any(|b| b.is_selected || b.is_editing || b.is_transforming);
        if any_active {
            if let Err(e) = self
                .store
                .edit_page(key, |p| text::deselect_all(&mut p.text_boxes))
            {
                log::debug!("Deselect skipped: {e}");
            }
        }
        self.sync();
    }

    /// Leaves edit mode on the editing box, if any.
    pub fn commit_edit(&mut self) -> Option<BoxKey> {
        text::editing_key(self.text_boxes())?;
        let page_key = self.store.selected_page_key()?;
        let committed = match self
            .store
            .edit_page(page_key, |p| text::commit_edit(&mut p.text_boxes))
        {
            Ok(key) => key,
            Err(e) => {
                log::debug!("Commit skipped: {e}");
                None
            }
        };
        self.sync();
        committed
    }

    // ── Paint mask ─────────────────────────────────────────────────────────

    pub fn begin_stroke(&mut self, pos: Point) -> bool {
        if !self.paint_mode {
            return false;
        }
        let Some(key) = self.store.selected_page_key() else {
            return false;
        };
        let Brush { tool, width } = self.brush;
        let paint = &mut self.paint;
        self.store
            .edit_page(key, |p| paint.begin_stroke(&mut p.lines, pos, tool, width))
            .unwrap_or(false)
    }

    pub fn extend_stroke(&mut self, pos: Point) -> bool {
        if !self.paint_mode || !self.paint.is_drawing() {
            return false;
        }
        let Some(page) = self.selected_page() else {
            return false;
        };
        if page.lines.is_empty() {
            return false;
        }
        let key = page.key;
        let paint = &mut self.paint;
        self.store
            .edit_page(key, |p| paint.extend_stroke(&mut p.lines, pos))
            .unwrap_or(false)
    }

    pub fn end_stroke(&mut self) -> bool {
        self.paint.end_stroke()
    }

    pub fn is_drawing(&self) -> bool {
        self.paint.is_drawing()
    }

    pub fn clear_mask(&mut self) {
        let Some(key) = self.store.selected_page_key() else {
            return;
        };
        let paint = &mut self.paint;
        if let Err(e) = self.store.edit_page(key, |p| paint.clear_all(&mut p.lines)) {
            log::debug!("Clear skipped: {e}");
        }
    }

    /// Pixel size of the exported mask: the stage, rounded.
    pub fn mask_size(&self) -> (u32, u32) {
        let stage = self.geometry().stage;
        (
            stage.width.round().max(0.0) as u32,
            stage.height.round().max(0.0) as u32,
        )
    }

    /// Rasterizes the selected page's paint layer on its own.
    pub fn render_mask(&self) -> Result<RgbaImage, ExportError> {
        let page = self.selected_page().ok_or(ExportError::NoPage)?;
        let (width, height) = self.mask_size();
        mask::render_mask(&page.lines, width, height)
    }

    pub fn export_mask(&self, path: &Path) -> Result<(), ExportError> {
        let page = self.selected_page().ok_or(ExportError::NoPage)?;
        let (width, height) = self.mask_size();
        mask::save_mask(&page.lines, width, height, path)
    }

    // ── Bookkeeping ────────────────────────────────────────────────────────

    fn reset_interaction(&mut self) {
        self.gesture = None;
        self.paint.end_stroke();
    }

    fn sync(&mut self) {
        self.initialize_selection();
        self.refresh_active_box();
    }

    /// The first time a page's boxes are shown, the first box gets selected
    /// if none is. Never repeated for the same page.
    fn initialize_selection(&mut self) {
        if self.paint_mode {
            return;
        }
        let Some(page) = self.store.selected_page() else {
            return;
        };
        if page.text_boxes.is_empty() || self.initialized_pages.contains(&page.key) {
            return;
        }
        let key = page.key;
        let needs_default = text::selected_key(&page.text_boxes).is_none();
        self.initialized_pages.insert(key);
        if needs_default {
            if let Ok(Some(first)) = self
                .store
                .edit_page(key, |p| text::select_first_if_none(&mut p.text_boxes))
            {
                log::debug!("Selected first text box {first} by default");
            }
        }
    }

    fn refresh_active_box(&mut self) {
        let current = text::selected_key(self.text_boxes());
        if current != self.active_box {
            self.active_box = current;
            for listener in &mut self.selection_listeners {
                listener(current);
            }
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(DocumentStore::default(), EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TextBox, demo_page};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor_with_boxes(n: usize) -> (Editor, Vec<BoxKey>) {
        let mut page = Page::new(1, "page.png");
        page.text_boxes = (0..n)
            .map(|i| TextBox::new(format!("t{i}"), i as f32 * 100.0, 10.0, 80.0, 40.0))
            .collect();
        let keys = page.text_boxes.iter().map(|b| b.key).collect();
        let editor = Editor::new(DocumentStore::from_pages(vec![page]), EditorConfig::default());
        (editor, keys)
    }

    #[test]
    fn first_box_is_selected_on_open() {
        let (editor, keys) = editor_with_boxes(2);
        assert_eq!(editor.active_box(), Some(keys[0]));
        assert!(editor.text_boxes()[0].is_selected);
    }

    #[test]
    fn default_selection_is_not_reforced() {
        let (mut editor, _) = editor_with_boxes(2);
        editor.deselect_all();
        assert_eq!(editor.active_box(), None);
        let second = editor.text_boxes()[1].key;
        editor.change_text(second, "again");
        assert!(editor.text_boxes().iter().all(TextBox::is_idle));
    }

    #[test]
    fn switching_back_to_a_page_does_not_reselect() {
        let (mut editor, _) = editor_with_boxes(2);
        let first_page = editor.document().pages[0].key;
        editor.deselect_all();
        editor.add_page("other.png");
        editor.select_page(first_page).unwrap();
        assert_eq!(editor.active_box(), None);
    }

    #[test]
    fn paint_mode_clears_text_state() {
        let (mut editor, keys) = editor_with_boxes(2);
        editor.toggle_edit(keys[1]);
        assert!(editor.text_boxes()[1].is_editing);
        editor.set_paint_mode(true);
        assert!(editor.text_boxes().iter().all(TextBox::is_idle));
        assert_eq!(editor.active_box(), None);
    }

    #[test]
    fn selection_listener_hears_changes_once() {
        let (mut editor, keys) = editor_with_boxes(2);
        let heard = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&heard);
        editor.on_selection_change(move |k| sink.borrow_mut().push(k));
        editor.select_box(keys[1]);
        editor.select_box(keys[1]);
        editor.deselect_all();
        assert_eq!(
            heard.borrow().as_slice(),
            &[Some(keys[0]), Some(keys[1]), None]
        );
    }

    #[test]
    fn late_listener_hears_the_default_selection() {
        let page = demo_page("demo.png");
        let first = page.text_boxes[0].key;
        let mut editor = Editor::new(DocumentStore::from_pages(vec![page]), EditorConfig::default());
        let heard = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&heard);
        editor.on_selection_change(move |k| sink.borrow_mut().push(k));
        assert_eq!(heard.borrow().as_slice(), &[Some(first)]);

        let (mut empty, _) = editor_with_boxes(0);
        let quiet = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&quiet);
        empty.on_selection_change(move |k| sink.borrow_mut().push(k));
        assert!(quiet.borrow().is_empty());
    }

    #[test]
    fn commit_edit_leaves_the_box_selected() {
        let (mut editor, keys) = editor_with_boxes(2);
        let before = editor.revision();
        assert_eq!(editor.commit_edit(), None);
        assert_eq!(editor.revision(), before);
        editor.toggle_edit(keys[1]);
        assert_eq!(editor.commit_edit(), Some(keys[1]));
        let b = &editor.text_boxes()[1];
        assert!(b.is_selected && !b.is_editing);
        assert_eq!(editor.active_box(), Some(keys[1]));
    }

    #[test]
    fn stroke_keeps_width_from_its_start() {
        let (mut editor, _) = editor_with_boxes(0);
        editor.set_paint_mode(true);
        editor.set_brush_width(15.0);
        assert!(editor.begin_stroke(Point::new(1.0, 1.0)));
        editor.set_brush_width(40.0);
        editor.extend_stroke(Point::new(2.0, 2.0));
        editor.extend_stroke(Point::new(3.0, 3.0));
        editor.end_stroke();
        let lines = &editor.selected_page().unwrap().lines;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].points.len(), 6);
        assert_eq!(lines[0].stroke_width, 15.0);
        assert_eq!(editor.brush().width, 40.0);
    }

    #[test]
    fn brush_width_is_clamped_to_limits() {
        let mut editor = Editor::default();
        editor.set_brush_width(1.0);
        assert_eq!(editor.brush().width, 5.0);
        editor.set_brush_width(500.0);
        assert_eq!(editor.brush().width, 50.0);
        editor.set_brush_width(f32::NAN);
        assert_eq!(editor.brush().width, 50.0);
    }

    #[test]
    fn bad_brush_limits_fall_back_to_defaults() {
        for (min, max) in [(f32::NAN, 50.0), (5.0, f32::INFINITY), (40.0, 10.0), (0.0, 20.0)] {
            let config = EditorConfig {
                brush_width: f32::NAN,
                brush_min: min,
                brush_max: max,
                ..Default::default()
            };
            let mut editor = Editor::new(DocumentStore::default(), config);
            assert_eq!(editor.brush().width, 5.0);
            editor.set_brush_width(500.0);
            assert_eq!(editor.brush().width, 50.0);
        }
        let kept = EditorConfig {
            brush_min: 2.0,
            brush_max: 8.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!((kept.brush_min, kept.brush_max), (2.0, 8.0));
    }

    #[test]
    fn strokes_need_paint_mode() {
        let (mut editor, _) = editor_with_boxes(0);
        assert!(!editor.begin_stroke(Point::new(1.0, 1.0)));
        assert!(editor.selected_page().unwrap().lines.is_empty());
    }

    #[test]
    fn clear_mask_empties_strokes() {
        let mut editor = Editor::new(
            DocumentStore::from_pages(vec![demo_page("demo.png")]),
            EditorConfig::default(),
        );
        assert_eq!(editor.selected_page().unwrap().lines.len(), 2);
        editor.clear_mask();
        assert!(editor.selected_page().unwrap().lines.is_empty());
    }

    #[test]
    fn geometry_tracks_known_image_sizes() {
        let (mut editor, _) = editor_with_boxes(0);
        assert_eq!(editor.geometry().stage, Size::new(800.0, 800.0));
        editor.set_image_size("page.png", Some(Size::new(1200.0, 1700.0)));
        assert_eq!(editor.geometry().stage, Size::new(1200.0, 1700.0));
        assert_eq!(editor.mask_size(), (1200, 1700));
        editor.set_fit_policy(FitPolicy::Letterbox);
        assert_eq!(editor.geometry().stage, Size::new(800.0, 800.0));
        editor.set_stage_target(Size::new(600.0, 340.0));
        assert_eq!(editor.geometry().image.height, 340.0);
        assert_eq!(editor.mask_size(), (600, 340));
        editor.set_image_size("page.png", None);
        assert_eq!(editor.geometry().image, Size::new(800.0, 800.0));
    }

    #[test]
    fn render_mask_uses_stage_size() {
        let mut editor = Editor::new(
            DocumentStore::from_pages(vec![demo_page("demo.png")]),
            EditorConfig::default(),
        );
        editor.set_image_size("demo.png", Some(Size::new(320.0, 240.0)));
        let img = editor.render_mask().unwrap();
        assert_eq!(img.dimensions(), (320, 240));
    }

    #[test]
    fn render_mask_without_pages_fails() {
        let editor = Editor::default();
        assert!(matches!(editor.render_mask(), Err(ExportError::NoPage)));
    }

    #[test]
    fn import_segments_replaces_page_data() {
        let (mut editor, _) = editor_with_boxes(0);
        let json = r#"[{"textBoundingBox":[1,2,3,4]},{"textClass":"sfx"}]"#;
        assert_eq!(editor.import_segments(json).unwrap(), 2);
        assert_eq!(editor.selected_page().unwrap().segment_data.len(), 2);
        assert!(editor.import_segments("not json").is_err());
        assert_eq!(editor.selected_page().unwrap().segment_data.len(), 2);
    }

    #[test]
    fn commands_for_a_deleted_page_do_nothing() {
        let (mut editor, keys) = editor_with_boxes(1);
        let first = editor.document().pages[0].key;
        editor.add_page("second.png");
        editor.delete_page(first).unwrap();
        assert!(!editor.toggle_edit(keys[0]));
        assert!(!editor.drag_end(keys[0], 5.0, 5.0));
        assert_eq!(editor.document().pages.len(), 1);
    }
}
