//! Pointer and keyboard routing.
//!
//! In paint mode every pointer event goes to the paint mask and text boxes
//! are never hit-tested. Otherwise presses are resolved against the boxes on
//! the selected page, and drag/resize gestures are previewed here until the
//! pointer is released.

use eframe::egui;

use super::Editor;
use crate::model::{BoxKey, MIN_TEXT_BOX_WIDTH, Point, TextBox};

/// Side length of the resize handles, in stage units.
pub const HANDLE_SIZE: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Click,
    DoubleClick,
}

/// A pointer event in stage coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub pos: Point,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            pos: Point::new(x, y),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    Escape,
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyKind,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: KeyKind, shift: bool) -> Self {
        Self { key, shift }
    }

    /// Escape, or Enter without Shift.
    pub fn ends_edit(&self) -> bool {
        match self.key {
            KeyKind::Escape => true,
            KeyKind::Enter => !self.shift,
            KeyKind::Other => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    Left,
    Right,
}

/// What a stage position lands on, topmost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Handle(BoxKey, ResizeHandle),
    TextBox(BoxKey),
    Image,
    Empty,
}

/// Where a box is drawn while a drag or resize is in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxPreview {
    pub key: BoxKey,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Gesture {
    Move {
        key: BoxKey,
        grab: Point,
        start: Point,
        current: Point,
    },
    Resize {
        key: BoxKey,
        handle: ResizeHandle,
        start_pointer: Point,
        start_x: f32,
        start_width: f32,
        x: f32,
        width: f32,
    },
}

pub fn handle_rect(text_box: &TextBox, handle: ResizeHandle) -> egui::Rect {
    let cx = match handle {
        ResizeHandle::Left => text_box.x,
        ResizeHandle::Right => text_box.x + text_box.width,
    };
    egui::Rect::from_center_size(
        egui::pos2(cx, text_box.y + text_box.height * 0.5),
        egui::vec2(HANDLE_SIZE, HANDLE_SIZE),
    )
}

impl Editor {
    pub fn hit_test(&self, pos: Point) -> Hit {
        let boxes = self.text_boxes();
        if let Some(b) = boxes.iter().find(|b| b.is_transforming) {
            for handle in [ResizeHandle::Left, ResizeHandle::Right] {
                if handle_rect(b, handle).contains(pos.to_pos2()) {
                    return Hit::Handle(b.key, handle);
                }
            }
        }
        if let Some(b) = boxes.iter().rev().find(|b| b.contains(pos)) {
            return Hit::TextBox(b.key);
        }
        if self.selected_page().is_some() && self.geometry().image_contains(pos.x, pos.y) {
            Hit::Image
        } else {
            Hit::Empty
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.paint_mode {
            self.route_to_paint(event);
        } else {
            self.route_to_text(event);
        }
    }

    /// Returns true when the key ended an edit.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        if !event.ends_edit() {
            return false;
        }
        self.commit_edit().is_some()
    }

    pub fn preview(&self) -> Option<BoxPreview> {
        let gesture = self.gesture?;
        match gesture {
            Gesture::Move { key, current, .. } => {
                let b = self.find_box(key)?;
                Some(BoxPreview {
                    key,
                    x: current.x,
                    y: current.y,
                    width: b.width,
                })
            }
            Gesture::Resize { key, x, width, .. } => {
                let b = self.find_box(key)?;
                Some(BoxPreview {
                    key,
                    x,
                    y: b.y,
                    width,
                })
            }
        }
    }

    fn route_to_paint(&mut self, event: PointerEvent) {
        match event.kind {
            PointerKind::Down => {
                self.begin_stroke(event.pos);
            }
            PointerKind::Move => {
                self.extend_stroke(event.pos);
            }
            PointerKind::Up => {
                self.end_stroke();
            }
            PointerKind::Click | PointerKind::DoubleClick => {}
        }
    }

    fn route_to_text(&mut self, event: PointerEvent) {
        match event.kind {
            PointerKind::Down => self.press(event.pos),
            PointerKind::Move => self.drag_to(event.pos),
            PointerKind::Up => self.release(),
            PointerKind::Click => {
                if let Hit::TextBox(key) = self.hit_test(event.pos) {
                    let editing = self.find_box(key).is_some_and(|b| b.is_editing);
                    if !editing {
                        self.toggle_transform(key);
                    }
                }
            }
            PointerKind::DoubleClick => {
                if let Hit::TextBox(key) = self.hit_test(event.pos) {
                    self.toggle_edit(key);
                }
            }
        }
    }

    fn press(&mut self, pos: Point) {
        self.gesture = None;
        match self.hit_test(pos) {
            Hit::Handle(key, handle) => {
                if let Some((x, width)) = self.find_box(key).map(|b| (b.x, b.width)) {
                    self.gesture = Some(Gesture::Resize {
                        key,
                        handle,
                        start_pointer: pos,
                        start_x: x,
                        start_width: width,
                        x,
                        width,
                    });
                }
            }
            Hit::TextBox(key) => {
                self.select_box(key);
                let origin = self
                    .find_box(key)
                    .filter(|b| !b.is_editing)
                    .map(|b| Point::new(b.x, b.y));
                if let Some(origin) = origin {
                    self.gesture = Some(Gesture::Move {
                        key,
                        grab: Point::new(pos.x - origin.x, pos.y - origin.y),
                        start: origin,
                        current: origin,
                    });
                }
            }
            Hit::Image | Hit::Empty => self.deselect_all(),
        }
    }

    fn find_box(&self, key: BoxKey) -> Option<&TextBox> {
        self.selected_page()?.text_box(key)
    }

    fn drag_to(&mut self, pos: Point) {
        let Some(gesture) = &mut self.gesture else {
            return;
        };
        match gesture {
            Gesture::Move { grab, current, .. } => {
                *current = Point::new(pos.x - grab.x, pos.y - grab.y);
            }
            Gesture::Resize {
                handle,
                start_pointer,
                start_x,
                start_width,
                x,
                width,
                ..
            } => {
                let dx = pos.x - start_pointer.x;
                match handle {
                    ResizeHandle::Right => {
                        *width = (*start_width + dx).max(MIN_TEXT_BOX_WIDTH);
                        *x = *start_x;
                    }
                    ResizeHandle::Left => {
                        let right = *start_x + *start_width;
                        *width = (*start_width - dx).max(MIN_TEXT_BOX_WIDTH);
                        *x = right - *width;
                    }
                }
            }
        }
    }

    fn release(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        match gesture {
            Gesture::Move {
                key,
                start,
                current,
                ..
            } => {
                if current != start {
                    log::debug!("Moved text box {key} to ({}, {})", current.x, current.y);
                    self.drag_end(key, current.x, current.y);
                }
            }
            Gesture::Resize {
                key,
                handle,
                start_x,
                start_width,
                x,
                width,
                ..
            } => {
                if width == start_width && x == start_x {
                    return;
                }
                let Some((y, height)) = self.find_box(key).map(|b| (b.y, b.height))
                else {
                    return;
                };
                self.resize_box(key, width, height);
                if handle == ResizeHandle::Left {
                    self.drag_end(key, x, y);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorConfig;
    use crate::fit::{FitPolicy, Size};
    use crate::model::Page;
    use crate::store::DocumentStore;

    fn editor() -> (Editor, BoxKey, BoxKey) {
        let mut page = Page::new(1, "page.png");
        page.text_boxes = vec![
            TextBox::new("left", 100.0, 100.0, 100.0, 40.0),
            TextBox::new("right", 400.0, 100.0, 100.0, 40.0),
        ];
        let (a, b) = (page.text_boxes[0].key, page.text_boxes[1].key);
        let editor = Editor::new(DocumentStore::from_pages(vec![page]), EditorConfig::default());
        (editor, a, b)
    }

    fn send(editor: &mut Editor, kind: PointerKind, x: f32, y: f32) {
        editor.handle_pointer(PointerEvent::new(kind, x, y));
    }

    fn find(editor: &Editor, key: BoxKey) -> TextBox {
        editor.selected_page().unwrap().text_box(key).unwrap().clone()
    }

    #[test]
    fn press_on_box_selects_it() {
        let (mut ed, a, b) = editor();
        send(&mut ed, PointerKind::Down, 450.0, 120.0);
        assert!(find(&ed, b).is_selected);
        assert!(find(&ed, a).is_idle());
        assert_eq!(ed.active_box(), Some(b));
    }

    #[test]
    fn press_on_image_deselects_everything() {
        let (mut ed, a, _) = editor();
        ed.toggle_edit(a);
        send(&mut ed, PointerKind::Down, 700.0, 700.0);
        assert_eq!(ed.hit_test(Point::new(700.0, 700.0)), Hit::Image);
        assert!(ed.text_boxes().iter().all(TextBox::is_idle));
        assert_eq!(ed.active_box(), None);
    }

    #[test]
    fn press_on_empty_stage_deselects_everything() {
        let (mut ed, _, _) = editor();
        ed.set_image_size("page.png", Some(Size::new(400.0, 800.0)));
        ed.set_fit_policy(FitPolicy::Letterbox);
        assert_eq!(ed.hit_test(Point::new(50.0, 700.0)), Hit::Empty);
        send(&mut ed, PointerKind::Down, 50.0, 700.0);
        assert!(ed.text_boxes().iter().all(TextBox::is_idle));
    }

    #[test]
    fn topmost_box_wins() {
        let mut page = Page::new(1, "p.png");
        page.text_boxes = vec![
            TextBox::new("under", 0.0, 0.0, 100.0, 100.0),
            TextBox::new("over", 50.0, 50.0, 100.0, 100.0),
        ];
        let over = page.text_boxes[1].key;
        let ed = Editor::new(DocumentStore::from_pages(vec![page]), EditorConfig::default());
        assert_eq!(ed.hit_test(Point::new(75.0, 75.0)), Hit::TextBox(over));
    }

    #[test]
    fn drag_commits_only_on_release() {
        let (mut ed, a, _) = editor();
        send(&mut ed, PointerKind::Down, 110.0, 110.0);
        send(&mut ed, PointerKind::Move, 130.0, 150.0);
        send(&mut ed, PointerKind::Move, 160.0, 170.0);
        assert_eq!((find(&ed, a).x, find(&ed, a).y), (100.0, 100.0));
        let preview = ed.preview().unwrap();
        assert_eq!((preview.x, preview.y), (150.0, 160.0));
        send(&mut ed, PointerKind::Up, 160.0, 170.0);
        assert_eq!((find(&ed, a).x, find(&ed, a).y), (150.0, 160.0));
        assert!(ed.preview().is_none());
    }

    #[test]
    fn click_toggles_transform_and_double_click_edits() {
        let (mut ed, a, _) = editor();
        send(&mut ed, PointerKind::Down, 150.0, 120.0);
        send(&mut ed, PointerKind::Up, 150.0, 120.0);
        send(&mut ed, PointerKind::Click, 150.0, 120.0);
        assert!(find(&ed, a).is_transforming);
        send(&mut ed, PointerKind::Down, 150.0, 120.0);
        send(&mut ed, PointerKind::Up, 150.0, 120.0);
        send(&mut ed, PointerKind::Click, 150.0, 120.0);
        send(&mut ed, PointerKind::DoubleClick, 150.0, 120.0);
        let b = find(&ed, a);
        assert!(b.is_editing);
        assert!(!b.is_transforming);
        assert!(b.is_selected);
    }

    #[test]
    fn right_handle_resize_clamps_and_commits() {
        let (mut ed, a, _) = editor();
        ed.toggle_transform(a);
        assert_eq!(
            ed.hit_test(Point::new(200.0, 120.0)),
            Hit::Handle(a, ResizeHandle::Right)
        );
        send(&mut ed, PointerKind::Down, 200.0, 120.0);
        send(&mut ed, PointerKind::Move, 110.0, 120.0);
        assert_eq!(find(&ed, a).width, 100.0);
        assert_eq!(ed.preview().unwrap().width, MIN_TEXT_BOX_WIDTH);
        send(&mut ed, PointerKind::Up, 110.0, 120.0);
        let b = find(&ed, a);
        assert_eq!(b.width, MIN_TEXT_BOX_WIDTH);
        assert_eq!(b.x, 100.0);
        assert_eq!(b.height, 40.0);
    }

    #[test]
    fn left_handle_resize_moves_the_left_edge() {
        let (mut ed, a, _) = editor();
        ed.toggle_transform(a);
        send(&mut ed, PointerKind::Down, 100.0, 120.0);
        send(&mut ed, PointerKind::Move, 80.0, 120.0);
        send(&mut ed, PointerKind::Up, 80.0, 120.0);
        let b = find(&ed, a);
        assert_eq!(b.x, 80.0);
        assert_eq!(b.width, 120.0);
        assert!(b.is_transforming);
    }

    #[test]
    fn paint_mode_routes_to_strokes_only() {
        let (mut ed, a, b) = editor();
        ed.set_paint_mode(true);
        send(&mut ed, PointerKind::Down, 150.0, 120.0);
        send(&mut ed, PointerKind::Move, 160.0, 125.0);
        send(&mut ed, PointerKind::Move, 170.0, 130.0);
        send(&mut ed, PointerKind::Up, 170.0, 130.0);
        send(&mut ed, PointerKind::Click, 150.0, 120.0);
        send(&mut ed, PointerKind::DoubleClick, 150.0, 120.0);
        assert!(find(&ed, a).is_idle());
        assert!(find(&ed, b).is_idle());
        let lines = &ed.selected_page().unwrap().lines;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].points, vec![150.0, 120.0, 160.0, 125.0, 170.0, 130.0]);
        assert!(!ed.is_drawing());
    }

    #[test]
    fn moves_without_press_do_not_paint() {
        let (mut ed, _, _) = editor();
        ed.set_paint_mode(true);
        send(&mut ed, PointerKind::Move, 10.0, 10.0);
        send(&mut ed, PointerKind::Up, 10.0, 10.0);
        assert!(ed.selected_page().unwrap().lines.is_empty());
    }

    #[test]
    fn escape_and_enter_end_editing() {
        let (mut ed, a, _) = editor();
        ed.toggle_edit(a);
        assert!(!ed.handle_key(KeyEvent::new(KeyKind::Enter, true)));
        assert!(!ed.handle_key(KeyEvent::new(KeyKind::Other, false)));
        assert!(find(&ed, a).is_editing);
        assert!(ed.handle_key(KeyEvent::new(KeyKind::Enter, false)));
        assert!(!find(&ed, a).is_editing);
        assert!(find(&ed, a).is_selected);
        ed.toggle_edit(a);
        assert!(ed.handle_key(KeyEvent::new(KeyKind::Escape, false)));
        assert!(!find(&ed, a).is_editing);
        assert!(!ed.handle_key(KeyEvent::new(KeyKind::Escape, false)));
    }

    #[test]
    fn switching_page_drops_gesture() {
        let (mut ed, a, _) = editor();
        send(&mut ed, PointerKind::Down, 110.0, 110.0);
        send(&mut ed, PointerKind::Move, 300.0, 300.0);
        let first = ed.document().pages[0].key;
        ed.add_page("next.png");
        ed.select_page(first).unwrap();
        send(&mut ed, PointerKind::Up, 300.0, 300.0);
        assert_eq!(find(&ed, a).x, 100.0);
    }
}
