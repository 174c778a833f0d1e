//! Text box state transitions for one page's box list.
//!
//! Every operation takes the page's boxes and the target key, and returns
//! whether the key was found. Unknown keys leave the list untouched.

use crate::model::{BoxKey, MIN_TEXT_BOX_WIDTH, TextBox};

fn index_of(boxes: &[TextBox], key: BoxKey) -> Option<usize> {
    boxes.iter().position(|b| b.key == key)
}

fn make_idle(b: &mut TextBox) {
    b.is_selected = false;
    b.is_editing = false;
    b.is_transforming = false;
}

fn demote_others(boxes: &mut [TextBox], keep: usize) {
    for (i, b) in boxes.iter_mut().enumerate() {
        if i != keep {
            make_idle(b);
        }
    }
}

/// Selects `key`, keeping its editing/transforming sub-state. Every other box
/// goes idle.
pub fn select(boxes: &mut [TextBox], key: BoxKey) -> bool {
    let Some(idx) = index_of(boxes, key) else {
        return false;
    };
    demote_others(boxes, idx);
    boxes[idx].is_selected = true;
    true
}

/// Flips edit mode on `key`.
/// Entering edit mode idles every other box on the page.
pub fn toggle_edit(boxes: &mut [TextBox], key: BoxKey) -> bool {
    let Some(idx) = index_of(boxes, key) else {
        return false;
    };
    if !boxes[idx].is_editing {
        demote_others(boxes, idx);
    }
    let b = &mut boxes[idx];
    b.is_editing = !b.is_editing;
    b.is_transforming = false;
    b.is_selected = true;
    true
}

/// Flips transform mode on `key`.
/// Entering transform mode idles every other box on the page.
pub fn toggle_transform(boxes: &mut [TextBox], key: BoxKey) -> bool {
    let Some(idx) = index_of(boxes, key) else {
        return false;
    };
    if !boxes[idx].is_transforming {
        demote_others(boxes, idx);
    }
    let b = &mut boxes[idx];
    b.is_transforming = !b.is_transforming;
    b.is_editing = false;
    b.is_selected = true;
    true
}

pub fn deselect_all(boxes: &mut [TextBox]) {
    boxes.iter_mut().for_each(make_idle);
}

pub fn change_text(boxes: &mut [TextBox], key: BoxKey, text: &str) -> bool {
    let Some(idx) = index_of(boxes, key) else {
        return false;
    };
    boxes[idx].text = text.to_string();
    true
}

/// Stores new geometry. The width floor is applied here, never reported.
pub fn resize(boxes: &mut [TextBox], key: BoxKey, width: f32, height: f32) -> bool {
    let Some(idx) = index_of(boxes, key) else {
        return false;
    };
    let b = &mut boxes[idx];
    b.width = width.max(MIN_TEXT_BOX_WIDTH);
    b.height = height.max(0.0);
    true
}

pub fn drag_end(boxes: &mut [TextBox], key: BoxKey, x: f32, y: f32) -> bool {
    let Some(idx) = index_of(boxes, key) else {
        return false;
    };
    boxes[idx].x = x;
    boxes[idx].y = y;
    true
}

/// Leaves edit mode on whichever box is editing and returns its key.
pub fn commit_edit(boxes: &mut [TextBox]) -> Option<BoxKey> {
    let key = editing_key(boxes)?;
    toggle_edit(boxes, key);
    Some(key)
}

pub fn selected_key(boxes: &[TextBox]) -> Option<BoxKey> {
    boxes.iter().find(|b| b.is_selected).map(|b| b.key)
}

pub fn editing_key(boxes: &[TextBox]) -> Option<BoxKey> {
    boxes.iter().find(|b| b.is_editing).map(|b| b.key)
}

/// Selects the first box when nothing is selected. Returns the key it
/// selected, if any.
pub fn select_first_if_none(boxes: &mut [TextBox]) -> Option<BoxKey> {
    if selected_key(boxes).is_some() {
        return None;
    }
    let key = boxes.first()?.key;
    select(boxes, key);
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(n: usize) -> Vec<TextBox> {
        (0..n)
            .map(|i| TextBox::new(format!("box {i}"), i as f32 * 100.0, 0.0, 80.0, 40.0))
            .collect()
    }

    fn assert_invariants(boxes: &[TextBox]) {
        assert!(boxes.iter().filter(|b| b.is_editing).count() <= 1);
        assert!(boxes.iter().filter(|b| b.is_transforming).count() <= 1);
        for b in boxes {
            if b.is_editing || b.is_transforming {
                assert!(b.is_selected);
            }
            assert!(!(b.is_editing && b.is_transforming));
        }
    }

    #[test]
    fn select_idles_everything_else() {
        let mut bs = boxes(3);
        let (a, b) = (bs[0].key, bs[1].key);
        toggle_edit(&mut bs, a);
        assert!(select(&mut bs, b));
        assert!(bs[0].is_idle());
        assert!(bs[1].is_selected);
        assert!(!bs[1].is_editing);
        assert_invariants(&bs);
    }

    #[test]
    fn select_keeps_own_sub_state() {
        let mut bs = boxes(2);
        let a = bs[0].key;
        toggle_transform(&mut bs, a);
        select(&mut bs, a);
        assert!(bs[0].is_transforming);
        assert!(bs[0].is_selected);
    }

    #[test]
    fn toggle_edit_twice_is_identity() {
        let mut bs = boxes(2);
        let a = bs[0].key;
        select(&mut bs, a);
        let before = bs[0].clone();
        toggle_edit(&mut bs, a);
        assert!(bs[0].is_editing);
        toggle_edit(&mut bs, a);
        assert_eq!(bs[0].is_editing, before.is_editing);
        assert_eq!(bs[0].text, before.text);
    }

    #[test]
    fn edit_and_transform_are_exclusive() {
        let mut bs = boxes(1);
        let a = bs[0].key;
        toggle_transform(&mut bs, a);
        assert!(bs[0].is_transforming);
        toggle_edit(&mut bs, a);
        assert!(bs[0].is_editing);
        assert!(!bs[0].is_transforming);
        toggle_transform(&mut bs, a);
        assert!(!bs[0].is_editing);
        assert!(bs[0].is_transforming);
    }

    #[test]
    fn entering_edit_on_second_box_clears_first() {
        let mut bs = boxes(2);
        let (a, b) = (bs[0].key, bs[1].key);
        toggle_edit(&mut bs, a);
        toggle_edit(&mut bs, b);
        assert!(bs[0].is_idle());
        assert!(bs[1].is_editing);
        toggle_transform(&mut bs, a);
        assert!(bs[1].is_idle());
        assert_invariants(&bs);
    }

    #[test]
    fn deselect_all_clears_editing_box() {
        let mut bs = boxes(2);
        let a = bs[0].key;
        toggle_edit(&mut bs, a);
        deselect_all(&mut bs);
        assert!(bs.iter().all(TextBox::is_idle));
    }

    #[test]
    fn resize_clamps_width_floor_only() {
        let mut bs = boxes(1);
        let a = bs[0].key;
        resize(&mut bs, a, 10.0, 20.0);
        assert_eq!(bs[0].width, 30.0);
        assert_eq!(bs[0].height, 20.0);
        resize(&mut bs, a, 50.0, 20.0);
        assert_eq!(bs[0].width, 50.0);
        resize(&mut bs, a, 5000.0, 20.0);
        assert_eq!(bs[0].width, 5000.0);
    }

    #[test]
    fn change_text_keeps_flags() {
        let mut bs = boxes(1);
        let a = bs[0].key;
        toggle_edit(&mut bs, a);
        assert!(change_text(&mut bs, a, "hello"));
        assert_eq!(bs[0].text, "hello");
        assert!(bs[0].is_editing);
    }

    #[test]
    fn drag_end_moves_box() {
        let mut bs = boxes(1);
        let a = bs[0].key;
        drag_end(&mut bs, a, 12.0, 34.0);
        assert_eq!((bs[0].x, bs[0].y), (12.0, 34.0));
    }

    #[test]
    fn unknown_key_is_a_no_op() {
        let mut bs = boxes(2);
        let before = bs.clone();
        let ghost = BoxKey::new();
        assert!(!select(&mut bs, ghost));
        assert!(!toggle_edit(&mut bs, ghost));
        assert!(!toggle_transform(&mut bs, ghost));
        assert!(!change_text(&mut bs, ghost, "x"));
        assert!(!resize(&mut bs, ghost, 1.0, 1.0));
        assert!(!drag_end(&mut bs, ghost, 1.0, 1.0));
        assert_eq!(bs, before);
    }

    #[test]
    fn commit_edit_returns_to_selected() {
        let mut bs = boxes(2);
        let b = bs[1].key;
        toggle_edit(&mut bs, b);
        assert_eq!(commit_edit(&mut bs), Some(b));
        assert!(bs[1].is_selected);
        assert!(!bs[1].is_editing);
        assert_eq!(commit_edit(&mut bs), None);
    }

    #[test]
    fn first_box_is_selected_only_when_nothing_is() {
        let mut bs = boxes(3);
        let first = bs[0].key;
        assert_eq!(select_first_if_none(&mut bs), Some(first));
        let third = bs[2].key;
        select(&mut bs, third);
        assert_eq!(select_first_if_none(&mut bs), None);
        assert!(bs[2].is_selected);
        assert_eq!(select_first_if_none(&mut []), None);
    }

    #[test]
    fn invariants_hold_over_mixed_sequences() {
        let mut bs = boxes(4);
        let keys: Vec<BoxKey> = bs.iter().map(|b| b.key).collect();
        for step in 0..64usize {
            let k = keys[(step * 7 + 3) % keys.len()];
            match step % 5 {
                0 => {
                    select(&mut bs, k);
                }
                1 => {
                    toggle_edit(&mut bs, k);
                }
                2 => {
                    toggle_transform(&mut bs, k);
                }
                3 => {
                    resize(&mut bs, k, step as f32, 10.0);
                }
                _ => {
                    if step % 3 == 0 {
                        deselect_all(&mut bs);
                    }
                }
            }
            assert_invariants(&bs);
        }
    }
}
