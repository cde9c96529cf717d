//! The annotation canvas controller.
//!
//! Owns the working box list for one analysis result and runs the pointer
//! interaction state machine: drag-to-draw on empty canvas, drag-to-move on
//! a box body, drag-to-resize on a corner handle of the selected box. All
//! positions passed in are image-pixel coordinates; the canvas layer does
//! the surface-to-image conversion before calling in.

use egui::Pos2;

use crate::history::History;
use crate::model::{
    AnnotationBox, BoxAction, BoxId, FaultType, LocalIdGen, Provenance, Rect, MIN_BOX_SIZE,
};

/// Drawn size of a corner handle, image pixels.
pub const HANDLE_SIZE: f32 = 8.0;
/// Hit tolerance around a corner; the hit region is larger than the drawn
/// handle so grabbing a corner does not demand pixel precision.
pub const HANDLE_TOLERANCE: f32 = 6.0;

// ── Handles ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    NorthWest,
    NorthEast,
    SouthEast,
    SouthWest,
}

impl Handle {
    pub const ALL: [Handle; 4] = [
        Handle::NorthWest,
        Handle::NorthEast,
        Handle::SouthEast,
        Handle::SouthWest,
    ];

    pub fn corner_of(&self, rect: &Rect) -> Pos2 {
        match self {
            Handle::NorthWest => Pos2::new(rect.x, rect.y),
            Handle::NorthEast => Pos2::new(rect.right(), rect.y),
            Handle::SouthEast => Pos2::new(rect.right(), rect.bottom()),
            Handle::SouthWest => Pos2::new(rect.x, rect.bottom()),
        }
    }

    pub fn cursor(&self) -> Cursor {
        match self {
            Handle::NorthWest | Handle::SouthEast => Cursor::ResizeNwSe,
            Handle::NorthEast | Handle::SouthWest => Cursor::ResizeNeSw,
        }
    }
}

/// Hover affordance reported to the host so it can set the mouse cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
    Crosshair,
    Move,
    ResizeNwSe,
    ResizeNeSw,
}

// ── Interaction state ───────────────────────────────────────────────────────

/// States are mutually exclusive; `Pressed` is the press-on-a-box state
/// before any movement decides between a move and a resize gesture.
#[derive(Clone, Copy, Debug)]
enum DragState {
    Idle,
    Drawing {
        anchor: Pos2,
        current: Pos2,
    },
    Pressed {
        start: Pos2,
        handle: Option<Handle>,
        original: Rect,
    },
    Moving {
        start: Pos2,
        original: Rect,
    },
    Resizing {
        start: Pos2,
        handle: Handle,
        original: Rect,
    },
}

// ── Controller ──────────────────────────────────────────────────────────────

pub struct EditorSession {
    boxes: Vec<AnnotationBox>,
    overall_comments: String,
    image_size: (f32, f32),
    selected: Option<BoxId>,
    default_type: FaultType,
    drag: DragState,
    history: History,
    ids: LocalIdGen,
}

impl EditorSession {
    pub fn new(
        initial: Vec<AnnotationBox>,
        overall_comments: String,
        image_size: (f32, f32),
        history_limit: usize,
    ) -> Self {
        let history = History::new(initial.clone(), history_limit);
        Self {
            boxes: initial,
            overall_comments,
            image_size,
            selected: None,
            default_type: FaultType::LooseJoint,
            drag: DragState::Idle,
            history,
            ids: LocalIdGen::new(),
        }
    }

    pub fn boxes(&self) -> &[AnnotationBox] {
        &self.boxes
    }

    pub fn overall_comments(&self) -> &str {
        &self.overall_comments
    }

    pub fn overall_comments_mut(&mut self) -> &mut String {
        &mut self.overall_comments
    }

    pub fn default_type(&self) -> FaultType {
        self.default_type
    }

    pub fn default_type_mut(&mut self) -> &mut FaultType {
        &mut self.default_type
    }

    pub fn selected_id(&self) -> Option<BoxId> {
        self.selected
    }

    pub fn selected_box(&self) -> Option<&AnnotationBox> {
        self.selected.and_then(|id| self.find(id))
    }

    pub fn user_added_count(&self) -> usize {
        self.boxes.iter().filter(|b| b.is_user_added()).count()
    }

    pub fn detected_count(&self) -> usize {
        self.boxes.len() - self.user_added_count()
    }

    /// The candidate rectangle while a draw gesture is in progress.
    pub fn drawing_preview(&self) -> Option<Rect> {
        match self.drag {
            DragState::Drawing { anchor, current } => Some(Rect::from_corners(anchor, current)),
            _ => None,
        }
    }

    // ── Pointer gestures ────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, pos: Pos2) {
        let pos = self.clamp_pos(pos);
        // Handles of the selected box win over body hit-testing, so grabbing
        // a corner never reselects an overlapping neighbor.
        if let Some(rect) = self.selected.and_then(|id| self.rect_of(id)) {
            if let Some(handle) = handle_at(&rect, pos) {
                self.drag = DragState::Pressed {
                    start: pos,
                    handle: Some(handle),
                    original: rect,
                };
                return;
            }
        }

        if let Some(id) = self.hit_test(pos) {
            if let Some(original) = self.rect_of(id) {
                self.selected = Some(id);
                self.drag = DragState::Pressed {
                    start: pos,
                    handle: None,
                    original,
                };
            }
        } else {
            self.selected = None;
            self.drag = DragState::Drawing {
                anchor: pos,
                current: pos,
            };
        }
    }

    pub fn pointer_moved(&mut self, pos: Pos2) {
        let pos = self.clamp_pos(pos);
        match self.drag {
            DragState::Idle => {}
            DragState::Drawing { anchor, .. } => {
                self.drag = DragState::Drawing {
                    anchor,
                    current: pos,
                };
            }
            DragState::Pressed {
                start,
                handle,
                original,
            } => {
                if pos != start {
                    match handle {
                        Some(handle) => {
                            self.drag = DragState::Resizing {
                                start,
                                handle,
                                original,
                            };
                            self.apply_resize(handle, start, original, pos);
                        }
                        None => {
                            self.drag = DragState::Moving { start, original };
                            self.apply_move(start, original, pos);
                        }
                    }
                }
            }
            DragState::Moving { start, original } => self.apply_move(start, original, pos),
            DragState::Resizing {
                start,
                handle,
                original,
            } => self.apply_resize(handle, start, original, pos),
        }
    }

    pub fn pointer_up(&mut self) {
        match self.drag {
            DragState::Drawing { anchor, current } => {
                let candidate = Rect::from_corners(anchor, current);
                // accidental clicks produce tiny candidates; discard silently
                if candidate.width > MIN_BOX_SIZE && candidate.height > MIN_BOX_SIZE {
                    let rect = candidate.clamp_to(self.image_size, MIN_BOX_SIZE);
                    let id = self.ids.next();
                    self.boxes.push(AnnotationBox {
                        id,
                        rect,
                        fault_type: self.default_type,
                        provenance: Provenance::Manual,
                        action: BoxAction::Added,
                        comments: String::new(),
                    });
                    self.push_history();
                }
            }
            DragState::Moving { .. } | DragState::Resizing { .. } => {
                self.push_history();
            }
            DragState::Pressed { .. } | DragState::Idle => {}
        }
        self.drag = DragState::Idle;
    }

    /// Press-and-release without movement: selection or deselection only.
    pub fn click(&mut self, pos: Pos2) {
        self.pointer_down(pos);
        self.pointer_up();
    }

    pub fn hover_cursor(&self, pos: Pos2) -> Cursor {
        match self.drag {
            DragState::Drawing { .. } => Cursor::Crosshair,
            DragState::Moving { .. } => Cursor::Move,
            DragState::Resizing { handle, .. } => handle.cursor(),
            DragState::Pressed { handle, .. } => {
                handle.map(|h| h.cursor()).unwrap_or(Cursor::Move)
            }
            DragState::Idle => {
                if let Some(rect) = self.selected.and_then(|id| self.rect_of(id)) {
                    if let Some(handle) = handle_at(&rect, pos) {
                        return handle.cursor();
                    }
                }
                if self.hit_test(pos).is_some() {
                    Cursor::Move
                } else {
                    Cursor::Crosshair
                }
            }
        }
    }

    // ── Operations outside drag gestures ────────────────────────────────────

    /// Selection is not an undoable action; no history push.
    pub fn select(&mut self, id: BoxId) {
        if self.find(id).is_some() {
            self.selected = Some(id);
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        self.boxes.retain(|b| b.id != id);
        self.selected = None;
        self.push_history();
        true
    }

    pub fn retype_selected(&mut self, fault_type: FaultType) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        let Some(b) = self.boxes.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        b.fault_type = fault_type;
        b.mark_modified();
        self.push_history();
        true
    }

    /// Comment edits are not undoable steps; only geometric, structural, and
    /// type changes are.
    pub fn set_comment(&mut self, id: BoxId, text: String) {
        if let Some(b) = self.boxes.iter_mut().find(|b| b.id == id) {
            b.comments = text;
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.boxes = snapshot;
                self.selected = None;
                self.drag = DragState::Idle;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.boxes = snapshot;
                self.selected = None;
                self.drag = DragState::Idle;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Internals ───────────────────────────────────────────────────────────

    /// The canvas may extend past the displayed image; gestures only ever
    /// see image coordinates.
    fn clamp_pos(&self, pos: Pos2) -> Pos2 {
        Pos2::new(
            pos.x.clamp(0.0, self.image_size.0),
            pos.y.clamp(0.0, self.image_size.1),
        )
    }

    /// Topmost box wins: later entries draw on top and are hit-tested first.
    fn hit_test(&self, pos: Pos2) -> Option<BoxId> {
        self.boxes
            .iter()
            .rev()
            .find(|b| b.rect.contains(pos))
            .map(|b| b.id)
    }

    fn find(&self, id: BoxId) -> Option<&AnnotationBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    fn rect_of(&self, id: BoxId) -> Option<Rect> {
        self.find(id).map(|b| b.rect)
    }

    /// Geometry is recomputed from the press-time snapshot plus the
    /// cumulative delta, so repeated motion events cannot accumulate drift.
    fn apply_move(&mut self, start: Pos2, original: Rect, pos: Pos2) {
        let moved = original
            .translated(pos - start)
            .clamp_to(self.image_size, MIN_BOX_SIZE);
        self.update_selected_rect(moved);
    }

    fn apply_resize(&mut self, handle: Handle, start: Pos2, original: Rect, pos: Pos2) {
        let dx = pos.x - start.x;
        let dy = pos.y - start.y;

        // Each corner anchors the opposite corner and adjusts its two axes.
        let (mut x, mut y, mut width, mut height) = match handle {
            Handle::NorthWest => (
                original.x + dx,
                original.y + dy,
                original.width - dx,
                original.height - dy,
            ),
            Handle::NorthEast => (
                original.x,
                original.y + dy,
                original.width + dx,
                original.height - dy,
            ),
            Handle::SouthEast => (
                original.x,
                original.y,
                original.width + dx,
                original.height + dy,
            ),
            Handle::SouthWest => (
                original.x + dx,
                original.y,
                original.width - dx,
                original.height + dy,
            ),
        };

        // Pin the dragged edge at minimum size so the anchored corner never
        // moves while the box bottoms out.
        if width < MIN_BOX_SIZE {
            if matches!(handle, Handle::NorthWest | Handle::SouthWest) {
                x = original.right() - MIN_BOX_SIZE;
            }
            width = MIN_BOX_SIZE;
        }
        if height < MIN_BOX_SIZE {
            if matches!(handle, Handle::NorthWest | Handle::NorthEast) {
                y = original.bottom() - MIN_BOX_SIZE;
            }
            height = MIN_BOX_SIZE;
        }

        let resized = Rect::new(x, y, width, height).clamp_to(self.image_size, MIN_BOX_SIZE);
        self.update_selected_rect(resized);
    }

    fn update_selected_rect(&mut self, rect: Rect) {
        let Some(id) = self.selected else {
            return;
        };
        if let Some(b) = self.boxes.iter_mut().find(|b| b.id == id) {
            b.rect = rect;
            b.mark_modified();
        }
    }

    fn push_history(&mut self) {
        self.history.push(self.boxes.clone());
    }
}

fn handle_at(rect: &Rect, pos: Pos2) -> Option<Handle> {
    Handle::ALL.into_iter().find(|handle| {
        let corner = handle.corner_of(rect);
        (pos.x - corner.x).abs() <= HANDLE_TOLERANCE && (pos.y - corner.y).abs() <= HANDLE_TOLERANCE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    const IMAGE: (f32, f32) = (800.0, 600.0);

    fn detected(id: i64, x: f32, y: f32, w: f32, h: f32, confidence: f64) -> AnnotationBox {
        AnnotationBox {
            id: BoxId::Server(id),
            rect: Rect::new(x, y, w, h),
            fault_type: FaultType::PointOverload,
            provenance: Provenance::Detected { confidence },
            action: BoxAction::Unchanged,
            comments: String::new(),
        }
    }

    fn session(initial: Vec<AnnotationBox>) -> EditorSession {
        EditorSession::new(initial, String::new(), IMAGE, 100)
    }

    fn drag(session: &mut EditorSession, from: Pos2, to: Pos2) {
        session.pointer_down(from);
        session.pointer_moved(to);
        session.pointer_up();
    }

    #[test]
    fn test_draw_commits_normalized_box() {
        let mut s = session(Vec::new());
        drag(&mut s, pos2(100.0, 100.0), pos2(250.0, 220.0));

        assert_eq!(s.boxes().len(), 1);
        let b = &s.boxes()[0];
        assert_eq!(b.rect, Rect::new(100.0, 100.0, 150.0, 120.0));
        assert_eq!(b.action, BoxAction::Added);
        assert_eq!(b.provenance, Provenance::Manual);
        assert_eq!(b.fault_type, s.default_type());
        assert!(matches!(b.id, BoxId::Local(_)));
    }

    #[test]
    fn test_draw_in_reverse_direction_commits_same_box() {
        let mut s = session(Vec::new());
        drag(&mut s, pos2(250.0, 220.0), pos2(100.0, 100.0));
        assert_eq!(s.boxes()[0].rect, Rect::new(100.0, 100.0, 150.0, 120.0));
    }

    #[test]
    fn test_tiny_draw_is_discarded_without_history_push() {
        let mut s = session(Vec::new());
        drag(&mut s, pos2(100.0, 100.0), pos2(108.0, 130.0));

        assert!(s.boxes().is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_click_on_empty_canvas_deselects_only() {
        let mut s = session(vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.9)]);
        s.select(BoxId::Server(1));
        s.click(pos2(700.0, 500.0));

        assert!(s.selected_id().is_none());
        assert_eq!(s.boxes().len(), 1);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_click_selects_without_history_push() {
        let mut s = session(vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.9)]);
        s.click(pos2(90.0, 70.0));

        assert_eq!(s.selected_id(), Some(BoxId::Server(1)));
        assert!(!s.can_undo());
    }

    #[test]
    fn test_deselect_clears_selection_only() {
        let mut s = session(vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.9)]);
        s.select(BoxId::Server(1));
        s.deselect();

        assert!(s.selected_id().is_none());
        assert_eq!(s.boxes().len(), 1);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_overlap_selects_topmost() {
        let mut s = session(vec![
            detected(1, 100.0, 100.0, 200.0, 200.0, 0.8),
            detected(2, 150.0, 150.0, 200.0, 200.0, 0.7),
        ]);
        s.click(pos2(200.0, 200.0));
        assert_eq!(s.selected_id(), Some(BoxId::Server(2)));
    }

    #[test]
    fn test_move_translates_from_press_snapshot() {
        let mut s = session(vec![detected(1, 100.0, 100.0, 50.0, 40.0, 0.9)]);
        s.pointer_down(pos2(120.0, 110.0));
        s.pointer_moved(pos2(130.0, 115.0));
        s.pointer_moved(pos2(150.0, 140.0));
        s.pointer_up();

        let b = &s.boxes()[0];
        assert_eq!(b.rect, Rect::new(130.0, 130.0, 50.0, 40.0));
        assert_eq!(b.action, BoxAction::Modified);
        assert!(s.can_undo());
    }

    #[test]
    fn test_move_clamps_to_image_bounds() {
        let mut s = session(vec![detected(1, 700.0, 500.0, 80.0, 60.0, 0.9)]);
        drag(&mut s, pos2(740.0, 530.0), pos2(1400.0, 1000.0));

        let b = &s.boxes()[0];
        assert_eq!(b.rect, Rect::new(720.0, 540.0, 80.0, 60.0));
    }

    #[test]
    fn test_southeast_resize_keeps_origin_and_added_action() {
        let mut s = session(Vec::new());
        drag(&mut s, pos2(100.0, 100.0), pos2(250.0, 220.0));
        s.select(s.boxes()[0].id);

        // grab the SE corner and drag by (+50, +30)
        drag(&mut s, pos2(250.0, 220.0), pos2(300.0, 250.0));

        let b = &s.boxes()[0];
        assert_eq!(b.rect, Rect::new(100.0, 100.0, 200.0, 150.0));
        assert_eq!(b.action, BoxAction::Added);
    }

    #[test]
    fn test_northwest_resize_anchors_opposite_corner() {
        let mut s = session(vec![detected(1, 100.0, 100.0, 100.0, 80.0, 0.9)]);
        s.select(BoxId::Server(1));
        drag(&mut s, pos2(100.0, 100.0), pos2(80.0, 60.0));

        let b = &s.boxes()[0];
        assert_eq!(b.rect, Rect::new(80.0, 60.0, 120.0, 120.0));
        assert_eq!(b.action, BoxAction::Modified);
    }

    #[test]
    fn test_resize_below_minimum_pins_dragged_edge() {
        let mut s = session(vec![detected(1, 100.0, 100.0, 100.0, 80.0, 0.9)]);
        s.select(BoxId::Server(1));
        // drag the NW corner past the SE corner
        drag(&mut s, pos2(100.0, 100.0), pos2(500.0, 400.0));

        let b = &s.boxes()[0];
        assert_eq!(b.rect.width, MIN_BOX_SIZE);
        assert_eq!(b.rect.height, MIN_BOX_SIZE);
        assert_eq!(b.rect.right(), 200.0);
        assert_eq!(b.rect.bottom(), 180.0);
    }

    #[test]
    fn test_handle_beats_overlapping_box_body() {
        // box 2 is on top and covers box 1's SE corner area
        let mut s = session(vec![
            detected(1, 100.0, 100.0, 100.0, 100.0, 0.8),
            detected(2, 180.0, 180.0, 100.0, 100.0, 0.7),
        ]);
        s.select(BoxId::Server(1));
        drag(&mut s, pos2(200.0, 200.0), pos2(230.0, 230.0));

        // the SE handle of box 1 was grabbed, not box 2's body
        assert_eq!(s.boxes()[0].rect, Rect::new(100.0, 100.0, 130.0, 130.0));
        assert_eq!(s.boxes()[1].rect, Rect::new(180.0, 180.0, 100.0, 100.0));
        assert_eq!(s.selected_id(), Some(BoxId::Server(1)));
    }

    #[test]
    fn test_retype_marks_modified_but_keeps_confidence() {
        let mut s = session(vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.83)]);
        s.select(BoxId::Server(1));
        assert!(s.retype_selected(FaultType::TinyFaultySpot));

        let b = &s.boxes()[0];
        assert_eq!(b.fault_type, FaultType::TinyFaultySpot);
        assert_eq!(b.action, BoxAction::Modified);
        assert_eq!(b.provenance, Provenance::Detected { confidence: 0.83 });
        assert!(!b.is_user_added());
    }

    #[test]
    fn test_retype_without_selection_is_noop() {
        let mut s = session(vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.83)]);
        assert!(!s.retype_selected(FaultType::TinyFaultySpot));
        assert!(!s.can_undo());
    }

    #[test]
    fn test_delete_then_undo_restores_identical_box() {
        let mut s = session(vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.83)]);
        let before = s.boxes().to_vec();

        s.select(BoxId::Server(1));
        assert!(s.delete_selected());
        assert!(s.boxes().is_empty());
        assert!(s.selected_id().is_none());

        assert!(s.undo());
        assert_eq!(s.boxes(), before.as_slice());
        assert_eq!(s.boxes()[0].id, BoxId::Server(1));
    }

    #[test]
    fn test_undo_to_start_restores_loaded_state() {
        let initial = vec![
            detected(1, 50.0, 50.0, 100.0, 80.0, 0.83),
            detected(2, 300.0, 200.0, 60.0, 60.0, 0.61),
        ];
        let mut s = session(initial.clone());

        drag(&mut s, pos2(500.0, 400.0), pos2(600.0, 480.0));
        s.click(pos2(90.0, 70.0));
        s.retype_selected(FaultType::CustomAnomaly);
        s.select(BoxId::Server(2));
        s.delete_selected();

        while s.undo() {}
        assert_eq!(s.boxes(), initial.as_slice());
    }

    #[test]
    fn test_n_edits_then_n_undos_round_trip() {
        let initial = vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.83)];
        let mut s = session(initial.clone());

        drag(&mut s, pos2(400.0, 300.0), pos2(480.0, 380.0));
        drag(&mut s, pos2(90.0, 70.0), pos2(120.0, 100.0));
        s.select(BoxId::Server(1));
        s.retype_selected(FaultType::FullWireOverload);

        assert!(s.undo());
        assert!(s.undo());
        assert!(s.undo());
        assert_eq!(s.boxes(), initial.as_slice());
    }

    #[test]
    fn test_redo_restores_pre_undo_state() {
        let mut s = session(Vec::new());
        drag(&mut s, pos2(100.0, 100.0), pos2(250.0, 220.0));
        let after_draw = s.boxes().to_vec();

        assert!(s.undo());
        assert!(s.boxes().is_empty());
        assert!(s.redo());
        assert_eq!(s.boxes(), after_draw.as_slice());
    }

    #[test]
    fn test_new_edit_after_undo_discards_redo() {
        let mut s = session(Vec::new());
        drag(&mut s, pos2(100.0, 100.0), pos2(250.0, 220.0));
        drag(&mut s, pos2(400.0, 300.0), pos2(500.0, 400.0));

        assert!(s.undo());
        assert!(s.can_redo());

        drag(&mut s, pos2(600.0, 100.0), pos2(700.0, 200.0));
        assert!(!s.can_redo());
        assert!(!s.redo());
    }

    #[test]
    fn test_undo_clears_selection() {
        let mut s = session(Vec::new());
        drag(&mut s, pos2(100.0, 100.0), pos2(250.0, 220.0));
        let id = s.boxes()[0].id;
        s.select(id);

        assert!(s.undo());
        assert!(s.selected_id().is_none());
    }

    #[test]
    fn test_comment_edit_is_not_undoable() {
        let mut s = session(vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.83)]);
        s.set_comment(BoxId::Server(1), "check this joint".into());

        assert_eq!(s.boxes()[0].comments, "check this joint");
        assert_eq!(s.boxes()[0].action, BoxAction::Unchanged);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_hover_cursor_affordances() {
        let mut s = session(vec![detected(1, 100.0, 100.0, 100.0, 80.0, 0.9)]);
        assert_eq!(s.hover_cursor(pos2(500.0, 400.0)), Cursor::Crosshair);
        assert_eq!(s.hover_cursor(pos2(150.0, 140.0)), Cursor::Move);

        // handles only light up on the selected box
        assert_eq!(s.hover_cursor(pos2(100.0, 100.0)), Cursor::Move);
        s.select(BoxId::Server(1));
        assert_eq!(s.hover_cursor(pos2(100.0, 100.0)), Cursor::ResizeNwSe);
        assert_eq!(s.hover_cursor(pos2(200.0, 100.0)), Cursor::ResizeNeSw);
    }

    #[test]
    fn test_counts_follow_provenance() {
        let mut s = session(vec![detected(1, 50.0, 50.0, 100.0, 80.0, 0.83)]);
        drag(&mut s, pos2(300.0, 300.0), pos2(400.0, 380.0));

        assert_eq!(s.detected_count(), 1);
        assert_eq!(s.user_added_count(), 1);
    }

    #[test]
    fn test_drawn_box_is_clamped_to_image() {
        let mut s = session(Vec::new());
        drag(&mut s, pos2(750.0, 550.0), pos2(900.0, 700.0));

        let b = &s.boxes()[0];
        assert!(b.rect.right() <= IMAGE.0);
        assert!(b.rect.bottom() <= IMAGE.1);
    }
}
