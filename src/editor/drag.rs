// Pointer gestures for the envelope handles. Positions are editor-local.
// A press only grabs with the left button; once grabbed, every move and the
// next release are ours no matter where the pointer is.

use crate::instrument::automation::Automation;
use super::envelope::{EnvelopeEditor, Pos};
use super::state::EditorState;

// how close (editor units) a press has to land to grab a handle
pub const GRAB_RADIUS: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { button: PointerButton, pos: Pos },
    Move { pos: Pos },
    Up { pos: Pos },
}

#[derive(Clone, Copy, Debug)]
struct Grab {
    index: usize,
    offset: Pos, // pointer minus handle at grab time
}

#[derive(Default)]
pub struct DragController {
    grab: Option<Grab>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<usize> {
        self.grab.map(|g| g.index)
    }

    // returns true if the event was consumed by a handle
    pub fn handle(
        &mut self,
        event: PointerEvent,
        editor: &mut EnvelopeEditor,
        state: &mut EditorState,
        automation: &mut Automation,
    ) -> bool {
        match (event, self.grab) {
            (PointerEvent::Down { button: PointerButton::Left, pos }, None) => {
                let Some(index) = editor.hit_test(pos, state, GRAB_RADIUS) else {
                    return false;
                };
                let handle = editor.point(index, state);
                if !editor.on_drag_start(index, state) {
                    return false;
                }
                self.grab = Some(Grab {
                    index,
                    offset: Pos::new(pos.x - handle.x, pos.y - handle.y),
                });
                true
            }
            (PointerEvent::Move { pos }, Some(grab)) => {
                let raw = Pos::new(pos.x - grab.offset.x, pos.y - grab.offset.y);
                editor.on_drag_move(grab.index, raw, state).is_some()
            }
            (PointerEvent::Up { .. }, Some(grab)) => {
                self.grab = None;
                editor.on_drag_end(grab.index, state, automation)
            }
            _ => false,
        }
    }

    // end whatever is in flight, as if the pointer had been released
    pub fn release(&mut self, editor: &mut EnvelopeEditor, state: &mut EditorState, automation: &mut Automation) {
        if let Some(grab) = self.grab.take() {
            editor.on_drag_end(grab.index, state, automation);
        }
    }
}
