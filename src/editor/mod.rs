pub mod drag;
pub mod envelope;
mod state;
pub mod waveform;

pub use drag::{DragController, PointerButton, PointerEvent};
pub use envelope::{EnvelopeEditor, Pos};
pub use state::{EditorState, EditorUpdate};

use crate::instrument::automation::Automation;

// A mounted editor surface: handle geometry plus the gesture in flight
pub struct EditorView {
    pub envelope: EnvelopeEditor,
    drag: DragController,
}

impl EditorView {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            envelope: EnvelopeEditor::new(width, height),
            drag: DragController::new(),
        }
    }

    pub fn dragging(&self) -> Option<usize> {
        self.drag.active()
    }

    pub fn pointer(&mut self, event: PointerEvent, state: &mut EditorState, automation: &mut Automation) -> bool {
        self.drag.handle(event, &mut self.envelope, state, automation)
    }

    pub fn release(&mut self, state: &mut EditorState, automation: &mut Automation) {
        self.drag.release(&mut self.envelope, state, automation);
    }
}
