// Types passed between the instrument, the input layer and the TUI.
//
// Keys:
//   1 2 3 4 / q w e r / a s d f / z x c v   play the 16 pads (lowest note bottom left)
//   , / .                                  octave down / up
//   [ / ]                                  sample note down / up
//   p                                      toggle resample / phase vocoder
//   mouse                                  drag the envelope handles
//   Esc                                    save and quit
//
// Each frame the TUI asks the instrument for a DisplayState and draws only
// that; all the state lives in the instrument.

use std::sync::Arc;

use crate::audio::SampleBuffer;
use crate::editor::{PointerEvent, Pos};
use crate::instrument::automation::PitchAlgorithm;

pub const NUM_PADS: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PadDown(u8), // index 0-15
    PadUp(u8),
    OctaveDown,
    OctaveUp,
    SampleNoteDown,
    SampleNoteUp,
    ToggleAlgorithm,
    Pointer(PointerEvent), // editor-local
    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub url: String,
    pub points: [f32; 4],
    pub handles: Option<[Pos; 4]>, // editor-local, when a view is mounted
    pub sample_note: u8,
    pub algorithm: PitchAlgorithm,
    pub holding: bool,
    pub dragging: Option<usize>,
    pub buffer: Option<Arc<SampleBuffer>>,
    pub loading: bool,
    pub voices_triggered: u64,
}

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

// 60 -> "C4"
pub fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[note as usize % 12], octave)
}
