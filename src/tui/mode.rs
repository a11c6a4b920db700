use ratatui::layout::Rect;

use crate::editor::waveform::WaveformCache;
use crate::shared::NUM_PADS;

// how many frames a pad stays lit after being hit
pub const PAD_FLASH_FRAMES: u8 = 8;

// state local to tui: where the editor was drawn, the pad octave and
// which pads are lit. the instrument never sees any of this
pub struct TuiState {
    pub base_note: u8,
    pub editor_area: Option<Rect>, // inner canvas area from the last frame
    pub pad_flash: [u8; NUM_PADS],
    pub waveform: WaveformCache,
}

impl TuiState {
    pub fn new(base_note: u8) -> Self {
        Self {
            base_note: base_note.min(127 - (NUM_PADS as u8 - 1)),
            editor_area: None,
            pad_flash: [0; NUM_PADS],
            waveform: WaveformCache::default(),
        }
    }

    // pads count up from the bottom left, like a pad controller
    pub fn pad_note(&self, pad: u8) -> u8 {
        let row = pad / 4;
        let col = pad % 4;
        self.base_note + (3 - row) * 4 + col
    }

    pub fn shift_octave(&mut self, up: bool) {
        let top = 127 - (NUM_PADS as u8 - 1);
        self.base_note = if up {
            self.base_note.saturating_add(12).min(top)
        } else {
            self.base_note.saturating_sub(12)
        };
    }

    pub fn flash(&mut self, pad: u8) {
        if let Some(f) = self.pad_flash.get_mut(pad as usize) {
            *f = PAD_FLASH_FRAMES;
        }
    }

    pub fn pads_lit(&self) -> [bool; NUM_PADS] {
        self.pad_flash.map(|f| f > 0)
    }

    // once per frame
    pub fn decay(&mut self) {
        for f in &mut self.pad_flash {
            *f = f.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_count_up_from_bottom_left() {
        let ts = TuiState::new(48);
        assert_eq!(ts.pad_note(12), 48); // z
        assert_eq!(ts.pad_note(15), 51); // v
        assert_eq!(ts.pad_note(0), 60); // 1
        assert_eq!(ts.pad_note(3), 63); // 4
    }

    #[test]
    fn octave_shift_stays_in_midi_range() {
        let mut ts = TuiState::new(108);
        ts.shift_octave(true);
        assert_eq!(ts.base_note, 112);
        let mut ts = TuiState::new(5);
        ts.shift_octave(false);
        assert_eq!(ts.base_note, 0);
    }

    #[test]
    fn flash_decays() {
        let mut ts = TuiState::new(48);
        ts.flash(2);
        assert!(ts.pads_lit()[2]);
        for _ in 0..PAD_FLASH_FRAMES {
            ts.decay();
        }
        assert!(!ts.pads_lit()[2]);
    }
}
