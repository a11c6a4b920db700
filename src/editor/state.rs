use crate::instrument::automation::{EnvelopeParams, DEFAULT_SAMPLE_NOTE};

// What the editor shows. Written by ParamSync (unless held) and by the
// envelope editor while a handle is being dragged.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorState {
    pub sample_url: String,
    pub points: [f32; 4], // start, fadein, fadeout, end
    pub sample_note: u8,
    pub hold_automation: bool,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            sample_url: String::new(),
            points: EnvelopeParams::default().to_points(),
            sample_note: DEFAULT_SAMPLE_NOTE,
            hold_automation: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditorUpdate {
    Point { index: usize, value: f32 },
    SampleUrl(String),
    SampleNote(u8),
}

impl EditorState {
    pub fn envelope(&self) -> EnvelopeParams {
        EnvelopeParams::from_points(self.points)
    }

    // applied as one transition so nothing sees half an update
    pub fn apply(&mut self, updates: &[EditorUpdate]) {
        for update in updates {
            match update {
                EditorUpdate::Point { index, value } => {
                    if let Some(p) = self.points.get_mut(*index) {
                        *p = *value;
                    }
                }
                EditorUpdate::SampleUrl(url) => self.sample_url.clone_from(url),
                EditorUpdate::SampleNote(note) => self.sample_note = *note,
            }
        }
    }
}
