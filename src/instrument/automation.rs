// The authoritative parameter store. Host-style writes (knobs, state
// restore, committed editor drags) land here; the voice engine reads it at
// trigger time and ParamSync mirrors it into the editor.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_NOTE: u8 = 60;

/// Envelope control points as fractions of the played span.
///
/// `start <= fadein <= fadeout <= end` is the intended order, but only the
/// editor enforces it; anything in [0, 1] is accepted here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeParams {
    pub start: f32,
    pub fadein: f32,
    pub fadeout: f32,
    pub end: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            start: 0.0,
            fadein: 0.0,
            fadeout: 1.0,
            end: 1.0,
        }
    }
}

impl EnvelopeParams {
    pub fn to_points(self) -> [f32; 4] {
        [self.start, self.fadein, self.fadeout, self.end]
    }

    pub fn from_points(p: [f32; 4]) -> Self {
        Self {
            start: p[0],
            fadein: p[1],
            fadeout: p[2],
            end: p[3],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PitchAlgorithm {
    #[default]
    Resample,
    PhaseVocoder,
}

impl PitchAlgorithm {
    pub fn toggled(self) -> Self {
        match self {
            PitchAlgorithm::Resample => PitchAlgorithm::PhaseVocoder,
            PitchAlgorithm::PhaseVocoder => PitchAlgorithm::Resample,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PitchAlgorithm::Resample => "resample",
            PitchAlgorithm::PhaseVocoder => "phase-vocoder",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PitchParams {
    pub sample_note: u8,
    pub algorithm: PitchAlgorithm,
}

impl Default for PitchParams {
    fn default() -> Self {
        Self {
            sample_note: DEFAULT_SAMPLE_NOTE,
            algorithm: PitchAlgorithm::Resample,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamSnapshot {
    pub envelope: EnvelopeParams,
    pub pitch: PitchParams,
    pub url: String,
}

// A partial write; `None` leaves the field alone
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamBatch {
    pub start: Option<f32>,
    pub fadein: Option<f32>,
    pub fadeout: Option<f32>,
    pub end: Option<f32>,
    pub url: Option<String>,
    pub sample_note: Option<u8>,
    pub algorithm: Option<PitchAlgorithm>,
}

impl ParamBatch {
    pub fn envelope(p: EnvelopeParams) -> Self {
        Self {
            start: Some(p.start),
            fadein: Some(p.fadein),
            fadeout: Some(p.fadeout),
            end: Some(p.end),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct Automation {
    current: ParamSnapshot,
    revision: u64, // bumped on every write that changed something
}

impl Automation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        self.current.clone()
    }

    // trigger-time reads; cheaper than a full snapshot (no url clone)
    pub fn envelope(&self) -> EnvelopeParams {
        self.current.envelope
    }

    pub fn pitch(&self) -> PitchParams {
        self.current.pitch
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_batch(&mut self, batch: ParamBatch) {
        let before = self.current.clone();
        let env = &mut self.current.envelope;

        for (slot, value) in [
            (&mut env.start, batch.start),
            (&mut env.fadein, batch.fadein),
            (&mut env.fadeout, batch.fadeout),
            (&mut env.end, batch.end),
        ] {
            // NaN is not a position; ignore it rather than poison the store
            if let Some(v) = value.filter(|v| !v.is_nan()) {
                *slot = v.clamp(0.0, 1.0);
            }
        }
        if let Some(url) = batch.url {
            self.current.url = url;
        }
        if let Some(note) = batch.sample_note {
            self.current.pitch.sample_note = note.min(127);
        }
        if let Some(algorithm) = batch.algorithm {
            self.current.pitch.algorithm = algorithm;
        }

        if self.current != before {
            self.revision += 1;
            log::debug!(target: "automation", "params now {:?} (rev {})", self.current, self.revision);
        }
    }
}
