use serde::{Deserialize, Serialize};

use super::automation::{EnvelopeParams, PitchAlgorithm};

// JSON snapshot of the instrument: `{"params": {...}, "url": "..."}`.
// The pitch fields are optional so snapshots without them still load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentState {
    #[serde(default)]
    pub params: EnvelopeParams,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<PitchAlgorithm>,
    #[serde(default, rename = "sampleNote", skip_serializing_if = "Option::is_none")]
    pub sample_note: Option<u8>,
}

impl InstrumentState {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let state = InstrumentState {
            params: EnvelopeParams { start: 0.1, fadein: 0.2, fadeout: 0.8, end: 0.9 },
            url: "kick.wav".into(),
            algorithm: Some(PitchAlgorithm::PhaseVocoder),
            sample_note: Some(57),
        };
        let json = state.to_json().unwrap();
        assert!(json.contains("\"sampleNote\": 57"));
        assert!(json.contains("\"phase-vocoder\""));
        assert_eq!(InstrumentState::from_json(&json).unwrap(), state);
    }

    #[test]
    fn partial_params_fill_in_defaults() {
        let state = InstrumentState::from_json(r#"{"params": {"fadein": 0.25}}"#).unwrap();
        assert_eq!(state.params.to_points(), [0.0, 0.25, 1.0, 1.0]);
        assert_eq!(state.url, "");
        assert_eq!(state.algorithm, None);
        assert_eq!(state.sample_note, None);
    }

    #[test]
    fn absent_pitch_fields_are_not_written() {
        let json = InstrumentState::with_url("a.wav").to_json().unwrap();
        assert!(!json.contains("sampleNote"));
        assert!(!json.contains("algorithm"));
    }
}
