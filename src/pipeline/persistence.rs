// called on startup and quit; keeps the instrument snapshot next to the samples
use std::path::{Path, PathBuf};
use crate::instrument::state::InstrumentState;

const SAMPLETY_DIR: &str = ".samplety";
const STATE_FILE: &str = "state.json";

// <project_dir>/.samplety/state.json
fn state_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(SAMPLETY_DIR).join(STATE_FILE)
}

pub fn load_state(project_dir: &Path) -> Option<InstrumentState> {
    let path = state_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match InstrumentState::from_json(&data) {
        Ok(state) => Some(state),
        Err(e) => {
            log::warn!("ignoring unreadable state {}: {e}", path.display());
            None
        }
    }
}

// Save the snapshot, making .samplety/ if it doesn't exist already
pub fn save_state(project_dir: &Path, state: &InstrumentState) -> anyhow::Result<()> {
    let path = state_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, state.to_json()?)?;
    log::info!("saved state to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::automation::EnvelopeParams;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let state = InstrumentState {
            params: EnvelopeParams { start: 0.0, fadein: 0.1, fadeout: 0.9, end: 1.0 },
            ..InstrumentState::with_url("pad.wav")
        };
        save_state(dir.path(), &state).unwrap();
        assert!(dir.path().join(".samplety/state.json").exists());
        assert_eq!(load_state(dir.path()), Some(state));
    }

    #[test]
    fn missing_or_broken_state_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_state(dir.path()), None);
        std::fs::create_dir_all(dir.path().join(SAMPLETY_DIR)).unwrap();
        std::fs::write(state_file_path(dir.path()), "{not json").unwrap();
        assert_eq!(load_state(dir.path()), None);
    }
}
