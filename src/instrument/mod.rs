pub mod automation;
pub mod midi_router;
pub mod param_sync;
pub mod sample_store;
pub mod state;
pub mod voice_engine;

use std::path::PathBuf;

use crossbeam_channel::Sender;

use crate::audio_api::AudioCommand;
use crate::editor::{EditorState, EditorView, PointerEvent};
use crate::shared::DisplayState;
use automation::{Automation, ParamBatch, PitchAlgorithm, DEFAULT_SAMPLE_NOTE};
use midi_router::Route;
use param_sync::{ParamSync, SyncOutcome};
use sample_store::SampleStore;
use state::InstrumentState;
use voice_engine::VoiceEngine;

// One instrument instance. Lives on the control thread; only finished
// voices cross over to the audio thread.
pub struct Instrument {
    automation: Automation,
    store: SampleStore,
    voices: VoiceEngine,
    sync: ParamSync,
    editor: EditorState,
    view: Option<EditorView>, // at most one mounted view
}

impl Instrument {
    pub fn new(audio_tx: Sender<AudioCommand>, sample_rate: u32, base_dir: PathBuf) -> Self {
        Self {
            automation: Automation::new(),
            store: SampleStore::new(),
            voices: VoiceEngine::new(audio_tx),
            sync: ParamSync::new(base_dir, sample_rate),
            editor: EditorState::default(),
            view: None,
        }
    }

    pub fn automation(&self) -> &Automation {
        &self.automation
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn trigger(&mut self, note: u8, velocity: f32) -> bool {
        self.voices.trigger(note, velocity, &self.automation, &self.store)
    }

    pub fn handle_midi(&mut self, bytes: &[u8]) -> Route {
        let route = midi_router::route(bytes);
        if let Route::Trigger { note, velocity } = route {
            self.trigger(note, velocity);
        }
        route
    }

    // once per UI frame
    pub fn tick(&mut self) -> SyncOutcome {
        self.sync.tick(&self.automation, &mut self.editor, &mut self.store)
    }

    // direct parameter write, as a host automation lane would
    pub fn set_params(&mut self, batch: ParamBatch) {
        self.automation.set_batch(batch);
    }

    pub fn nudge_sample_note(&mut self, delta: i8) {
        let note = self.automation.pitch().sample_note.saturating_add_signed(delta).min(127);
        self.set_params(ParamBatch { sample_note: Some(note), ..ParamBatch::default() });
    }

    pub fn toggle_algorithm(&mut self) -> PitchAlgorithm {
        let algorithm = self.automation.pitch().algorithm.toggled();
        self.set_params(ParamBatch { algorithm: Some(algorithm), ..ParamBatch::default() });
        algorithm
    }

    pub fn get_state(&self) -> InstrumentState {
        let snap = self.automation.snapshot();
        InstrumentState {
            params: snap.envelope,
            url: snap.url,
            algorithm: Some(snap.pitch.algorithm),
            sample_note: Some(snap.pitch.sample_note),
        }
    }

    // the sample itself is loaded on a later tick, once the url reaches the editor
    pub fn set_state(&mut self, state: &InstrumentState) {
        let mut batch = ParamBatch::envelope(state.params);
        batch.url = Some(state.url.clone());
        batch.algorithm = Some(state.algorithm.unwrap_or_default());
        batch.sample_note = Some(state.sample_note.unwrap_or(DEFAULT_SAMPLE_NOTE));
        self.automation.set_batch(batch);
    }

    // Mounting replaces the current view. A drag left open on the old view
    // is committed first so the hold flag can't get stuck.
    pub fn mount_view(&mut self, width: f32, height: f32) -> &mut EditorView {
        self.unmount_view();
        log::debug!("editor view mounted at {width}x{height}");
        self.view.insert(EditorView::new(width, height))
    }

    // follow a new surface size without dropping the gesture in flight
    pub fn fit_view(&mut self, width: f32, height: f32) {
        match self.view.as_mut() {
            Some(view) => view.envelope.resize(width, height),
            None => {
                self.mount_view(width, height);
            }
        }
    }

    pub fn unmount_view(&mut self) {
        if let Some(mut view) = self.view.take() {
            view.release(&mut self.editor, &mut self.automation);
        }
    }

    pub fn view(&self) -> Option<&EditorView> {
        self.view.as_ref()
    }

    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        match self.view.as_mut() {
            Some(view) => view.pointer(event, &mut self.editor, &mut self.automation),
            None => false,
        }
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            url: self.editor.sample_url.clone(),
            points: self.editor.points,
            handles: self.view.as_ref().map(|v| v.envelope.points(&self.editor)),
            sample_note: self.editor.sample_note,
            algorithm: self.automation.pitch().algorithm,
            holding: self.editor.hold_automation,
            dragging: self.view.as_ref().and_then(|v| v.dragging()),
            buffer: self.store.buffer().cloned(),
            loading: self.sync.is_loading(),
            voices_triggered: self.voices.triggered(),
        }
    }

    // teardown; the sync loop stops for good
    pub fn shutdown(&mut self) {
        self.unmount_view();
        self.sync.cancel();
    }
}
