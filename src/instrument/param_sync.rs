// Mirrors the automation store into the editor once per UI frame. The
// editor's hold flag freezes the mirror while a drag is in progress, so the
// handle under the pointer never jumps.

use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender};

use crate::editor::{EditorState, EditorUpdate};
use crate::loader::sample_loader::{self, LoadId, LoadResult};
use super::automation::{Automation, ParamSnapshot};
use super::sample_store::SampleStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Cancelled,
    Held,
    Synced(usize), // number of editor fields that changed
}

// Everything in `snap` that differs from what the editor shows
pub fn diff(snap: &ParamSnapshot, editor: &EditorState) -> Vec<EditorUpdate> {
    let mut updates = Vec::new();
    for (index, (&value, &shown)) in snap.envelope.to_points().iter().zip(&editor.points).enumerate() {
        if value != shown {
            updates.push(EditorUpdate::Point { index, value });
        }
    }
    if snap.url != editor.sample_url {
        updates.push(EditorUpdate::SampleUrl(snap.url.clone()));
    }
    if snap.pitch.sample_note != editor.sample_note {
        updates.push(EditorUpdate::SampleNote(snap.pitch.sample_note));
    }
    updates
}

pub struct ParamSync {
    base_dir: PathBuf,
    sample_rate: u32,
    pending: Option<LoadId>, // only this load may swap the sample
    load_tx: Sender<LoadResult>,
    load_rx: Receiver<LoadResult>,
    cancelled: bool,
}

impl ParamSync {
    pub fn new(base_dir: PathBuf, sample_rate: u32) -> Self {
        let (load_tx, load_rx) = crossbeam_channel::unbounded();
        Self {
            base_dir,
            sample_rate,
            pending: None,
            load_tx,
            load_rx,
            cancelled: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    // stop for good; nothing is written after this
    pub fn cancel(&mut self) {
        if !self.cancelled {
            log::debug!("param sync cancelled");
        }
        self.cancelled = true;
        self.pending = None;
    }

    pub fn tick(&mut self, automation: &Automation, editor: &mut EditorState, store: &mut SampleStore) -> SyncOutcome {
        if self.cancelled {
            return SyncOutcome::Cancelled;
        }
        self.collect_loads(store);

        let snap = automation.snapshot();
        if editor.hold_automation {
            return SyncOutcome::Held;
        }

        let updates = diff(&snap, editor);
        for update in &updates {
            if let EditorUpdate::SampleUrl(url) = update {
                self.request_load(url);
            }
        }
        editor.apply(&updates);
        SyncOutcome::Synced(updates.len())
    }

    fn request_load(&mut self, locator: &str) {
        if locator.trim().is_empty() {
            // nothing to load, but an in-flight decode is now stale
            self.pending = None;
            log::debug!("sample url cleared, keeping current sample");
            return;
        }
        let id = sample_loader::next_load_id();
        self.pending = Some(id);
        log::info!("loading sample {locator:?}");
        sample_loader::spawn_load(
            id,
            locator.to_string(),
            self.base_dir.clone(),
            self.sample_rate,
            self.load_tx.clone(),
        );
    }

    fn collect_loads(&mut self, store: &mut SampleStore) {
        while let Ok(done) = self.load_rx.try_recv() {
            if self.pending != Some(done.id) {
                log::debug!("discarding stale decode of {:?}", done.locator);
                continue;
            }
            self.pending = None;
            match done.result {
                Ok(buffer) => {
                    store.replace(done.locator, buffer.into());
                }
                Err(e) => log::warn!("could not load sample {:?}: {e}", done.locator),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::{Duration, Instant};

    use crate::audio::{SampleBuffer, StereoFrame};
    use crate::instrument::automation::{EnvelopeParams, ParamBatch};
    use crate::loader::LoadError;

    fn sync() -> ParamSync {
        ParamSync::new(PathBuf::from("/nowhere"), 8000)
    }

    fn tiny_buffer(frames: usize) -> SampleBuffer {
        SampleBuffer::from_frames(vec![StereoFrame::zero(); frames], 8000)
    }

    fn write_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(1000i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn tick_copies_automation_into_editor() {
        let mut automation = Automation::new();
        automation.set_batch(ParamBatch {
            fadein: Some(0.2),
            sample_note: Some(50),
            ..ParamBatch::default()
        });
        let mut editor = EditorState::default();
        let mut store = SampleStore::new();
        let mut ps = sync();

        assert_eq!(ps.tick(&automation, &mut editor, &mut store), SyncOutcome::Synced(2));
        assert_eq!(editor.points, [0.0, 0.2, 1.0, 1.0]);
        assert_eq!(editor.sample_note, 50);
        assert_eq!(ps.tick(&automation, &mut editor, &mut store), SyncOutcome::Synced(0));
    }

    #[test]
    fn hold_freezes_editor_for_any_writes() {
        let mut automation = Automation::new();
        let mut editor = EditorState::default();
        editor.hold_automation = true;
        editor.points = [0.1, 0.2, 0.3, 0.4];
        let frozen = editor.clone();
        let mut store = SampleStore::new();
        let mut ps = sync();

        for i in 0..50u8 {
            let v = (i as f32 * 0.37) % 1.0;
            automation.set_batch(ParamBatch {
                start: Some(v),
                end: Some(1.0 - v),
                url: Some(format!("take{i}.wav")),
                sample_note: Some(i),
                ..ParamBatch::default()
            });
            assert_eq!(ps.tick(&automation, &mut editor, &mut store), SyncOutcome::Held);
            assert_eq!(editor, frozen);
        }
        assert!(!ps.is_loading());

        editor.hold_automation = false;
        ps.tick(&automation, &mut editor, &mut store);
        assert_eq!(editor.sample_note, 49);
        assert_eq!(editor.sample_url, "take49.wav");
    }

    #[test]
    fn stale_decodes_are_discarded() {
        let mut ps = sync();
        let mut store = SampleStore::new();
        let old = sample_loader::next_load_id();
        let current = sample_loader::next_load_id();
        ps.pending = Some(current);

        ps.load_tx
            .send(LoadResult { id: old, locator: "old.wav".into(), result: Ok(tiny_buffer(4)) })
            .unwrap();
        ps.collect_loads(&mut store);
        assert!(store.buffer().is_none());
        assert!(ps.is_loading());

        ps.load_tx
            .send(LoadResult { id: current, locator: "new.wav".into(), result: Ok(tiny_buffer(8)) })
            .unwrap();
        ps.collect_loads(&mut store);
        assert_eq!(store.locator(), Some("new.wav"));
        assert!(!ps.is_loading());
    }

    #[test]
    fn failed_load_keeps_previous_sample() {
        let mut ps = sync();
        let mut store = SampleStore::new();
        store.replace("kept.wav".into(), tiny_buffer(4).into());

        let id = sample_loader::next_load_id();
        ps.pending = Some(id);
        ps.load_tx
            .send(LoadResult { id, locator: "gone.wav".into(), result: Err(LoadError::Empty) })
            .unwrap();
        ps.collect_loads(&mut store);
        assert_eq!(store.locator(), Some("kept.wav"));
    }

    #[test]
    fn url_change_loads_the_sample() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("hit.wav"), 400);

        let mut automation = Automation::new();
        automation.set_batch(ParamBatch { url: Some("hit.wav".into()), ..ParamBatch::default() });
        let mut editor = EditorState::default();
        let mut store = SampleStore::new();
        let mut ps = ParamSync::new(dir.path().to_path_buf(), 8000);

        ps.tick(&automation, &mut editor, &mut store);
        assert_eq!(editor.sample_url, "hit.wav");

        let deadline = Instant::now() + Duration::from_secs(5);
        while store.buffer().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            ps.tick(&automation, &mut editor, &mut store);
        }
        assert_eq!(store.buffer().map(|b| b.len()), Some(400));
    }

    #[test]
    fn cancelled_sync_never_writes() {
        let mut automation = Automation::new();
        automation.set_batch(ParamBatch::envelope(EnvelopeParams {
            start: 0.5,
            fadein: 0.5,
            fadeout: 0.5,
            end: 0.5,
        }));
        let mut editor = EditorState::default();
        let mut ps = sync();
        ps.cancel();

        assert_eq!(ps.tick(&automation, &mut editor, &mut SampleStore::new()), SyncOutcome::Cancelled);
        assert_eq!(editor, EditorState::default());
    }
}
