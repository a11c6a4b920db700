use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_channel::Sender;

use crate::audio_api::{AudioCommand, Retired};
use super::frame::StereoFrame;
use super::voice::Voice;

// starting size of the voice list. There is no voice limit: the control
// thread watches `EngineLoad` and sends a bigger list before this fills up
pub const VOICE_CAPACITY: usize = 64;

// counters the callback publishes for the control thread
#[derive(Debug, Default)]
pub struct EngineLoad {
    pub voices: AtomicUsize,
    pub capacity: AtomicUsize,
    pub grown: AtomicU64,   // connects that had to grow the list in the callback
    pub dropped: AtomicU64, // retired items freed in the callback, return queue full
}

// capacity to ask for once the list is half full, unless a request for
// more than the current capacity is already in flight
pub fn reserve_target(live: usize, capacity: usize, requested: usize) -> Option<usize> {
    if requested > capacity || live * 2 < capacity {
        return None;
    }
    Some((capacity * 2).max(VOICE_CAPACITY))
}

pub struct Engine {
    clock: u64, // frames rendered since start
    output_gain: f32,
    voices: Vec<Box<Voice>>,
    ended_tx: Option<Sender<Retired>>, // ended voices and old lists go back to be freed off the audio thread
    load: Arc<EngineLoad>,
}

impl Engine {
    pub fn new() -> Self {
        let load = EngineLoad::default();
        load.capacity.store(VOICE_CAPACITY, Ordering::Relaxed);
        Self {
            clock: 0,
            output_gain: 1.0,
            voices: Vec::with_capacity(VOICE_CAPACITY),
            ended_tx: None,
            load: Arc::new(load),
        }
    }

    pub fn set_ended_tx(&mut self, tx: Sender<Retired>) {
        self.ended_tx = Some(tx);
    }

    pub fn load(&self) -> Arc<EngineLoad> {
        self.load.clone()
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Connect(mut voice) => {
                voice.connect(self.clock); // t0
                if self.voices.len() == self.voices.capacity() {
                    self.load.grown.fetch_add(1, Ordering::Relaxed);
                }
                self.voices.push(voice);
                self.publish();
            }
            AudioCommand::Reserve(mut slots) => {
                slots.clear();
                if slots.capacity() > self.voices.capacity() {
                    slots.extend(self.voices.drain(..));
                    let old = std::mem::replace(&mut self.voices, slots);
                    self.retire(Retired::Slots(old));
                    self.publish();
                } else {
                    self.retire(Retired::Slots(slots));
                }
            }
            AudioCommand::SetOutputGain(gain) => self.output_gain = gain.max(0.0),
        }
    }

    fn retire(&self, item: Retired) {
        let Some(tx) = &self.ended_tx else { return };
        if tx.try_send(item).is_err() {
            self.load.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn publish(&self) {
        self.load.voices.store(self.voices.len(), Ordering::Relaxed);
        self.load.capacity.store(self.voices.capacity(), Ordering::Relaxed);
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());

        let mut i = 0;
        let before = self.voices.len();
        while i < self.voices.len() {
            if self.voices[i].render_into(out) {
                i += 1;
                continue;
            }
            let mut voice = self.voices.swap_remove(i);
            voice.disconnect();
            self.retire(Retired::Voice(voice));
        }
        if self.voices.len() != before {
            self.publish();
        }

        if self.output_gain != 1.0 {
            for f in out.iter_mut() {
                *f = f.scaled(self.output_gain);
            }
        }
        self.clock += out.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::envelope::GainEnvelope;
    use crate::audio::sample_buffer::SampleBuffer;
    use crate::audio::voice::{PitchStage, SampleSource, VoiceState};
    use std::sync::Arc;

    fn one_voice(frames: usize) -> Box<Voice> {
        let buf = Arc::new(SampleBuffer::from_frames(
            vec![StereoFrame { left: 0.5, right: 0.5 }; frames],
            100,
        ));
        let mut env = GainEnvelope::new();
        env.set_value_at_time(1.0, 0.0);
        let source = SampleSource::new(buf, 0.0, frames as f64, 1.0);
        Box::new(Voice::new(60, source, env, PitchStage::Resample, frames as f64 / 100.0))
    }

    #[test]
    fn voice_is_anchored_at_engine_clock() {
        let mut engine = Engine::new();
        let mut block = vec![StereoFrame::zero(); 32];
        engine.render_block(&mut block);

        let (tx, rx) = crossbeam_channel::unbounded();
        engine.set_ended_tx(tx);
        engine.handle_cmd(AudioCommand::Connect(one_voice(40)));
        engine.render_block(&mut block);
        engine.render_block(&mut block);

        let Retired::Voice(ended) = rx.try_recv().unwrap() else {
            panic!("expected an ended voice");
        };
        assert_eq!(ended.started_at(), Some(32));
        assert_eq!(ended.state(), VoiceState::Ended);
    }

    #[test]
    fn ended_voices_are_disconnected_and_returned() {
        let mut engine = Engine::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        engine.set_ended_tx(tx);

        engine.handle_cmd(AudioCommand::Connect(one_voice(10)));
        engine.handle_cmd(AudioCommand::Connect(one_voice(100)));
        assert_eq!(engine.voices.len(), 2);

        let mut block = vec![StereoFrame::zero(); 16];
        engine.render_block(&mut block);
        assert_eq!(engine.voices.len(), 1);
        assert_eq!(rx.len(), 1);
        // both voices overlap for the first 10 frames
        assert_eq!(block[0].left, 1.0);
        assert_eq!(block[12].left, 0.5);
    }

    #[test]
    fn output_gain_scales_the_mix() {
        let mut engine = Engine::new();
        engine.handle_cmd(AudioCommand::SetOutputGain(0.5));
        engine.handle_cmd(AudioCommand::Connect(one_voice(10)));
        let mut block = vec![StereoFrame::zero(); 4];
        engine.render_block(&mut block);
        assert_eq!(block[0].left, 0.25);
        assert_eq!(engine.clock, 4);
    }

    #[test]
    fn empty_engine_renders_silence() {
        let mut engine = Engine::new();
        let mut block = vec![StereoFrame { left: 1.0, right: 1.0 }; 8];
        engine.render_block(&mut block);
        assert!(block.iter().all(|f| *f == StereoFrame::zero()));
    }

    #[test]
    fn reserve_swaps_in_a_bigger_list() {
        let mut engine = Engine::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        engine.set_ended_tx(tx);
        let load = engine.load();

        engine.handle_cmd(AudioCommand::Connect(one_voice(100)));
        engine.handle_cmd(AudioCommand::Connect(one_voice(100)));
        engine.handle_cmd(AudioCommand::Reserve(Vec::with_capacity(VOICE_CAPACITY * 2)));

        assert_eq!(engine.voices.len(), 2);
        assert!(engine.voices.capacity() >= VOICE_CAPACITY * 2);
        assert_eq!(load.capacity.load(Ordering::Relaxed), engine.voices.capacity());
        assert_eq!(load.voices.load(Ordering::Relaxed), 2);
        match rx.try_recv().unwrap() {
            Retired::Slots(old) => assert!(old.is_empty()),
            Retired::Voice(_) => panic!("expected the old list back"),
        }
    }

    #[test]
    fn smaller_reserve_is_handed_straight_back() {
        let mut engine = Engine::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        engine.set_ended_tx(tx);
        engine.handle_cmd(AudioCommand::Reserve(Vec::with_capacity(4)));
        assert!(engine.voices.capacity() >= VOICE_CAPACITY);
        assert!(matches!(rx.try_recv().unwrap(), Retired::Slots(_)));
    }

    #[test]
    fn full_return_queue_is_counted() {
        let mut engine = Engine::new();
        let (tx, _rx) = crossbeam_channel::bounded(1);
        engine.set_ended_tx(tx);
        let load = engine.load();

        engine.handle_cmd(AudioCommand::Connect(one_voice(4)));
        engine.handle_cmd(AudioCommand::Connect(one_voice(4)));
        let mut block = vec![StereoFrame::zero(); 8];
        engine.render_block(&mut block);

        assert!(engine.voices.is_empty());
        assert_eq!(load.voices.load(Ordering::Relaxed), 0);
        assert_eq!(load.dropped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn growth_past_capacity_is_counted() {
        let mut engine = Engine::new();
        let load = engine.load();
        for _ in 0..=VOICE_CAPACITY {
            engine.handle_cmd(AudioCommand::Connect(one_voice(100)));
        }
        assert_eq!(load.grown.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn reserve_is_requested_at_half_load() {
        assert_eq!(reserve_target(10, 64, 64), None);
        assert_eq!(reserve_target(32, 64, 64), Some(128));
        // already asked for 128, still waiting for the swap
        assert_eq!(reserve_target(40, 64, 128), None);
        assert_eq!(reserve_target(64, 128, 128), Some(256));
    }
}
