use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::{AudioCommand, Retired};

pub mod envelope;
mod engine;
mod frame;
pub mod pitch_shift;
mod sample_buffer;
pub mod voice;

pub use frame::StereoFrame;
pub use sample_buffer::SampleBuffer;
pub use voice::Voice;

use engine::{Engine, EngineLoad, VOICE_CAPACITY};

// largest callback we render without growing the scratch buffer
const MAX_BLOCK_FRAMES: usize = 8192;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    ended_rx: Receiver<Retired>,
    sample_rate: u32,
    load: Arc<EngineLoad>,
    requested: usize, // voice list capacity last asked for
    grown_seen: u64,
    dropped_seen: u64,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn sender(&self) -> Sender<AudioCommand> {
        self.tx.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // Frees what the engine retired and keeps its voice list ahead of the
    // load, so the callback neither frees nor allocates. Returns the number
    // of voices that ended.
    pub fn drain_ended(&mut self) -> usize {
        let mut n = 0;
        while let Ok(item) = self.ended_rx.try_recv() {
            match item {
                Retired::Voice(voice) => {
                    log::trace!("voice for note {} ended ({:?})", voice.note, voice.state());
                    n += 1;
                }
                Retired::Slots(slots) => log::trace!("voice list of {} freed", slots.capacity()),
            }
        }

        let grown = self.load.grown.load(Ordering::Relaxed);
        if grown > self.grown_seen {
            log::warn!("voice list grew inside the audio callback ({} times)", grown);
            self.grown_seen = grown;
        }
        let dropped = self.load.dropped.load(Ordering::Relaxed);
        if dropped > self.dropped_seen {
            log::warn!("return queue full, {} items freed inside the audio callback", dropped - self.dropped_seen);
            self.dropped_seen = dropped;
        }

        let live = self.load.voices.load(Ordering::Relaxed);
        let capacity = self.load.capacity.load(Ordering::Relaxed);
        if let Some(want) = engine::reserve_target(live, capacity, self.requested) {
            if self.tx.try_send(AudioCommand::Reserve(Vec::with_capacity(want))).is_ok() {
                log::debug!("{live} voices playing, growing voice list to {want}");
                self.requested = want;
            }
        }
        n
    }
}

pub fn start_audio(output_gain: f32) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
    let (ended_tx, ended_rx) = crossbeam_channel::bounded::<Retired>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let mut engine = Engine::new();
            engine.set_ended_tx(ended_tx);
            engine.handle_cmd(AudioCommand::SetOutputGain(output_gain));
            let load = engine.load();

            let output_stream = build_output_stream_f32(&device, &config.into(), rx, engine, channels)?;
            output_stream.play().context("failed to play output stream")?;
            log::info!("audio output running at {sample_rate} Hz, {channels} channels");

            Ok(AudioHandle {
                tx,
                ended_rx,
                sample_rate,
                load,
                requested: VOICE_CAPACITY,
                grown_seen: 0,
                dropped_seen: 0,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut scratch = vec![StereoFrame::zero(); MAX_BLOCK_FRAMES];

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if scratch.len() < n_frames {
                scratch.resize(n_frames, StereoFrame::zero());
            }
            let frames = &mut scratch[..n_frames];
            engine.render_block(frames);

            // spread stereo frames over however many channels the device has
            for (out, f) in data.chunks_exact_mut(channels.max(1)).zip(frames.iter()) {
                match out {
                    [mono] => *mono = 0.5 * (f.left + f.right),
                    [l, r, rest @ ..] => {
                        *l = f.left;
                        *r = f.right;
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
