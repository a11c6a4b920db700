use std::sync::Arc;

use super::envelope::GainEnvelope;
use super::frame::StereoFrame;
use super::pitch_shift::{PitchShifter, LATENCY};
use super::sample_buffer::SampleBuffer;

// Reads a span of the shared buffer at a fixed playback rate
pub struct SampleSource {
    buffer: Arc<SampleBuffer>,
    offset: f64, // first buffer frame of the span
    span: f64,   // buffer frames to play
    pos: f64,    // frames consumed, relative to offset
    rate: f64,
}

impl SampleSource {
    pub fn new(buffer: Arc<SampleBuffer>, offset: f64, span: f64, rate: f64) -> Self {
        Self { buffer, offset, span, pos: 0.0, rate }
    }

    fn next_frame(&mut self) -> Option<StereoFrame> {
        if self.pos >= self.span {
            return None;
        }
        let frame = self.buffer.frame_at(self.offset + self.pos);
        self.pos += self.rate;
        Some(frame)
    }
}

// How a voice gets its pitch; picked once when the voice is built
pub enum PitchStage {
    // source rate scaled, duration scales with it
    Resample,
    // source at 1.0 through the shifter, duration preserved
    PhaseVocoder(Box<PitchShifter>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Playing,
    Ended,
}

pub struct Voice {
    pub note: u8,
    source: SampleSource,
    gain: GainEnvelope,
    pitch: PitchStage,
    sample_rate: f64,
    planned_frames: u64,
    elapsed: u64,
    started_at: Option<u64>,
    state: VoiceState,
}

impl Voice {
    pub fn new(
        note: u8,
        mut source: SampleSource,
        gain: GainEnvelope,
        mut pitch: PitchStage,
        planned_secs: f64,
    ) -> Self {
        let sample_rate = source.buffer.sample_rate as f64;

        // prime the shifter so output frame i lines up with source frame i
        // (up to the window smear of a shifted transient)
        if let PitchStage::PhaseVocoder(shifter) = &mut pitch {
            for _ in 0..LATENCY {
                let input = source.next_frame().unwrap_or_default();
                shifter.process(input);
            }
        }

        Self {
            note,
            source,
            gain,
            pitch,
            sample_rate,
            planned_frames: (planned_secs * sample_rate).round().max(0.0) as u64,
            elapsed: 0,
            started_at: None,
            state: VoiceState::Idle,
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn planned_secs(&self) -> f64 {
        self.planned_frames as f64 / self.sample_rate
    }

    pub fn gain(&self) -> &GainEnvelope {
        &self.gain
    }

    pub fn pitch(&self) -> &PitchStage {
        &self.pitch
    }

    // anchor at t0 (engine clock) and start playing
    pub fn connect(&mut self, clock: u64) {
        if self.state == VoiceState::Idle {
            self.started_at = Some(clock);
            self.state = VoiceState::Playing;
        }
    }

    // detach from the output; safe to call any number of times.
    // returns true only for the call that actually ended the voice
    pub fn disconnect(&mut self) -> bool {
        let was_ended = self.state == VoiceState::Ended;
        self.state = VoiceState::Ended;
        !was_ended
    }

    // mix this voice into `out`; returns false once playback is over
    pub fn render_into(&mut self, out: &mut [StereoFrame]) -> bool {
        if self.state != VoiceState::Playing {
            return false;
        }

        for frame in out.iter_mut() {
            if self.elapsed >= self.planned_frames {
                return false;
            }

            let sample = match &mut self.pitch {
                PitchStage::Resample => match self.source.next_frame() {
                    Some(s) => s,
                    None => return false,
                },
                PitchStage::PhaseVocoder(shifter) => {
                    // past the end of the span the shifter is flushed with silence
                    let input = self.source.next_frame().unwrap_or_default();
                    shifter.process(input)
                }
            };

            let t = self.elapsed as f64 / self.sample_rate;
            frame.mix(sample.scaled(self.gain.value_at(t)));
            self.elapsed += 1;
        }

        self.elapsed < self.planned_frames
    }
}
