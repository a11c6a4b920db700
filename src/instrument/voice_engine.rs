use std::sync::Arc;

use crossbeam_channel::Sender;
use realfft::RealFftPlanner;

use crate::audio::envelope::GainEnvelope;
use crate::audio::pitch_shift::PitchShifter;
use crate::audio::voice::{PitchStage, SampleSource};
use crate::audio::{SampleBuffer, Voice};
use crate::audio_api::AudioCommand;
use super::automation::{Automation, EnvelopeParams, PitchAlgorithm, PitchParams};
use super::sample_store::SampleStore;

// equal temperament, relative to the note the sample was recorded at
pub fn playback_rate(note: u8, sample_note: u8) -> f64 {
    2f64.powf((note as f64 - sample_note as f64) / 12.0)
}

/// Schedules the gain curve for one voice.
///
/// `span` is the played duration D in seconds. Fade positions are fractions
/// of D measured from the voice anchor. A fade whose width is zero is
/// skipped entirely, so the voice holds `peak` for that edge.
pub fn gain_envelope(env: EnvelopeParams, peak: f32, span: f64) -> GainEnvelope {
    let mut gain = GainEnvelope::new();

    if env.fadein > env.start {
        gain.set_value_at_time(0.0, 0.0);
        gain.linear_ramp_to_value_at_time(peak, env.fadein as f64 * span);
    } else {
        gain.set_value_at_time(peak, 0.0);
    }

    if env.end > env.fadeout {
        gain.set_value_at_time(peak, env.fadeout as f64 * span);
        gain.linear_ramp_to_value_at_time(0.0, span);
    }
    gain
}

/// Builds the voice for a note, or `None` if the envelope leaves nothing to
/// play (`end <= start`).
pub fn build_voice(
    note: u8,
    velocity: f32,
    env: EnvelopeParams,
    pitch: PitchParams,
    buffer: &Arc<SampleBuffer>,
    planner: &mut RealFftPlanner<f32>,
) -> Option<Voice> {
    let span_secs = (env.end - env.start) as f64 * buffer.duration_secs();
    if span_secs <= 0.0 {
        return None;
    }

    let rate = playback_rate(note, pitch.sample_note);
    let peak = velocity.clamp(0.0, 1.0);
    let gain = gain_envelope(env, peak, span_secs);

    let frames = buffer.len() as f64;
    let offset = env.start as f64 * frames;
    let span = (env.end - env.start) as f64 * frames;

    let voice = match pitch.algorithm {
        PitchAlgorithm::Resample => {
            let source = SampleSource::new(buffer.clone(), offset, span, rate);
            Voice::new(note, source, gain, PitchStage::Resample, span_secs / rate)
        }
        PitchAlgorithm::PhaseVocoder => {
            let source = SampleSource::new(buffer.clone(), offset, span, 1.0);
            let shifter = PitchShifter::new(rate as f32, planner);
            Voice::new(
                note,
                source,
                gain,
                PitchStage::PhaseVocoder(Box::new(shifter)),
                span_secs,
            )
        }
    };
    Some(voice)
}

// Turns note-ons into voices for the render engine. Everything here runs on
// the control thread so allocation and FFT planning stay out of the callback.
pub struct VoiceEngine {
    tx: Sender<AudioCommand>,
    planner: RealFftPlanner<f32>,
    triggered: u64,
}

impl VoiceEngine {
    pub fn new(tx: Sender<AudioCommand>) -> Self {
        Self {
            tx,
            planner: RealFftPlanner::new(),
            triggered: 0,
        }
    }

    pub fn triggered(&self) -> u64 {
        self.triggered
    }

    // returns true if a voice was handed to the engine
    pub fn trigger(&mut self, note: u8, velocity: f32, automation: &Automation, store: &SampleStore) -> bool {
        let Some(buffer) = store.buffer() else {
            log::warn!("note {note} ignored, no sample loaded");
            return false;
        };

        // both reads come from the same store on this thread, so the
        // envelope and pitch settings always belong together
        let env = automation.envelope();
        let pitch = automation.pitch();

        let Some(voice) = build_voice(note, velocity, env, pitch, buffer, &mut self.planner) else {
            log::warn!(
                "note {note} ignored, envelope end {} is not after start {}",
                env.end,
                env.start
            );
            return false;
        };

        log::debug!(
            "note {note} vel {velocity:.2} rate {:.3} via {} for {:.3}s",
            playback_rate(note, pitch.sample_note),
            pitch.algorithm.label(),
            voice.planned_secs()
        );

        if self.tx.try_send(AudioCommand::Connect(Box::new(voice))).is_err() {
            log::warn!("audio command queue full, note {note} dropped");
            return false;
        }
        self.triggered += 1;
        true
    }
}
