use std::path::Path;

use super::frame::StereoFrame;
use crate::loader::LoadError;

#[derive(Clone, Debug)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>, // the audio data, always at `sample_rate`
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn from_frames(data: Vec<StereoFrame>, sample_rate: u32) -> Self {
        Self { data, sample_rate }
    }

    // Load a WAV file from disk, converted to stereo at the output rate
    pub fn load_wav(path: &Path, target_rate: u32) -> Result<Self, LoadError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let file_rate = spec.sample_rate;
        let file_channels = spec.channels as usize;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader // float, just pass it through
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => { // int, convert to float
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let frames: Vec<StereoFrame> = match file_channels {
            0 => return Err(LoadError::UnsupportedFormat("zero channels".into())),
            1 => samples
                .into_iter()
                .map(|x| StereoFrame { left: x, right: x }) // mono, duplicate
                .collect(),
            n => samples
                .chunks_exact(n) // surround and friends keep their front pair
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect(),
        };

        if frames.is_empty() {
            return Err(LoadError::Empty);
        }

        let data = if file_rate != target_rate {
            resample_linear(&frames, file_rate, target_rate)
        } else {
            frames
        };

        Ok(Self { data, sample_rate: target_rate })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.data.len() as f64 / self.sample_rate as f64
    }

    // interpolated read; anything outside the buffer is silence
    pub fn frame_at(&self, pos: f64) -> StereoFrame {
        if pos < 0.0 {
            return StereoFrame::zero();
        }
        let i = pos.floor() as usize;
        let Some(&s0) = self.data.get(i) else {
            return StereoFrame::zero();
        };
        let s1 = self.data.get(i + 1).copied().unwrap_or(s0);
        StereoFrame::lerp(s0, s1, (pos - i as f64) as f32)
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    // simple linear resampler, good enough for one-shot samples
    if source_rate == target_rate || source_rate == 0 {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio; // ex. 3.7
        let idx = src_pos.floor() as usize; // ex. 3
        let frac = (src_pos - idx as f64) as f32; // ex. 0.7
        if idx >= frames.len().saturating_sub(1) { // edge case
            out.push(*frames.last().unwrap_or(&StereoFrame::zero()));
        } else {
            out.push(StereoFrame::lerp(frames[idx], frames[idx + 1], frac));
        }
    }
    out
}
