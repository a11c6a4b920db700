//! Streaming phase-vocoder pitch shifter.
//!
//! Shifts pitch by a ratio without changing duration: each channel is cut
//! into Hann-windowed frames (4x overlap), the true frequency of every bin is
//! recovered from its phase advance, bins are moved to `k * ratio`, and the
//! frame is resynthesized with accumulated phase and overlap-added.
//!
//! Everything is allocated in [`PitchShifter::new`]; `process` never
//! allocates, so a shifter can be built on the control thread and run in the
//! audio callback.

use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use super::frame::StereoFrame;

/// FFT size (must be power of 2)
pub const FFT_SIZE: usize = 2048;
const OVERSAMPLING: usize = 4;
const HOP: usize = FFT_SIZE / OVERSAMPLING;
const BINS: usize = FFT_SIZE / 2 + 1;

/// Frames between a sample going in and its shifted version coming out.
/// Shifted bins smear across the analysis window, so at ratios other than 1
/// a faint pre-echo can start up to a window earlier.
pub const LATENCY: usize = FFT_SIZE - HOP;

// per-channel overlap-add state
struct Channel {
    in_fifo: Vec<f32>,
    out_fifo: Vec<f32>,
    accum: Vec<f32>,
    last_phase: Vec<f32>,
    sum_phase: Vec<f32>,
}

impl Channel {
    fn new() -> Self {
        Self {
            in_fifo: vec![0.0; FFT_SIZE],
            out_fifo: vec![0.0; FFT_SIZE],
            accum: vec![0.0; FFT_SIZE],
            last_phase: vec![0.0; BINS],
            sum_phase: vec![0.0; BINS],
        }
    }
}

// FFT plans and scratch shared by both channels
struct Spectral {
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    window: Vec<f32>,
    norm: f32,
    time: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    forward_scratch: Vec<Complex<f32>>,
    inverse_scratch: Vec<Complex<f32>>,
    ana_magn: Vec<f32>,
    ana_freq: Vec<f32>,
    syn_magn: Vec<f32>,
    syn_freq: Vec<f32>,
}

impl Spectral {
    fn new(planner: &mut RealFftPlanner<f32>) -> Self {
        let forward = planner.plan_fft_forward(FFT_SIZE);
        let inverse = planner.plan_fft_inverse(FFT_SIZE);

        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                let x = i as f32 / FFT_SIZE as f32;
                0.5 * (1.0 - (TAU * x).cos())
            })
            .collect();

        // analysis and synthesis both apply the window, so overlap-add sums
        // window^2; the inverse FFT is unnormalized (scales by FFT_SIZE)
        let overlap_energy = window.iter().map(|w| w * w).sum::<f32>() / HOP as f32;
        let norm = 1.0 / (FFT_SIZE as f32 * overlap_energy);

        Self {
            time: forward.make_input_vec(),
            spectrum: forward.make_output_vec(),
            forward_scratch: forward.make_scratch_vec(),
            inverse_scratch: inverse.make_scratch_vec(),
            forward,
            inverse,
            window,
            norm,
            ana_magn: vec![0.0; BINS],
            ana_freq: vec![0.0; BINS],
            syn_magn: vec![0.0; BINS],
            syn_freq: vec![0.0; BINS],
        }
    }

    fn shift_frame(&mut self, ch: &mut Channel, ratio: f32) {
        let expected = TAU * HOP as f32 / FFT_SIZE as f32;

        for (t, (&s, &w)) in self.time.iter_mut().zip(ch.in_fifo.iter().zip(&self.window)) {
            *t = s * w;
        }
        if self
            .forward
            .process_with_scratch(&mut self.time, &mut self.spectrum, &mut self.forward_scratch)
            .is_err()
        {
            return;
        }

        // analysis: magnitude and true frequency (in bins) per bin
        for k in 0..BINS {
            let c = self.spectrum[k];
            let phase = c.arg();
            let delta = wrap_phase(phase - ch.last_phase[k] - k as f32 * expected);
            ch.last_phase[k] = phase;
            self.ana_magn[k] = c.norm();
            self.ana_freq[k] = k as f32 + delta * OVERSAMPLING as f32 / TAU;
        }

        // move every bin to k * ratio
        self.syn_magn.fill(0.0);
        self.syn_freq.fill(0.0);
        for k in 0..BINS {
            let target = (k as f32 * ratio) as usize;
            if target < BINS {
                self.syn_magn[target] += self.ana_magn[k];
                self.syn_freq[target] = self.ana_freq[k] * ratio;
            }
        }

        // synthesis: accumulate phase from the shifted frequencies
        for k in 0..BINS {
            let deviation = self.syn_freq[k] - k as f32;
            let advance = deviation * TAU / OVERSAMPLING as f32 + k as f32 * expected;
            ch.sum_phase[k] = wrap_phase(ch.sum_phase[k] + advance);
            self.spectrum[k] = Complex::from_polar(self.syn_magn[k], ch.sum_phase[k]);
        }
        // DC and Nyquist must be real for the inverse transform
        self.spectrum[0].im = 0.0;
        self.spectrum[BINS - 1].im = 0.0;

        if self
            .inverse
            .process_with_scratch(&mut self.spectrum, &mut self.time, &mut self.inverse_scratch)
            .is_err()
        {
            return;
        }

        for ((acc, &t), &w) in ch.accum.iter_mut().zip(&self.time).zip(&self.window) {
            *acc += w * t * self.norm;
        }
        ch.out_fifo[..HOP].copy_from_slice(&ch.accum[..HOP]);
        ch.accum.copy_within(HOP.., 0);
        ch.accum[FFT_SIZE - HOP..].fill(0.0);
        ch.in_fifo.copy_within(HOP.., 0);
    }
}

pub struct PitchShifter {
    ratio: f32,
    rover: usize,
    spectral: Spectral,
    left: Channel,
    right: Channel,
}

impl PitchShifter {
    pub fn new(ratio: f32, planner: &mut RealFftPlanner<f32>) -> Self {
        Self {
            ratio,
            rover: LATENCY,
            spectral: Spectral::new(planner),
            left: Channel::new(),
            right: Channel::new(),
        }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    // one frame in, one (delayed by LATENCY) frame out
    pub fn process(&mut self, input: StereoFrame) -> StereoFrame {
        let r = self.rover;
        self.left.in_fifo[r] = input.left;
        self.right.in_fifo[r] = input.right;
        let out = StereoFrame {
            left: self.left.out_fifo[r - LATENCY],
            right: self.right.out_fifo[r - LATENCY],
        };

        self.rover += 1;
        if self.rover >= FFT_SIZE {
            self.rover = LATENCY;
            self.spectral.shift_frame(&mut self.left, self.ratio);
            self.spectral.shift_frame(&mut self.right, self.ratio);
        }
        out
    }
}

// wrap to [-PI, PI]
fn wrap_phase(p: f32) -> f32 {
    p - TAU * ((p + PI) / TAU).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(cycles_per_sample: f32, len: usize) -> Vec<StereoFrame> {
        (0..len)
            .map(|i| {
                let s = 0.5 * (TAU * cycles_per_sample * i as f32).sin();
                StereoFrame { left: s, right: s }
            })
            .collect()
    }

    fn rising_crossings(out: &[StereoFrame]) -> usize {
        out.windows(2)
            .filter(|w| w[0].left <= 0.0 && w[1].left > 0.0)
            .count()
    }

    fn run(ratio: f32, input: &[StereoFrame]) -> Vec<StereoFrame> {
        let mut planner = RealFftPlanner::new();
        let mut shifter = PitchShifter::new(ratio, &mut planner);
        input.iter().map(|&f| shifter.process(f)).collect()
    }

    #[test]
    fn wrap_phase_stays_in_range() {
        for p in [-20.0f32, -PI, -1.0, 0.0, 1.0, PI + 0.1, 20.0] {
            let w = wrap_phase(p);
            assert!((-PI..=PI).contains(&w), "{p} wrapped to {w}");
            assert!(((p - w) / TAU - ((p - w) / TAU).round()).abs() < 1e-4);
        }
    }

    #[test]
    fn silence_stays_silent() {
        let out = run(1.5, &vec![StereoFrame::zero(); FFT_SIZE * 4]);
        assert!(out.iter().all(|f| f.left == 0.0 && f.right == 0.0));
    }

    fn peak(frames: &[StereoFrame]) -> f32 {
        frames.iter().fold(0.0, |m, f| m.max(f.left.abs()))
    }

    #[test]
    fn output_is_delayed_by_latency() {
        let input = sine(20.0 / FFT_SIZE as f32, FFT_SIZE * 2);
        let out = run(1.0, &input);
        assert!(peak(&out[..LATENCY]) < 1e-4);
        assert!(peak(&out[LATENCY..]) > 0.1);
    }

    #[test]
    fn shifted_output_only_smears_a_little_ahead_of_latency() {
        // a moved bin spreads over the whole window, so some energy shows up
        // before LATENCY; it stays far below the 0.5 input level
        let input = sine(20.0 / FFT_SIZE as f32, FFT_SIZE * 2);
        for ratio in [2.0, 0.5] {
            let out = run(ratio, &input);
            assert!(peak(&out[..LATENCY]) < 0.1, "ratio {ratio}");
            assert!(peak(&out[LATENCY..]) > 0.1, "ratio {ratio}");
        }
    }

    #[test]
    fn octave_up_doubles_frequency() {
        let len = FFT_SIZE * 8;
        let input = sine(20.0 / FFT_SIZE as f32, len);
        let settle = FFT_SIZE * 2;
        let span = (len - settle) as f32;

        let unity = run(1.0, &input);
        let octave = run(2.0, &input);

        let expected_unity = span * 20.0 / FFT_SIZE as f32;
        let got_unity = rising_crossings(&unity[settle..]) as f32;
        assert!((got_unity - expected_unity).abs() / expected_unity < 0.15, "unity {got_unity}");

        let expected_octave = span * 40.0 / FFT_SIZE as f32;
        let got_octave = rising_crossings(&octave[settle..]) as f32;
        assert!((got_octave - expected_octave).abs() / expected_octave < 0.15, "octave {got_octave}");
    }
}
