use std::sync::Arc;

use crate::audio::SampleBuffer;

// (min, max) of the mono mix for each of `columns` equal slices of the buffer
pub fn summarize(buffer: &SampleBuffer, columns: usize) -> Vec<(f32, f32)> {
    let len = buffer.len();
    if columns == 0 || len == 0 {
        return Vec::new();
    }

    (0..columns)
        .map(|col| {
            let from = col * len / columns;
            let to = ((col + 1) * len / columns).max(from + 1).min(len);
            buffer.data[from..to]
                .iter()
                .map(|f| 0.5 * (f.left + f.right))
                .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
        })
        .collect()
}

// Recomputing the summary every frame is wasteful, so keep the last one
#[derive(Default)]
pub struct WaveformCache {
    source: Option<Arc<SampleBuffer>>,
    columns: Vec<(f32, f32)>,
}

impl WaveformCache {
    pub fn get(&mut self, buffer: &Arc<SampleBuffer>, columns: usize) -> &[(f32, f32)] {
        let fresh = self.columns.len() == columns
            && self.source.as_ref().is_some_and(|s| Arc::ptr_eq(s, buffer));
        if !fresh {
            self.columns = summarize(buffer, columns);
            self.source = Some(buffer.clone());
        }
        &self.columns
    }
}
