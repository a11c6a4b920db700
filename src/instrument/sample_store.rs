use std::sync::Arc;

use crate::audio::SampleBuffer;

pub struct SampleAsset {
    pub locator: String,
    pub buffer: Arc<SampleBuffer>,
}

// Holds the decoded sample new voices read from. Voices keep their own Arc,
// so swapping the asset never disturbs anything already sounding.
#[derive(Default)]
pub struct SampleStore {
    asset: Option<SampleAsset>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> Option<&Arc<SampleBuffer>> {
        self.asset.as_ref().map(|a| &a.buffer)
    }

    pub fn locator(&self) -> Option<&str> {
        self.asset.as_ref().map(|a| a.locator.as_str())
    }

    // swap in a freshly decoded asset, handing back the previous one
    pub fn replace(&mut self, locator: String, buffer: Arc<SampleBuffer>) -> Option<SampleAsset> {
        log::info!(
            "sample {locator:?} ready ({} frames, {:.2}s)",
            buffer.len(),
            buffer.duration_secs()
        );
        self.asset.replace(SampleAsset { locator, buffer })
    }
}
