use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;

use crate::audio::SampleBuffer;
use super::error::LoadError;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

// Tags a decode request so a late result for an old locator can be told apart
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadId(pub u64);

pub fn next_load_id() -> LoadId {
    LoadId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

pub struct LoadResult {
    pub id: LoadId,
    pub locator: String,
    pub result: Result<SampleBuffer, LoadError>,
}

// "file:///x.wav", "/x.wav" and "kick.wav" (relative to the project dir)
pub fn resolve(locator: &str, base_dir: &Path) -> Result<PathBuf, LoadError> {
    let trimmed = locator.trim();
    if trimmed.is_empty() {
        return Err(LoadError::EmptyLocator);
    }
    let raw = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    let path = Path::new(raw);
    let path = if path.is_absolute() { path.to_path_buf() } else { base_dir.join(path) };

    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Ok(path),
        Ok(_) => Err(LoadError::NotFound(path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoadError::NotFound(path)),
        Err(e) => Err(LoadError::Io(e)),
    }
}

// Load a sample from disk at the engine's rate
pub fn load(locator: &str, base_dir: &Path, target_rate: u32) -> Result<SampleBuffer, LoadError> {
    let path = resolve(locator, base_dir)?;
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return Err(LoadError::UnsupportedFormat(path.display().to_string()));
    }
    SampleBuffer::load_wav(&path, target_rate)
}

// Decode on a worker thread; the result comes back over `tx`
pub fn spawn_load(
    id: LoadId,
    locator: String,
    base_dir: PathBuf,
    target_rate: u32,
    tx: Sender<LoadResult>,
) {
    let spawned = std::thread::Builder::new()
        .name("samplety-loader".into())
        .spawn(move || {
            let result = load(&locator, &base_dir, target_rate);
            let _ = tx.send(LoadResult { id, locator, result });
        });
    if let Err(e) = spawned {
        log::error!("could not spawn sample loader thread: {e}");
    }
}
