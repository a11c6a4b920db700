use std::path::PathBuf;

/// Errors raised while turning a sample locator into a decoded buffer.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no sample locator given")]
    EmptyLocator,

    #[error("sample file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("sample contains no audio frames")]
    Empty,

    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
