mod error;
pub mod sample_loader;

pub use error::LoadError;
