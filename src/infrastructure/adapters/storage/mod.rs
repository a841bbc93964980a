//! 本地存储适配器

mod file_cache;
mod scratch;

pub use file_cache::FileAudioCache;
pub use scratch::ScratchSpace;
