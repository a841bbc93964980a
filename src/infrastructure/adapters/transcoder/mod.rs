//! 音频转码适配器

mod fake_transcoder;
mod sox_transcoder;

pub use fake_transcoder::FakeTranscoder;
pub use sox_transcoder::*;
