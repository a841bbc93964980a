//! Speech Context - 语音播放上下文

mod audio_format;
mod errors;
mod value_objects;

pub use audio_format::TargetFormat;
pub use errors::SpeechError;
pub use value_objects::{InterruptKeys, Language, PlaybackOutcome, Speed, ALL_INTERRUPT_KEYS};
