//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod audio_transcoder;
mod channel;
mod tts_engine;

pub use audio_cache::{
    cache_enabled, generate_cache_key, AudioCachePort, CacheError, CACHE_KEY_LEN,
    MAX_EXTENSION_LEN,
};
pub use audio_transcoder::{AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscoderTier};
pub use channel::{ChannelError, ChannelPort, ParsedResponse, CHANNEL_STATUS_RINGING};
pub use tts_engine::{SynthesisRequest, TtsEnginePort, TtsError};
