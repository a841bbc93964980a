//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Channel、AudioCache、TtsEngine、AudioTranscoder）
//! - commands: SpeakCommand 及其处理器（合成流水线、播放状态机、编排）
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{
        detect_format, PlaybackController, PlaybackPlan, PlaybackReport, PlaybackState,
        SpeakHandler, SynthesisPipeline,
    },
    SpeakCommand, SpeakResponse,
};

pub use error::ApplicationError;

pub use ports::{
    // Audio cache
    cache_enabled,
    generate_cache_key,
    AudioCachePort,
    CacheError,
    // Transcoder
    AudioTranscoderPort,
    TranscodeConfig,
    TranscodeError,
    TranscoderTier,
    // Channel
    ChannelError,
    ChannelPort,
    ParsedResponse,
    // TTS engine
    SynthesisRequest,
    TtsEnginePort,
    TtsError,
};
