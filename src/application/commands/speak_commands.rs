//! Speak Commands - 文本转语音播放命令

use crate::domain::speech::{InterruptKeys, Language, PlaybackOutcome, Speed, TargetFormat};

/// 合成并播放一段文本
#[derive(Debug, Clone)]
pub struct SpeakCommand {
    /// 原始文本（未清洗）
    pub text: String,
    pub language: Language,
    pub interrupt_keys: InterruptKeys,
    pub speed: Speed,
}

/// 播放结果
#[derive(Debug, Clone)]
pub struct SpeakResponse {
    /// 目标音频格式
    pub format: TargetFormat,
    /// 文本片段总数
    pub chunks_total: usize,
    /// 已开始播放的片段数
    pub chunks_played: usize,
    /// 命中缓存的片段数
    pub cache_hits: usize,
    /// 最后一个播放片段的结果
    pub outcome: PlaybackOutcome,
}
