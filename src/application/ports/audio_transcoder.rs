//! Audio Transcoder Port - 音频转码抽象
//!
//! 将合成服务返回的音频转为主机可直接播放的 16-bit 单声道 raw signed-linear 格式

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::speech::{Speed, TargetFormat};

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to spawn {tool}: {reason}")]
    SpawnFailed { tool: String, reason: String },

    #[error("{tool} exited with {status}")]
    ToolFailed { tool: String, status: String },

    #[error("IO error: {0}")]
    IoError(String),
}

/// 转码器能力等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscoderTier {
    /// 原生节奏调整 (`tempo`)
    NativeTempo,
    /// 时域拉伸回退 (`stretch`)
    TimeStretch,
}

impl std::fmt::Display for TranscoderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscoderTier::NativeTempo => write!(f, "tempo"),
            TranscoderTier::TimeStretch => write!(f, "stretch"),
        }
    }
}

/// 转码配置
#[derive(Debug, Clone, Copy)]
pub struct TranscodeConfig {
    /// 目标格式（决定采样率）
    pub format: TargetFormat,
    /// 语速倍率，为 1 时不调整
    pub speed: Speed,
}

/// Audio Transcoder Port
#[async_trait]
pub trait AudioTranscoderPort: Send + Sync {
    /// 将 `input` 转码写入 `output`
    ///
    /// 实现负责清理自身产生的中间文件
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        config: &TranscodeConfig,
    ) -> Result<(), TranscodeError>;

    /// 当前实现的能力等级
    fn tier(&self) -> TranscoderTier;
}
