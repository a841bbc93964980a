//! 应用层错误定义
//!
//! 所有错误对本次调用都是终止性的

use thiserror::Error;

use crate::application::ports::{CacheError, ChannelError, TranscodeError, TtsError};
use crate::domain::speech::SpeechError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 缺少必需的外部能力（启动时）
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 输入无效（清洗后为空等）
    #[error("Input error: {0}")]
    Input(#[from] SpeechError),

    /// 控制通道读写失败
    #[error("Transport error: {0}")]
    Transport(String),

    /// 通道状态查询或应答失败
    #[error("Channel error: {0}")]
    Channel(String),

    /// 合成服务不可达或返回失败
    #[error("Fetch error: {0}")]
    Fetch(#[from] TtsError),

    /// 转码失败
    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    /// 缓存写入失败
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// 外部终止信号
    #[error("Interrupted by signal: {0}")]
    Interrupted(String),
}

impl ApplicationError {
    /// 创建配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// 控制通道是否已不可用
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Interrupted(_))
    }
}

impl From<ChannelError> for ApplicationError {
    fn from(err: ChannelError) -> Self {
        if err.is_transport() {
            Self::Transport(err.to_string())
        } else {
            Self::Channel(err.to_string())
        }
    }
}
