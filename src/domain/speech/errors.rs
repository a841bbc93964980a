//! Speech Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SpeechError {
    #[error("清洗后的文本为空")]
    EmptyText,

    #[error("无效的语言标签: {0}")]
    InvalidLanguage(String),

    #[error("无效的打断按键集合: {0}")]
    InvalidInterruptKeys(String),

    #[error("无效的语速: {0}")]
    InvalidSpeed(String),

    #[error("无效的分段长度: {0}")]
    InvalidChunkSize(usize),

    #[error("不支持的采样率: {0}")]
    UnsupportedSampleRate(u32),
}
