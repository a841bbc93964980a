//! TTS Engine Port - 远端语音合成服务抽象
//!
//! 合成服务被视为不透明的黑盒：给定语言与文本，返回音频字节

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::speech::Language;

/// TTS 错误
#[derive(Debug, Clone, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本片段（未转义）
    pub text: String,
    /// 语言标签
    pub language: Language,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成音频并写入 `dest`，返回写入的字节数
    async fn synthesize_to_file(
        &self,
        request: &SynthesisRequest,
        dest: &Path,
    ) -> Result<u64, TtsError>;
}
