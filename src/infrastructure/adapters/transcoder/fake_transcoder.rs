//! Fake Transcoder - 用于测试的转码器
//!
//! 不调用外部工具，输出为格式扩展名前缀加原始输入

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::{
    AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscoderTier,
};
use crate::domain::speech::TargetFormat;

pub struct FakeTranscoder {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// 每次调用都以工具失败返回
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 给定输入时的预期输出
    pub fn render(input: &[u8], format: TargetFormat) -> Vec<u8> {
        let mut rendered = format!("{}:", format.extension()).into_bytes();
        rendered.extend_from_slice(input);
        rendered
    }
}

impl Default for FakeTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioTranscoderPort for FakeTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        config: &TranscodeConfig,
    ) -> Result<(), TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(TranscodeError::ToolFailed {
                tool: "fake".to_string(),
                status: "exit status: 1".to_string(),
            });
        }

        let source = tokio::fs::read(input)
            .await
            .map_err(|e| TranscodeError::IoError(e.to_string()))?;
        tokio::fs::write(output, Self::render(&source, config.format))
            .await
            .map_err(|e| TranscodeError::IoError(e.to_string()))
    }

    fn tier(&self) -> TranscoderTier {
        TranscoderTier::NativeTempo
    }
}
