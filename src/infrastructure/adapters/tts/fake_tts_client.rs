//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 始终写出固定的音频内容，不实际调用合成服务，并记录收到的请求

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;

use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError};

/// Fake TTS Client
pub struct FakeTtsClient {
    audio_data: Vec<u8>,
    /// 设置后每次调用都返回该错误
    failure: Option<TtsError>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl FakeTtsClient {
    pub fn new(audio_data: Vec<u8>) -> Self {
        Self {
            audio_data,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: TtsError) -> Self {
        Self {
            audio_data: Vec::new(),
            failure: Some(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize_to_file(
        &self,
        request: &SynthesisRequest,
        dest: &Path,
    ) -> Result<u64, TtsError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        tracing::debug!(
            text_len = request.text.len(),
            language = %request.language,
            "FakeTtsClient: returning fixed audio"
        );

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        tokio::fs::write(dest, &self.audio_data)
            .await
            .map_err(|e| TtsError::IoError(e.to_string()))?;
        Ok(self.audio_data.len() as u64)
    }
}
