//! HTTP TTS Client - 调用远端语音合成服务
//!
//! 实现 TtsEnginePort trait
//!
//! 外部 TTS API:
//! GET {base_url}?ie=UTF-8&q=<escaped text>&tl=<language>&total=1&idx=0&textlen=<n>&client=tw-ob
//! Response: audio/mpeg binary

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError};

/// 默认请求头 User-Agent，服务端会拒绝非浏览器客户端
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// 合成服务 URL（不含查询参数）
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com/translate_tts".to_string(),
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 构造合成请求 URL
    fn synthesis_url(&self, request: &SynthesisRequest) -> String {
        let separator = if self.config.base_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}ie=UTF-8&q={}&tl={}&total=1&idx=0&textlen={}&client=tw-ob",
            self.config.base_url,
            separator,
            urlencoding::encode(&request.text),
            urlencoding::encode(request.language.as_str()),
            request.text.chars().count()
        )
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else if e.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        TtsError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize_to_file(
        &self,
        request: &SynthesisRequest,
        dest: &Path,
    ) -> Result<u64, TtsError> {
        let url = self.synthesis_url(request);

        tracing::debug!(
            text_len = request.text.len(),
            language = %request.language,
            "Sending TTS request"
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TtsError::ServiceError(format!("HTTP {}", status)));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| TtsError::IoError(e.to_string()))?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TtsError::IoError(e.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| TtsError::IoError(e.to_string()))?;

        if written == 0 {
            return Err(TtsError::InvalidResponse("Empty audio response".to_string()));
        }

        tracing::info!(
            audio_size = written,
            language = %request.language,
            "TTS synthesis completed"
        );

        Ok(written)
    }
}
