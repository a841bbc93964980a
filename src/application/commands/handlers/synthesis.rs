//! Synthesis Pipeline - 缓存未命中时生成可播放音频
//!
//! 获取（远端合成）→ 转码（目标采样率 + 语速调整）→ 交由调用方写入缓存

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioTranscoderPort, ChannelError, ChannelPort, SynthesisRequest, TranscodeConfig,
    TtsEnginePort,
};
use crate::domain::speech::{Language, Speed, TargetFormat};

/// 合成流水线
///
/// 所有中间文件都写在调用方提供的私有临时目录内
pub struct SynthesisPipeline {
    tts_engine: Arc<dyn TtsEnginePort>,
    transcoder: Arc<dyn AudioTranscoderPort>,
    scratch_dir: PathBuf,
}

impl SynthesisPipeline {
    pub fn new(
        tts_engine: Arc<dyn TtsEnginePort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tts_engine,
            transcoder,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// 为一个文本片段生成音频，返回转码后临时文件的路径
    ///
    /// 下载得到的原始音频在返回前删除；转码结果由调用方写入缓存或播放后删除
    pub async fn synthesize(
        &self,
        chunk: &str,
        chunk_index: usize,
        language: &Language,
        speed: Speed,
        format: TargetFormat,
    ) -> Result<PathBuf, ApplicationError> {
        let fetched = self.scratch_dir.join(format!("chunk_{}.mp3", chunk_index));
        let output = self
            .scratch_dir
            .join(format!("chunk_{}.{}", chunk_index, format.extension()));

        let request = SynthesisRequest::new(chunk, language.clone());
        let fetch_result = self.tts_engine.synthesize_to_file(&request, &fetched).await;
        let fetched_bytes = match fetch_result {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_quietly(&fetched).await;
                tracing::error!(chunk_index, error = %e, "Failed to fetch synthesized audio");
                return Err(e.into());
            }
        };

        tracing::debug!(
            chunk_index,
            fetched_bytes,
            format = %format,
            speed = %speed,
            tier = %self.transcoder.tier(),
            "Transcoding synthesized audio"
        );

        let config = TranscodeConfig { format, speed };
        let transcode_result = self.transcoder.transcode(&fetched, &output, &config).await;
        remove_quietly(&fetched).await;

        if let Err(e) = transcode_result {
            remove_quietly(&output).await;
            tracing::error!(chunk_index, error = %e, "Failed to transcode audio");
            return Err(e.into());
        }

        Ok(output)
    }
}

/// 确定目标音频格式
///
/// 显式配置的采样率优先；否则查询通道原生编码并映射
pub async fn detect_format<C>(
    channel: &mut C,
    explicit: Option<TargetFormat>,
) -> Result<TargetFormat, ChannelError>
where
    C: ChannelPort + ?Sized,
{
    if let Some(format) = explicit {
        tracing::debug!(format = %format, "Using configured sample rate");
        return Ok(format);
    }

    let native = channel.native_audio_format().await?;
    let format = TargetFormat::detect_from_native(&native);
    tracing::debug!(native = %native, format = %format, "Detected target format");
    Ok(format)
}

/// 删除文件，忽略不存在等错误
pub(crate) async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
        }
    }
}
