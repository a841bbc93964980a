//! Speak Handler - 整体编排
//!
//! 清洗文本 → 应答通道 → 确定目标格式 → 分段 → 逐段播放

use crate::application::commands::speak_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{ChannelError, ChannelPort};
use crate::domain::speech::TargetFormat;
use crate::domain::{sanitize_text, segment_text, SegmentConfig};

use super::playback::{PlaybackController, PlaybackPlan};
use super::synthesis::detect_format;

/// Speak Handler
pub struct SpeakHandler {
    controller: PlaybackController,
    /// 显式配置的采样率对应的格式，None 表示按通道原生格式推断
    explicit_format: Option<TargetFormat>,
    segment_config: SegmentConfig,
    /// 失败时是否通过 VERBOSE 将诊断信息转发到主机控制台
    console_relay: bool,
}

impl SpeakHandler {
    pub fn new(controller: PlaybackController, explicit_format: Option<TargetFormat>) -> Self {
        Self {
            controller,
            explicit_format,
            segment_config: SegmentConfig::default(),
            console_relay: false,
        }
    }

    pub fn with_console_relay(mut self, enabled: bool) -> Self {
        self.console_relay = enabled;
        self
    }

    pub async fn handle<C>(
        &self,
        channel: &mut C,
        cmd: SpeakCommand,
    ) -> Result<SpeakResponse, ApplicationError>
    where
        C: ChannelPort + ?Sized,
    {
        let result = self.run(channel, &cmd).await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "Speak command failed");
            // 传输层故障后通道已不可用
            if self.console_relay && !e.is_transport() {
                if let Err(relay_err) = channel.verbose(&format!("agitts: {}", e), 1).await {
                    tracing::warn!(error = %relay_err, "Failed to relay error to console");
                }
            }
        }

        result
    }

    async fn run<C>(&self, channel: &mut C, cmd: &SpeakCommand) -> Result<SpeakResponse, ApplicationError>
    where
        C: ChannelPort + ?Sized,
    {
        // 在任何网络访问之前校验输入
        let text = sanitize_text(&cmd.text)?;

        if !channel.channel_answered().await? {
            return Err(ChannelError::StatusUnavailable.into());
        }

        let format = detect_format(channel, self.explicit_format).await?;
        let chunks = segment_text(&text, &self.segment_config)?;

        tracing::info!(
            chunks = chunks.len(),
            language = %cmd.language,
            speed = %cmd.speed,
            format = %format,
            interrupt_keys = %cmd.interrupt_keys.as_str(),
            cache_enabled = self.controller.cache_enabled(),
            "Starting playback"
        );

        let plan = PlaybackPlan {
            chunks: &chunks,
            language: &cmd.language,
            speed: cmd.speed,
            interrupt_keys: &cmd.interrupt_keys,
            format,
        };
        let report = self.controller.play(channel, &plan).await?;

        tracing::info!(
            chunks_total = report.chunks_total,
            chunks_played = report.chunks_played,
            cache_hits = report.cache_hits,
            outcome = ?report.outcome,
            "Playback finished"
        );

        Ok(SpeakResponse {
            format,
            chunks_total: report.chunks_total,
            chunks_played: report.chunks_played,
            cache_hits: report.cache_hits,
            outcome: report.outcome,
        })
    }
}
