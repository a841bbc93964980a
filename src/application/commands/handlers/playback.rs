//! Playback Controller - 逐片段播放状态机
//!
//! 每个片段依次经历：
//!
//! ```text
//! Pending ─┬─> CacheHit ─────────────────┬─> Completed ──> 下一片段
//!          └─> Synthesizing ─> Playing ──┼─> Interrupted (终止)
//!                   │                    └─> Failed (终止)
//!                   └─> Failed (终止)
//! ```

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{generate_cache_key, AudioCachePort, ChannelPort};
use crate::domain::speech::{InterruptKeys, Language, PlaybackOutcome, Speed, TargetFormat};

use super::synthesis::{remove_quietly, SynthesisPipeline};

/// 片段播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Pending,
    CacheHit,
    Synthesizing,
    Playing,
    Interrupted(char),
    Failed,
    Completed,
}

impl PlaybackState {
    /// Completed / Interrupted / Failed 为终止状态（Completed 对单个片段而言）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Interrupted(_) | Self::Failed
        )
    }
}

/// 一次播放的参数
#[derive(Debug, Clone)]
pub struct PlaybackPlan<'a> {
    pub chunks: &'a [String],
    pub language: &'a Language,
    pub speed: Speed,
    pub interrupt_keys: &'a InterruptKeys,
    pub format: TargetFormat,
}

/// 播放汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackReport {
    pub chunks_total: usize,
    pub chunks_played: usize,
    pub cache_hits: usize,
    pub outcome: PlaybackOutcome,
}

/// 播放控制器
pub struct PlaybackController {
    /// 缓存被禁用时为 None
    audio_cache: Option<Arc<dyn AudioCachePort>>,
    pipeline: SynthesisPipeline,
}

impl PlaybackController {
    pub fn new(audio_cache: Option<Arc<dyn AudioCachePort>>, pipeline: SynthesisPipeline) -> Self {
        Self {
            audio_cache,
            pipeline,
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.audio_cache.is_some()
    }

    /// 按顺序播放所有片段
    ///
    /// 遇到打断或播放失败立即停止；合成失败作为错误返回
    pub async fn play<C>(
        &self,
        channel: &mut C,
        plan: &PlaybackPlan<'_>,
    ) -> Result<PlaybackReport, ApplicationError>
    where
        C: ChannelPort + ?Sized,
    {
        let mut report = PlaybackReport {
            chunks_total: plan.chunks.len(),
            chunks_played: 0,
            cache_hits: 0,
            outcome: PlaybackOutcome::Completed,
        };

        for (index, chunk) in plan.chunks.iter().enumerate() {
            let state = self.play_chunk(channel, plan, index, chunk, &mut report).await?;

            report.outcome = match state {
                PlaybackState::Completed => PlaybackOutcome::Completed,
                PlaybackState::Interrupted(key) => PlaybackOutcome::Interrupted(key),
                _ => PlaybackOutcome::Failed,
            };
            if report.outcome.should_continue() {
                continue;
            }

            match report.outcome {
                PlaybackOutcome::Interrupted(key) => {
                    tracing::info!(chunk_index = index, key = %key, "Playback interrupted by caller");
                }
                _ => {
                    tracing::warn!(chunk_index = index, "Playback failed, aborting remaining chunks");
                }
            }
            break;
        }

        Ok(report)
    }

    async fn play_chunk<C>(
        &self,
        channel: &mut C,
        plan: &PlaybackPlan<'_>,
        index: usize,
        chunk: &str,
        report: &mut PlaybackReport,
    ) -> Result<PlaybackState, ApplicationError>
    where
        C: ChannelPort + ?Sized,
    {
        let mut state = PlaybackState::Pending;
        let cache_key = generate_cache_key(chunk, plan.language, plan.speed);
        let extension = plan.format.extension();

        let cached = match &self.audio_cache {
            Some(cache) => cache.lookup(&cache_key, extension).await,
            None => None,
        };

        // 缓存禁用时播放的是临时文件，播放后删除
        let (path, temporary) = match cached {
            Some(path) => {
                transition(&mut state, PlaybackState::CacheHit, index);
                report.cache_hits += 1;
                (path, false)
            }
            None => {
                transition(&mut state, PlaybackState::Synthesizing, index);
                let produced = self.produce(plan, index, chunk, &cache_key).await;
                let produced = match produced {
                    Ok(produced) => produced,
                    Err(e) => {
                        transition(&mut state, PlaybackState::Failed, index);
                        return Err(e);
                    }
                };
                transition(&mut state, PlaybackState::Playing, index);
                produced
            }
        };

        tracing::debug!(
            chunk_index = index,
            cache_key = %cache_key,
            path = %path.display(),
            "Streaming chunk"
        );

        let outcome = channel.stream_file(&path, plan.interrupt_keys).await;
        if temporary {
            remove_quietly(&path).await;
        }

        // 主机拒绝播放的片段不计入已播放
        let next = match outcome? {
            PlaybackOutcome::Completed => PlaybackState::Completed,
            PlaybackOutcome::Interrupted(key) => PlaybackState::Interrupted(key),
            PlaybackOutcome::Failed => PlaybackState::Failed,
        };
        if next != PlaybackState::Failed {
            report.chunks_played += 1;
        }
        transition(&mut state, next, index);
        Ok(state)
    }

    /// 缓存未命中：合成并（在启用时）写入缓存
    async fn produce(
        &self,
        plan: &PlaybackPlan<'_>,
        index: usize,
        chunk: &str,
        cache_key: &str,
    ) -> Result<(std::path::PathBuf, bool), ApplicationError> {
        let output = self
            .pipeline
            .synthesize(chunk, index, plan.language, plan.speed, plan.format)
            .await?;

        match &self.audio_cache {
            Some(cache) => {
                let stored = cache
                    .store(cache_key, plan.format.extension(), &output)
                    .await;
                match stored {
                    Ok(path) => Ok((path, false)),
                    Err(e) => {
                        remove_quietly(&output).await;
                        Err(e.into())
                    }
                }
            }
            None => Ok((output, true)),
        }
    }
}

fn transition(state: &mut PlaybackState, next: PlaybackState, chunk_index: usize) {
    tracing::trace!(
        chunk_index,
        from = ?*state,
        to = ?next,
        terminal = next.is_terminal(),
        "Playback state transition"
    );
    *state = next;
}
