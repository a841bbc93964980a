//! Sox Transcoder - 基于外部命令的音频转码器
//!
//! 转码分两步：
//! 1. `mpg123` 将合成服务返回的 MP3 解码为 WAV
//! 2. `sox` 重采样为 16-bit 单声道 raw，并按语速调整节奏
//!
//! 节奏调整按 sox 版本分级：
//! - >= 14.3: `tempo -s <speed>`
//! - 更早版本: `stretch <1/speed> 80`

use async_trait::async_trait;
use regex::Regex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use tokio::process::Command;

use crate::application::ports::{
    AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscoderTier,
};
use crate::domain::speech::Speed;

/// 时域拉伸的窗口大小（毫秒）
pub const STRETCH_WINDOW_MS: u32 = 80;

/// 支持原生 tempo 的最低 sox 版本
const TEMPO_MIN_VERSION: (u32, u32) = (14, 3);

static SOX_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v(\d+)\.(\d+)").expect("sox version pattern is valid"));

/// 外部工具路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub mpg123: PathBuf,
    pub sox: PathBuf,
}

impl ToolPaths {
    /// 查找外部工具，显式配置优先，否则搜索 PATH
    pub fn locate(mpg123: Option<&Path>, sox: Option<&Path>) -> Result<Self, TranscodeError> {
        Ok(Self {
            mpg123: locate_tool("mpg123", mpg123)?,
            sox: locate_tool("sox", sox)?,
        })
    }
}

fn locate_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf, TranscodeError> {
    let found = match configured {
        Some(path) => which::which(path),
        None => which::which(name),
    };
    found.map_err(|e| TranscodeError::ToolNotFound(format!("{}: {}", name, e)))
}

/// 解析 `sox --version` 输出中的主次版本号
pub fn parse_sox_version(output: &str) -> Option<(u32, u32)> {
    let captures = SOX_VERSION.captures(output)?;
    let major = captures.get(1)?.as_str().parse().ok()?;
    let minor = captures.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

/// 根据版本号选择能力等级
pub fn tier_for_version(version: (u32, u32)) -> TranscoderTier {
    if version >= TEMPO_MIN_VERSION {
        TranscoderTier::NativeTempo
    } else {
        TranscoderTier::TimeStretch
    }
}

/// 探测 sox 能力等级，无法识别版本时使用回退模式
pub async fn probe_tier(sox: &Path) -> TranscoderTier {
    let output = Command::new(sox)
        .arg("--version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    let version = match output {
        Ok(output) => parse_sox_version(&String::from_utf8_lossy(&output.stdout)),
        Err(e) => {
            tracing::warn!(sox = %sox.display(), error = %e, "Failed to query sox version");
            None
        }
    };

    match version {
        Some(version) => {
            let tier = tier_for_version(version);
            tracing::debug!(major = version.0, minor = version.1, tier = %tier, "Detected sox version");
            tier
        }
        None => {
            tracing::warn!("Unknown sox version, falling back to time-stretch");
            TranscoderTier::TimeStretch
        }
    }
}

/// 按能力等级创建转码器
pub fn select_transcoder(tools: ToolPaths, tier: TranscoderTier) -> Arc<dyn AudioTranscoderPort> {
    match tier {
        TranscoderTier::NativeTempo => Arc::new(SoxTempoTranscoder::new(tools)),
        TranscoderTier::TimeStretch => Arc::new(SoxStretchTranscoder::new(tools)),
    }
}

fn decode_args(input: &Path, wav: &Path) -> Vec<OsString> {
    vec![
        "-q".into(),
        "-w".into(),
        wav.as_os_str().to_owned(),
        input.as_os_str().to_owned(),
    ]
}

fn resample_args(
    wav: &Path,
    output: &Path,
    config: &TranscodeConfig,
    effect: &[String],
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        wav.as_os_str().to_owned(),
        "-q".into(),
        "-r".into(),
        config.format.sample_rate().to_string().into(),
        "-b".into(),
        "16".into(),
        "-c".into(),
        "1".into(),
        "-t".into(),
        "raw".into(),
        output.as_os_str().to_owned(),
    ];
    args.extend(effect.iter().map(OsString::from));
    args
}

async fn run_tool(tool: &Path, args: &[OsString]) -> Result<(), TranscodeError> {
    let name = tool
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| tool.display().to_string());

    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| TranscodeError::SpawnFailed {
            tool: name.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        tracing::debug!(
            tool = %name,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "External tool failed"
        );
        return Err(TranscodeError::ToolFailed {
            tool: name,
            status: output.status.to_string(),
        });
    }
    Ok(())
}

/// 解码 → 重采样，WAV 中间文件总是被删除
async fn decode_and_resample(
    tools: &ToolPaths,
    input: &Path,
    output: &Path,
    config: &TranscodeConfig,
    effect: &[String],
) -> Result<(), TranscodeError> {
    let wav = output.with_extension("wav");

    let result = async {
        run_tool(&tools.mpg123, &decode_args(input, &wav)).await?;
        run_tool(&tools.sox, &resample_args(&wav, output, config, effect)).await
    }
    .await;

    if let Err(e) = tokio::fs::remove_file(&wav).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %wav.display(), error = %e, "Failed to remove intermediate wav");
        }
    }
    result
}

/// 使用 sox 原生 `tempo` 调整语速
pub struct SoxTempoTranscoder {
    tools: ToolPaths,
}

impl SoxTempoTranscoder {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }

    fn speed_effect(speed: Speed) -> Vec<String> {
        if speed.is_normal() {
            return Vec::new();
        }
        vec!["tempo".into(), "-s".into(), speed.to_string()]
    }
}

#[async_trait]
impl AudioTranscoderPort for SoxTempoTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        config: &TranscodeConfig,
    ) -> Result<(), TranscodeError> {
        let effect = Self::speed_effect(config.speed);
        decode_and_resample(&self.tools, input, output, config, &effect).await
    }

    fn tier(&self) -> TranscoderTier {
        TranscoderTier::NativeTempo
    }
}

/// 旧版 sox：使用 `stretch` 时域拉伸调整语速
pub struct SoxStretchTranscoder {
    tools: ToolPaths,
}

impl SoxStretchTranscoder {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }

    fn speed_effect(speed: Speed) -> Vec<String> {
        if speed.is_normal() {
            return Vec::new();
        }
        vec![
            "stretch".into(),
            (1.0 / speed.factor()).to_string(),
            STRETCH_WINDOW_MS.to_string(),
        ]
    }
}

#[async_trait]
impl AudioTranscoderPort for SoxStretchTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        config: &TranscodeConfig,
    ) -> Result<(), TranscodeError> {
        let effect = Self::speed_effect(config.speed);
        decode_and_resample(&self.tools, input, output, config, &effect).await
    }

    fn tier(&self) -> TranscoderTier {
        TranscoderTier::TimeStretch
    }
}
