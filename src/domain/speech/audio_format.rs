//! 目标音频格式
//!
//! 主机按文件扩展名识别 raw signed-linear 音频的采样率，因此扩展名与采样率必须一一对应

use regex::Regex;
use std::sync::LazyLock;

use super::SpeechError;

/// 16-bit 单声道 raw signed-linear 格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFormat {
    #[default]
    Sln,
    Sln12,
    Sln16,
    Sln32,
    Sln44,
    Sln48,
}

/// 原生编码名称 → 目标格式，按顺序匹配，先命中者生效
static NATIVE_FORMAT_RULES: LazyLock<Vec<(Regex, TargetFormat)>> = LazyLock::new(|| {
    [
        (r"(silk|sln)12", TargetFormat::Sln12),
        (r"(speex|slin|silk)16|g722|siren7", TargetFormat::Sln16),
        (r"(speex|slin|celt)32|siren14", TargetFormat::Sln32),
        (r"(celt|slin)44", TargetFormat::Sln44),
        (r"(celt|slin)48", TargetFormat::Sln48),
    ]
    .into_iter()
    .map(|(pattern, format)| {
        (
            Regex::new(pattern).expect("native format pattern is valid"),
            format,
        )
    })
    .collect()
});

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Sln => "sln",
            Self::Sln12 => "sln12",
            Self::Sln16 => "sln16",
            Self::Sln32 => "sln32",
            Self::Sln44 => "sln44",
            Self::Sln48 => "sln48",
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::Sln => 8000,
            Self::Sln12 => 12000,
            Self::Sln16 => 16000,
            Self::Sln32 => 32000,
            Self::Sln44 => 44100,
            Self::Sln48 => 48000,
        }
    }

    /// 由显式配置的采样率得到格式
    pub fn from_sample_rate(rate: u32) -> Result<Self, SpeechError> {
        match rate {
            8000 => Ok(Self::Sln),
            12000 => Ok(Self::Sln12),
            16000 => Ok(Self::Sln16),
            32000 => Ok(Self::Sln32),
            44100 => Ok(Self::Sln44),
            48000 => Ok(Self::Sln48),
            other => Err(SpeechError::UnsupportedSampleRate(other)),
        }
    }

    /// 根据通道原生编码名称推断格式，未匹配时回落到 8kHz
    pub fn detect_from_native(native_format: &str) -> Self {
        NATIVE_FORMAT_RULES
            .iter()
            .find(|(pattern, _)| pattern.is_match(native_format))
            .map(|(_, format)| *format)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.extension(), self.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(native: &str) -> (&'static str, u32) {
        let format = TargetFormat::detect_from_native(native);
        (format.extension(), format.sample_rate())
    }

    #[test]
    fn test_detect_wideband_slin() {
        assert_eq!(detect("slin16"), ("sln16", 16000));
        assert_eq!(detect("(slin16)"), ("sln16", 16000));
    }

    #[test]
    fn test_detect_unknown_defaults_to_narrowband() {
        assert_eq!(detect("ulaw"), ("sln", 8000));
        assert_eq!(detect(""), ("sln", 8000));
        assert_eq!(detect("gsm"), ("sln", 8000));
    }

    #[test]
    fn test_detect_legacy_codecs() {
        assert_eq!(detect("g722"), ("sln16", 16000));
        assert_eq!(detect("siren7"), ("sln16", 16000));
        assert_eq!(detect("siren14"), ("sln32", 32000));
        assert_eq!(detect("silk12"), ("sln12", 12000));
        assert_eq!(detect("speex32"), ("sln32", 32000));
        assert_eq!(detect("celt44"), ("sln44", 44100));
        assert_eq!(detect("slin48"), ("sln48", 48000));
    }

    #[test]
    fn test_detect_first_rule_wins() {
        // 同时包含 12k 与 16k 编码时取优先级更高的 12k
        assert_eq!(detect("(silk12|slin16)"), ("sln12", 12000));
        assert_eq!(detect("(g722|slin48)"), ("sln16", 16000));
    }

    #[test]
    fn test_from_sample_rate() {
        assert_eq!(TargetFormat::from_sample_rate(8000).unwrap(), TargetFormat::Sln);
        assert_eq!(TargetFormat::from_sample_rate(44100).unwrap(), TargetFormat::Sln44);
        assert_eq!(
            TargetFormat::from_sample_rate(22050),
            Err(SpeechError::UnsupportedSampleRate(22050))
        );
    }
}
