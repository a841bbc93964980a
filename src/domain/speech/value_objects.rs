//! Speech Context - Value Objects

use regex::Regex;
use std::sync::LazyLock;

use super::SpeechError;

/// `any` 对应的完整打断按键集合
pub const ALL_INTERRUPT_KEYS: &str = "0123456789#*";

static LANGUAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}(-[a-zA-Z]{2,6})?$").expect("language pattern is valid")
});

static SPEED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("speed pattern is valid"));

/// 语言标签 (`xx` 或 `xx-XX`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language(String);

impl Language {
    pub fn parse(tag: &str) -> Result<Self, SpeechError> {
        let tag = tag.trim();
        if LANGUAGE_PATTERN.is_match(tag) {
            Ok(Self(tag.to_string()))
        } else {
            Err(SpeechError::InvalidLanguage(tag.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self("en-US".to_string())
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 允许打断播放的按键集合
///
/// 空集合表示播放不可打断
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterruptKeys(String);

impl InterruptKeys {
    /// 解析打断按键参数
    ///
    /// - `any` → `0123456789#*`
    /// - 由 `0-9`、`*`、`#` 组成的字符串 → 原样使用
    /// - 空字符串 → 不可打断
    pub fn parse(token: &str) -> Result<Self, SpeechError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Self::none());
        }
        if token.eq_ignore_ascii_case("any") {
            return Ok(Self::any());
        }
        if token
            .chars()
            .all(|c| c.is_ascii_digit() || c == '*' || c == '#')
        {
            return Ok(Self(token.to_string()));
        }
        Err(SpeechError::InvalidInterruptKeys(token.to_string()))
    }

    pub fn any() -> Self {
        Self(ALL_INTERRUPT_KEYS.to_string())
    }

    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 语速倍率，必须为正数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed(f64);

impl Speed {
    pub fn parse(value: &str) -> Result<Self, SpeechError> {
        let value = value.trim();
        if !SPEED_PATTERN.is_match(value) {
            return Err(SpeechError::InvalidSpeed(value.to_string()));
        }
        value
            .parse::<f64>()
            .map_err(|_| SpeechError::InvalidSpeed(value.to_string()))
            .and_then(Self::new)
    }

    pub fn new(factor: f64) -> Result<Self, SpeechError> {
        if factor.is_finite() && factor > 0.0 {
            Ok(Self(factor))
        } else {
            Err(SpeechError::InvalidSpeed(factor.to_string()))
        }
    }

    pub fn factor(&self) -> f64 {
        self.0
    }

    /// 语速为 1 时无需调整节奏
    pub fn is_normal(&self) -> bool {
        (self.0 - 1.0).abs() < f64::EPSILON
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(1.0)
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 单个音频片段的播放结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// 播放完毕，继续下一片段
    Completed,
    /// 主叫按键打断
    Interrupted(char),
    /// 主机返回失败
    Failed,
}

impl PlaybackOutcome {
    /// 是否应继续播放后续片段
    pub fn should_continue(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
