//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::infrastructure::adapters::DEFAULT_USER_AGENT;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 合成服务配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 朗读参数默认值
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 临时文件配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 外部工具配置
    #[serde(default)]
    pub tools: ToolsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 合成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 服务 URL（不含查询参数）
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 单次请求超时（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_tts_url() -> String {
    "https://translate.google.com/translate_tts".to_string()
}

fn default_tts_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// 朗读参数默认值，命令行未给出或无效时使用
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default = "default_speed")]
    pub default_speed: f64,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_speed() -> f64 {
    1.0
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            default_speed: default_speed(),
        }
    }
}

/// 音频配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioConfig {
    /// 显式采样率，设置后跳过通道原生格式探测
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// 缓存目录
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// 主机可接受的最长文件路径
    #[serde(default = "default_max_path")]
    pub max_path: usize,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_max_path() -> usize {
    255
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: default_cache_dir(),
            max_path: default_max_path(),
        }
    }
}

/// 临时文件配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// 临时目录的父目录，未设置时使用系统临时目录
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

/// 外部工具路径，未设置时在 PATH 中查找
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub mpg123: Option<PathBuf>,

    #[serde(default)]
    pub sox: Option<PathBuf>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json: bool,

    /// 是否将错误同时写入主机控制台
    #[serde(default)]
    pub console: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            console: false,
        }
    }
}
