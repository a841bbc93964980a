//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（agitts.toml / agitts.local.toml / /etc/asterisk/agitts.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::speech::{Language, TargetFormat};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径，靠后的优先
const CONFIG_FILE_NAMES: &[&str] = &["/etc/asterisk/agitts", "agitts", "agitts.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `AGITTS_TTS__URL=http://tts.local/api`
/// - `AGITTS_CACHE__DIR=/var/lib/asterisk/agitts`
/// - `AGITTS_AUDIO__SAMPLE_RATE=16000`
/// - `AGITTS_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("tts.url", "https://translate.google.com/translate_tts")?
        .set_default("tts.timeout_secs", 10)?
        .set_default("speech.default_language", "en-US")?
        .set_default("speech.default_speed", 1.0)?
        .set_default("cache.enabled", true)?
        .set_default("cache.dir", "/tmp")?
        .set_default("cache.max_path", 255)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?
        .set_default("log.console", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: AGITTS_TTS__TIMEOUT_SECS=5
    builder = builder.add_source(
        Environment::with_prefix("AGITTS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "TTS timeout cannot be 0".to_string(),
        ));
    }

    if let Some(rate) = config.audio.sample_rate {
        TargetFormat::from_sample_rate(rate)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    }

    if !(config.speech.default_speed > 0.0 && config.speech.default_speed.is_finite()) {
        return Err(ConfigError::ValidationError(format!(
            "Default speed must be positive, got {}",
            config.speech.default_speed
        )));
    }

    Language::parse(&config.speech.default_language)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::debug!("=== Application Configuration ===");
    tracing::debug!("TTS URL: {}", config.tts.url);
    tracing::debug!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::debug!(
        "Speech Defaults: language={}, speed={}",
        config.speech.default_language,
        config.speech.default_speed
    );
    match config.audio.sample_rate {
        Some(rate) => tracing::debug!("Sample Rate: {}", rate),
        None => tracing::debug!("Sample Rate: auto"),
    }
    tracing::debug!("Cache Enabled: {}", config.cache.enabled);
    if config.cache.enabled {
        tracing::debug!("Cache Directory: {:?}", config.cache.dir);
    }
    tracing::debug!("Log Level: {}", config.log.level);
    tracing::debug!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_timeout() {
        let mut config = AppConfig::default();
        config.tts.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unsupported_rate() {
        let mut config = AppConfig::default();
        config.audio.sample_rate = Some(22050);
        assert!(validate_config(&config).is_err());

        config.audio.sample_rate = Some(16000);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_bad_speech_defaults() {
        let mut config = AppConfig::default();
        config.speech.default_speed = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.speech.default_language = "english".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let file = write_config(
            r#"
[tts]
timeout_secs = 5

[audio]
sample_rate = 8000

[cache]
dir = "/var/lib/asterisk/agitts"
"#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.tts.timeout_secs, 5);
        assert_eq!(config.tts.url, "https://translate.google.com/translate_tts");
        assert_eq!(config.audio.sample_rate, Some(8000));
        assert_eq!(config.cache.dir, PathBuf::from("/var/lib/asterisk/agitts"));
        assert_eq!(config.cache.max_path, 255);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let file = write_config("[audio]\nsample_rate = 11025\n");
        let err = load_config_from_path(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
