//! agitts - AGI 文本转语音播放
//!
//! 用法（拨号计划中）：
//! `AGI(agitts,"<text>",[language],[interrupt keys],[speed])`
//!
//! stdin/stdout 是与主机的控制通道，日志只写 stderr

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use agitts::application::{
    cache_enabled, ApplicationError, AudioCachePort, ChannelPort, PlaybackController, SpeakCommand,
    SpeakHandler, SynthesisPipeline, TranscoderTier,
};
use agitts::config::{load_config, print_config, AppConfig, LogConfig, SpeechConfig};
use agitts::domain::speech::{InterruptKeys, Language, PlaybackOutcome, Speed, TargetFormat};
use agitts::infrastructure::adapters::{
    probe_tier, select_transcoder, FileAudioCache, HttpTtsClient, HttpTtsClientConfig,
    ScratchSpace, ToolPaths,
};
use agitts::infrastructure::{wait_for_shutdown, StdioAgiClient};

/// 命令行参数，全部为位置参数
#[derive(Debug, Parser)]
#[command(name = "agitts", version, about = "Speak text on an AGI channel")]
struct Cli {
    /// 要朗读的文本，可以以 `-` 开头
    #[arg(allow_hyphen_values = true)]
    text: String,

    /// 语言标签，如 en-US
    #[arg(allow_hyphen_values = true)]
    language: Option<String>,

    /// 允许打断的按键，"any" 表示全部
    #[arg(allow_hyphen_values = true)]
    interrupt_keys: Option<String>,

    /// 语速倍率
    #[arg(allow_hyphen_values = true)]
    speed: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("agitts: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log);
    print_config(&config);

    match run(cli, config).await {
        Ok(PlaybackOutcome::Failed) => {
            tracing::warn!("Playback failed on the channel");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "agitts aborted");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},agitts={}", log.level, log.level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false);

    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<PlaybackOutcome> {
    let tools = ToolPaths::locate(config.tools.mpg123.as_deref(), config.tools.sox.as_deref())
        .map_err(|e| ApplicationError::configuration(e.to_string()))?;

    let mut channel = StdioAgiClient::from_stdio()
        .await
        .map_err(ApplicationError::from)?;

    let command = build_command(&cli, &config.speech);

    // 仅在需要调整语速时探测 sox 版本
    let tier = if command.speed.is_normal() {
        TranscoderTier::NativeTempo
    } else {
        probe_tier(&tools.sox).await
    };

    let explicit_format = config
        .audio
        .sample_rate
        .map(TargetFormat::from_sample_rate)
        .transpose()
        .map_err(ApplicationError::from)?;

    let audio_cache = open_cache(&config).await;

    // drop 时删除所有临时文件，包括被信号中断的情况
    let scratch = ScratchSpace::create(config.storage.temp_dir.as_deref())
        .map_err(|e| ApplicationError::configuration(format!("Cannot create temp dir: {}", e)))?;

    let tts_engine = Arc::new(
        HttpTtsClient::new(HttpTtsClientConfig {
            timeout_secs: config.tts.timeout_secs,
            user_agent: config.tts.user_agent.clone(),
            ..HttpTtsClientConfig::new(config.tts.url.clone())
        })
        .map_err(ApplicationError::from)?,
    );
    let transcoder = select_transcoder(tools, tier);
    tracing::debug!(tier = %tier, "Transcoder selected");

    let pipeline = SynthesisPipeline::new(tts_engine, transcoder, scratch.path());
    let controller = PlaybackController::new(audio_cache, pipeline);
    let handler =
        SpeakHandler::new(controller, explicit_format).with_console_relay(config.log.console);

    let outcome =
        speak_until_shutdown(&handler, &mut channel, command, scratch, wait_for_shutdown())
            .await?;
    Ok(outcome)
}

/// 播放直到完成或收到终止信号
///
/// 返回前进行中的播放 future 已被 drop（子进程随之被杀），之后才删除临时目录
async fn speak_until_shutdown<C, S>(
    handler: &SpeakHandler,
    channel: &mut C,
    command: SpeakCommand,
    scratch: ScratchSpace,
    shutdown: S,
) -> Result<PlaybackOutcome, ApplicationError>
where
    C: ChannelPort + ?Sized,
    S: Future<Output = &'static str>,
{
    let result = tokio::select! {
        result = handler.handle(channel, command) => result.map(|response| response.outcome),
        signal = shutdown => {
            tracing::info!(signal, "Received shutdown signal");
            Err(ApplicationError::Interrupted(signal.to_string()))
        }
    };
    drop(scratch);
    result
}

/// 解析位置参数，无效值回退到配置中的默认值
fn build_command(cli: &Cli, speech: &SpeechConfig) -> SpeakCommand {
    let default_language = Language::parse(&speech.default_language).unwrap_or_default();
    let language = match cli.language.as_deref().filter(|s| !s.is_empty()) {
        Some(tag) => Language::parse(tag).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid language, using default");
            default_language
        }),
        None => default_language,
    };

    let interrupt_keys = match cli.interrupt_keys.as_deref() {
        Some(token) => InterruptKeys::parse(token).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid interrupt keys, disabling interrupts");
            InterruptKeys::none()
        }),
        None => InterruptKeys::none(),
    };

    let default_speed = Speed::new(speech.default_speed).unwrap_or_default();
    let speed = match cli.speed.as_deref().filter(|s| !s.is_empty()) {
        Some(value) => Speed::parse(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid speed, using default");
            default_speed
        }),
        None => default_speed,
    };

    SpeakCommand {
        text: cli.text.clone(),
        language,
        interrupt_keys,
        speed,
    }
}

/// 缓存目录不可用时本次调用不使用缓存
async fn open_cache(config: &AppConfig) -> Option<Arc<dyn AudioCachePort>> {
    if !config.cache.enabled {
        return None;
    }

    let dir = &config.cache.dir;
    if !cache_enabled(dir, config.cache.max_path) {
        tracing::warn!(dir = %dir.display(), "Cache path too long, caching disabled");
        return None;
    }

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!(dir = %dir.display(), error = %e, "Cannot create cache dir, caching disabled");
        return None;
    }

    Some(Arc::new(FileAudioCache::new(dir)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agitts::infrastructure::adapters::{FakeTranscoder, FakeTtsClient};
    use agitts::infrastructure::AgiClient;
    use tokio::io::BufReader;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("agitts").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults_when_only_text_given() {
        let command = build_command(&cli(&["Hello"]), &SpeechConfig::default());
        assert_eq!(command.text, "Hello");
        assert_eq!(command.language.as_str(), "en-US");
        assert!(command.interrupt_keys.is_empty());
        assert!(command.speed.is_normal());
    }

    #[test]
    fn test_all_arguments_parsed() {
        let command = build_command(&cli(&["Hola", "es", "any", "1.5"]), &SpeechConfig::default());
        assert_eq!(command.language.as_str(), "es");
        assert_eq!(command.interrupt_keys.as_str(), "0123456789#*");
        assert_eq!(command.speed.factor(), 1.5);
    }

    #[test]
    fn test_text_may_start_with_hyphen() {
        let parsed = Cli::try_parse_from(["agitts", "-5 degrees outside", "en"]).unwrap();
        assert_eq!(parsed.text, "-5 degrees outside");
        assert_eq!(parsed.language.as_deref(), Some("en"));

        let parsed = Cli::try_parse_from(["agitts", "--- menu ---"]).unwrap();
        assert_eq!(parsed.text, "--- menu ---");
    }

    #[tokio::test]
    async fn test_shutdown_aborts_run_and_removes_scratch() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::create(Some(parent.path())).unwrap();
        let scratch_path = scratch.path().to_path_buf();
        std::fs::write(scratch_path.join("chunk_0.mp3"), b"partial").unwrap();

        let pipeline = SynthesisPipeline::new(
            Arc::new(FakeTtsClient::new(b"audio".to_vec())),
            Arc::new(FakeTranscoder::new()),
            scratch.path(),
        );
        let handler = SpeakHandler::new(PlaybackController::new(None, pipeline), None);

        // 主机一直不回应：读端保持打开但没有数据
        let (host_end, agi_end) = tokio::io::duplex(1024);
        let mut channel = AgiClient::new(BufReader::new(agi_end), Vec::new());

        let command = build_command(&cli(&["Hello there"]), &SpeechConfig::default());
        let err = speak_until_shutdown(&handler, &mut channel, command, scratch, async {
            "SIGTERM"
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ApplicationError::Interrupted(ref s) if s == "SIGTERM"));
        assert!(!scratch_path.exists());
        drop(host_end);
    }

    #[test]
    fn test_invalid_arguments_fall_back() {
        let command = build_command(
            &cli(&["Hello", "english", "abc", "fast"]),
            &SpeechConfig::default(),
        );
        assert_eq!(command.language.as_str(), "en-US");
        assert!(command.interrupt_keys.is_empty());
        assert!(command.speed.is_normal());
    }
}
