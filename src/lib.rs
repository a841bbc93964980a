//! agitts - 电话 IVR 文本转语音播放
//!
//! 由呼叫控制主机以 AGI 方式启动：合成文本语音，转码为电话音频格式，
//! 在当前通道上逐段播放，并允许主叫按键打断
//!
//! 领域层 (domain/):
//! - speech: 语言、语速、打断按键、目标音频格式
//! - text_segmenter: 文本清洗与分段
//!
//! 应用层 (application/):
//! - Ports: Channel, AudioCache, TtsEngine, AudioTranscoder
//! - Commands: SpeakCommand 及其处理器
//!
//! 基础设施层 (infrastructure/):
//! - AGI: 行协议客户端
//! - Adapters: HTTP TTS Client, sox/mpg123 转码, 文件缓存
//! - Signal: 终止信号监听

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
