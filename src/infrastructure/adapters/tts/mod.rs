//! TTS Adapter - 远端合成服务客户端

mod fake_tts_client;
mod http_tts_client;

pub use fake_tts_client::FakeTtsClient;
pub use http_tts_client::*;
