//! AGI 控制通道
//!
//! - environment: 启动时主机发送的 `agi_*` 变量头
//! - protocol: 响应行解码
//! - client: ChannelPort 的 stdin/stdout 实现

mod client;
mod environment;
mod protocol;

pub use client::{AgiClient, StdioAgiClient};
pub use environment::AgiEnvironment;
pub use protocol::{decode_response, is_multiline_usage, is_usage_end};
