//! Command Handlers 实现
//!
//! - synthesis: 缓存未命中时的 获取 → 转码 流水线
//! - playback: 逐片段播放的状态机
//! - speak_handler: 整体编排

mod playback;
mod speak_handler;
mod synthesis;

pub use playback::*;
pub use speak_handler::*;
pub use synthesis::*;
