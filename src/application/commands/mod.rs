//! 应用层 - 命令
//!
//! 一次调用对应一条 SpeakCommand

mod speak_commands;

pub mod handlers;

pub use speak_commands::*;
