//! Channel Port - 呼叫控制主机通道
//!
//! 同步的行式命令/响应协议：每条命令一行，每条命令恰好读取一行响应

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::speech::{InterruptKeys, PlaybackOutcome};

/// 通道错误
#[derive(Debug, Error)]
pub enum ChannelError {
    /// 主机关闭了控制通道（通常意味着挂机）
    #[error("Control channel closed by host")]
    Closed,

    #[error("Control channel IO error: {0}")]
    IoError(String),

    #[error("Channel status query failed")]
    StatusUnavailable,

    #[error("Failed to answer channel (result={0})")]
    AnswerFailed(i64),
}

impl ChannelError {
    /// 传输层故障：通道已不可用，不能再发送任何命令
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Closed | Self::IoError(_))
    }
}

/// 解析后的响应行
///
/// 非 `200 result=<int>` 形式的响应一律视为失败 (`result_code == -1`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub result_code: i64,
    pub data: String,
}

impl ParsedResponse {
    pub const FAILURE_CODE: i64 = -1;

    pub fn new(result_code: i64, data: impl Into<String>) -> Self {
        Self {
            result_code,
            data: data.into(),
        }
    }

    pub fn failure() -> Self {
        Self::new(Self::FAILURE_CODE, String::new())
    }

    pub fn is_failure(&self) -> bool {
        self.result_code == Self::FAILURE_CODE
    }

    /// 去掉 `(...)` 包裹的附加数据，如 `GET FULL VARIABLE` 的返回值
    pub fn data_value(&self) -> &str {
        let data = self.data.trim();
        data.strip_prefix('(')
            .and_then(|d| d.strip_suffix(')'))
            .unwrap_or(data)
    }
}

/// 通道状态码：振铃中
pub const CHANNEL_STATUS_RINGING: i64 = 4;

/// Channel Port
///
/// 一个实例对应一路通话，生命周期与进程一致
#[async_trait]
pub trait ChannelPort: Send {
    /// 发送一行命令并同步读取一行响应
    async fn send_command(&mut self, line: &str) -> Result<ParsedResponse, ChannelError>;

    /// 查询通道状态，振铃中时执行应答
    ///
    /// 状态查询本身失败时返回 `false`，且不会尝试应答
    async fn channel_answered(&mut self) -> Result<bool, ChannelError>;

    /// 查询通道原生音频编码名称（每个会话最多查询一次）
    async fn native_audio_format(&mut self) -> Result<String, ChannelError>;

    /// 播放音频文件，`path` 可带扩展名，发送时会去除
    async fn stream_file(
        &mut self,
        path: &Path,
        interrupt_keys: &InterruptKeys,
    ) -> Result<PlaybackOutcome, ChannelError>;

    /// 向主机控制台输出诊断信息
    async fn verbose(&mut self, message: &str, level: u8) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_value_strips_parentheses() {
        let response = ParsedResponse::new(1, "(slin16)");
        assert_eq!(response.data_value(), "slin16");

        let response = ParsedResponse::new(0, "endpos=1234");
        assert_eq!(response.data_value(), "endpos=1234");
    }

    #[test]
    fn test_failure_sentinel() {
        assert!(ParsedResponse::failure().is_failure());
        assert!(!ParsedResponse::new(0, "").is_failure());
    }

    #[test]
    fn test_transport_classification() {
        assert!(ChannelError::Closed.is_transport());
        assert!(ChannelError::IoError("broken pipe".into()).is_transport());
        assert!(!ChannelError::AnswerFailed(-1).is_transport());
    }
}
