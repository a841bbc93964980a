//! AGI Client - ChannelPort 实现
//!
//! 每条命令写一行并 flush，随后阻塞读取恰好一行响应。
//! 任何读写失败都视为通道已断开，不做重试

use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use super::environment::AgiEnvironment;
use super::protocol::{decode_response, is_multiline_usage, is_usage_end};
use crate::application::ports::{
    ChannelError, ChannelPort, ParsedResponse, CHANNEL_STATUS_RINGING,
};
use crate::domain::speech::{InterruptKeys, PlaybackOutcome};

/// 查询通道原生编码的表达式
const NATIVE_FORMAT_EXPR: &str = "${CHANNEL(audionativeformat)}";

/// 打断后跳转的优先级
const INTERRUPT_PRIORITY: u32 = 1;

/// 基于进程 stdin/stdout 的客户端
pub type StdioAgiClient = AgiClient<BufReader<Stdin>, Stdout>;

/// AGI 客户端
pub struct AgiClient<R, W> {
    reader: R,
    writer: W,
    environment: AgiEnvironment,
    /// 原生编码，首次查询后缓存
    native_format: Option<String>,
}

impl StdioAgiClient {
    /// 接管进程 stdin/stdout 并读取环境变量头
    pub async fn from_stdio() -> Result<Self, ChannelError> {
        Self::connect(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    }
}

impl<R, W> AgiClient<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// 创建客户端，不读取环境变量头
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_environment(reader, writer, AgiEnvironment::default())
    }

    pub fn with_environment(reader: R, writer: W, environment: AgiEnvironment) -> Self {
        Self {
            reader,
            writer,
            environment,
            native_format: None,
        }
    }

    /// 先读取环境变量头，再创建客户端
    pub async fn connect(mut reader: R, writer: W) -> Result<Self, ChannelError> {
        let environment = AgiEnvironment::read_from(&mut reader).await?;
        tracing::debug!(
            variables = environment.len(),
            channel = ?environment.channel(),
            "AGI environment received"
        );
        Ok(Self::with_environment(reader, writer, environment))
    }

    pub fn environment(&self) -> &AgiEnvironment {
        &self.environment
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        let framed = format!("{}\n", line);
        self.writer
            .write_all(framed.as_bytes())
            .await
            .map_err(|e| ChannelError::IoError(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| ChannelError::IoError(e.to_string()))
    }

    async fn read_line(&mut self) -> Result<String, ChannelError> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| ChannelError::IoError(e.to_string()))?;
        if read == 0 {
            return Err(ChannelError::Closed);
        }
        Ok(line)
    }

    /// 读取一条响应；多行用法说明会被完整消费，保持命令与响应一一对应
    async fn read_response(&mut self) -> Result<ParsedResponse, ChannelError> {
        let line = self.read_line().await?;
        let first = line.trim_end_matches(['\r', '\n']).to_string();

        if is_multiline_usage(&first) {
            loop {
                let next = self.read_line().await?;
                if is_usage_end(&next) {
                    break;
                }
            }
        }

        let response = decode_response(&first);
        if response.is_failure() {
            tracing::warn!(response = %first, "Unexpected AGI response");
        }
        Ok(response)
    }
}

#[async_trait]
impl<R, W> ChannelPort for AgiClient<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send_command(&mut self, line: &str) -> Result<ParsedResponse, ChannelError> {
        tracing::trace!(command = %line, "AGI command");
        self.write_line(line).await?;
        let response = self.read_response().await?;
        tracing::trace!(
            result_code = response.result_code,
            data = %response.data,
            "AGI response"
        );
        Ok(response)
    }

    async fn channel_answered(&mut self) -> Result<bool, ChannelError> {
        let status = self.send_command("CHANNEL STATUS").await?;
        if status.is_failure() {
            tracing::warn!("CHANNEL STATUS query failed");
            return Ok(false);
        }

        if status.result_code == CHANNEL_STATUS_RINGING {
            tracing::debug!("Channel is ringing, answering");
            let answer = self.send_command("ANSWER").await?;
            if answer.result_code != 0 {
                return Err(ChannelError::AnswerFailed(answer.result_code));
            }
        }
        Ok(true)
    }

    async fn native_audio_format(&mut self) -> Result<String, ChannelError> {
        if let Some(format) = &self.native_format {
            return Ok(format.clone());
        }

        let response = self
            .send_command(&format!("GET FULL VARIABLE {}", NATIVE_FORMAT_EXPR))
            .await?;
        let format = if response.is_failure() {
            String::new()
        } else {
            response.data_value().to_string()
        };
        self.native_format = Some(format.clone());
        Ok(format)
    }

    async fn stream_file(
        &mut self,
        path: &Path,
        interrupt_keys: &InterruptKeys,
    ) -> Result<PlaybackOutcome, ChannelError> {
        let playable = path.with_extension("");
        let response = self
            .send_command(&format!(
                "STREAM FILE {} \"{}\"",
                playable.display(),
                interrupt_keys.as_str()
            ))
            .await?;

        if response.is_failure() {
            tracing::warn!(path = %playable.display(), "Failed to stream file");
            return Ok(PlaybackOutcome::Failed);
        }

        match pressed_key(response.result_code) {
            Some(key) => {
                for command in [
                    format!("SET EXTENSION {}", key),
                    format!("SET PRIORITY {}", INTERRUPT_PRIORITY),
                ] {
                    let ack = self.send_command(&command).await?;
                    if ack.is_failure() {
                        tracing::warn!(command = %command, "Host rejected dialplan jump");
                    }
                }
                Ok(PlaybackOutcome::Interrupted(key))
            }
            None => Ok(PlaybackOutcome::Completed),
        }
    }

    async fn verbose(&mut self, message: &str, level: u8) -> Result<(), ChannelError> {
        let escaped: String = message
            .chars()
            .map(|c| match c {
                '"' => '\'',
                '\r' | '\n' => ' ',
                other => other,
            })
            .collect();
        self.send_command(&format!("VERBOSE \"{}\" {}", escaped, level))
            .await
            .map(|_| ())
    }
}

/// STREAM FILE 的结果码为按键的字符编码
fn pressed_key(result_code: i64) -> Option<char> {
    if result_code < 32 {
        return None;
    }
    let key = u32::try_from(result_code).ok().and_then(char::from_u32)?;
    (key.is_alphanumeric() || matches!(key, '_' | '*' | '#')).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    type ScriptedClient<'a> = AgiClient<BufReader<&'a [u8]>, Vec<u8>>;

    fn scripted(script: &'static [u8]) -> ScriptedClient<'static> {
        AgiClient::new(BufReader::new(script), Vec::new())
    }

    fn sent(client: ScriptedClient<'_>) -> Vec<String> {
        let (_, written) = client.into_inner();
        String::from_utf8(written)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_connect_reads_environment_first() {
        let script = b"agi_channel: SIP/200-0001\n\n200 result=6\n";
        let mut client = AgiClient::connect(BufReader::new(&script[..]), Vec::new())
            .await
            .unwrap();
        assert_eq!(client.environment().channel(), Some("SIP/200-0001"));
        assert!(client.channel_answered().await.unwrap());
    }

    #[tokio::test]
    async fn test_send_command_roundtrip() {
        let mut client = scripted(b"200 result=1 (ulaw)\n");
        let response = client.send_command("GET FULL VARIABLE ${X}").await.unwrap();
        assert_eq!(response, ParsedResponse::new(1, "(ulaw)"));
        assert_eq!(sent(client), vec!["GET FULL VARIABLE ${X}".to_string()]);
    }

    #[tokio::test]
    async fn test_eof_is_transport_error() {
        let mut client = scripted(b"");
        let err = client.send_command("CHANNEL STATUS").await.unwrap_err();
        assert!(matches!(err, ChannelError::Closed));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_multiline_usage_consumed() {
        let mut client = scripted(
            b"520-Invalid command syntax.  Proper usage follows:\n\
Usage: STREAM FILE <filename> <escape digits>\n\
520 End of proper usage.\n\
200 result=6\n",
        );
        let response = client.send_command("STREAM FILE").await.unwrap();
        assert!(response.is_failure());

        let status = client.send_command("CHANNEL STATUS").await.unwrap();
        assert_eq!(status.result_code, 6);
    }

    #[tokio::test]
    async fn test_answered_channel_not_answered_again() {
        let mut client = scripted(b"200 result=6\n");
        assert!(client.channel_answered().await.unwrap());
        assert_eq!(sent(client), vec!["CHANNEL STATUS".to_string()]);
    }

    #[tokio::test]
    async fn test_ringing_channel_answered() {
        let mut client = scripted(b"200 result=4\n200 result=0\n");
        assert!(client.channel_answered().await.unwrap());
        assert_eq!(
            sent(client),
            vec!["CHANNEL STATUS".to_string(), "ANSWER".to_string()]
        );
    }

    #[tokio::test]
    async fn test_answer_failure() {
        let mut client = scripted(b"200 result=4\n200 result=-1\n");
        let err = client.channel_answered().await.unwrap_err();
        assert!(matches!(err, ChannelError::AnswerFailed(-1)));
    }

    #[tokio::test]
    async fn test_status_failure_skips_answer() {
        let mut client = scripted(b"511 result=\n");
        assert!(!client.channel_answered().await.unwrap());
        assert_eq!(sent(client), vec!["CHANNEL STATUS".to_string()]);
    }

    #[tokio::test]
    async fn test_native_format_queried_once() {
        let mut client = scripted(b"200 result=1 (slin16)\n");
        assert_eq!(client.native_audio_format().await.unwrap(), "slin16");
        assert_eq!(client.native_audio_format().await.unwrap(), "slin16");
        assert_eq!(sent(client).len(), 1);
    }

    #[tokio::test]
    async fn test_native_format_failure_is_empty() {
        let mut client = scripted(b"200 result=0\n");
        assert_eq!(client.native_audio_format().await.unwrap(), "");

        let mut client = scripted(b"510 Invalid or unknown command\n");
        assert_eq!(client.native_audio_format().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_stream_file_completed() {
        let mut client = scripted(b"200 result=0 endpos=16000\n");
        let outcome = client
            .stream_file(Path::new("/tmp/abc.sln16"), &InterruptKeys::any())
            .await
            .unwrap();
        assert_eq!(outcome, PlaybackOutcome::Completed);
        assert_eq!(
            sent(client),
            vec!["STREAM FILE /tmp/abc \"0123456789#*\"".to_string()]
        );
    }

    #[tokio::test]
    async fn test_stream_file_interrupted() {
        let mut client = scripted(b"200 result=49 endpos=800\n200 result=0\n200 result=0\n");
        let keys = InterruptKeys::parse("123").unwrap();
        let outcome = client
            .stream_file(Path::new("/var/cache/tts/abc.sln"), &keys)
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Interrupted('1'));
        assert_eq!(
            sent(client),
            vec![
                "STREAM FILE /var/cache/tts/abc \"123\"".to_string(),
                "SET EXTENSION 1".to_string(),
                "SET PRIORITY 1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_file_hash_key() {
        let mut client = scripted(b"200 result=35\n200 result=0\n200 result=0\n");
        let outcome = client
            .stream_file(Path::new("/tmp/x.sln"), &InterruptKeys::any())
            .await
            .unwrap();
        assert_eq!(outcome, PlaybackOutcome::Interrupted('#'));
    }

    #[tokio::test]
    async fn test_stream_file_failed() {
        let mut client = scripted(b"200 result=-1 endpos=0\n");
        let outcome = client
            .stream_file(Path::new("/tmp/x.sln"), &InterruptKeys::none())
            .await
            .unwrap();
        assert_eq!(outcome, PlaybackOutcome::Failed);
        assert_eq!(sent(client).len(), 1);
    }

    #[tokio::test]
    async fn test_verbose_escapes_quotes() {
        let mut client = scripted(b"200 result=1\n");
        client
            .verbose("Fetch error: \"HTTP 503\"\nretry", 1)
            .await
            .unwrap();
        assert_eq!(
            sent(client),
            vec!["VERBOSE \"Fetch error: 'HTTP 503' retry\" 1".to_string()]
        );
    }

    #[test]
    fn test_pressed_key_mapping() {
        assert_eq!(pressed_key(49), Some('1'));
        assert_eq!(pressed_key(42), Some('*'));
        assert_eq!(pressed_key(35), Some('#'));
        assert_eq!(pressed_key(0), None);
        assert_eq!(pressed_key(31), None);
        assert_eq!(pressed_key(33), None);
        assert_eq!(pressed_key(-1), None);
    }
}
