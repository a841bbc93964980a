//! AGI 环境变量头
//!
//! 主机启动进程后先发送若干 `agi_<name>: <value>` 行，以空行结束

use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::application::ports::ChannelError;

/// 通道会话环境
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgiEnvironment {
    variables: HashMap<String, String>,
}

impl AgiEnvironment {
    /// 读取变量头直到空行或 EOF
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, ChannelError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut variables = HashMap::new();
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .await
                .map_err(|e| ChannelError::IoError(e.to_string()))?;
            if read == 0 {
                break;
            }

            let entry = line.trim_end_matches(['\r', '\n']);
            if entry.is_empty() {
                break;
            }

            match parse_variable(entry) {
                Some((name, value)) => {
                    variables.insert(name.to_string(), value.to_string());
                }
                None => tracing::debug!(line = %entry, "Ignoring malformed AGI header line"),
            }
        }

        Ok(Self { variables })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// 通道标识，如 `SIP/1000-00000001`
    pub fn channel(&self) -> Option<&str> {
        self.get("channel")
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.get("uniqueid")
    }

    pub fn caller_id(&self) -> Option<&str> {
        self.get("callerid")
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

fn parse_variable(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("agi_")?;
    let (name, value) = rest.split_once(':')?;
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    #[tokio::test]
    async fn test_reads_header_until_blank_line() {
        let input = b"agi_request: agitts\nagi_channel: SIP/1000-00000001\n\
agi_uniqueid: 1700000000.42\nagi_callerid: 1000\n\n200 result=0\n";
        let mut reader = BufReader::new(&input[..]);

        let env = AgiEnvironment::read_from(&mut reader).await.unwrap();
        assert_eq!(env.len(), 4);
        assert_eq!(env.channel(), Some("SIP/1000-00000001"));
        assert_eq!(env.unique_id(), Some("1700000000.42"));
        assert_eq!(env.caller_id(), Some("1000"));

        // 空行之后的内容留给命令响应
        let mut rest = String::new();
        reader.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "200 result=0\n");
    }

    #[tokio::test]
    async fn test_eof_ends_header() {
        let input = b"agi_channel: DAHDI/1-1";
        let mut reader = BufReader::new(&input[..]);
        let env = AgiEnvironment::read_from(&mut reader).await.unwrap();
        assert_eq!(env.channel(), Some("DAHDI/1-1"));
    }

    #[tokio::test]
    async fn test_malformed_lines_ignored() {
        let input = b"garbage\nagi_: x\nagi_language: en\n\n";
        let mut reader = BufReader::new(&input[..]);
        let env = AgiEnvironment::read_from(&mut reader).await.unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("language"), Some("en"));
    }
}
