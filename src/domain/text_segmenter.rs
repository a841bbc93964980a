//! 文本清洗与分割器
//!
//! 远端合成服务对单次请求的文本长度有限制，因此输入文本在清洗后被切成有界长度的片段，
//! 按顺序逐段合成与播放

use regex::Regex;
use std::sync::LazyLock;

use super::speech::SpeechError;

/// 单个片段的默认最大字符数（不含结尾分隔符）
pub const DEFAULT_MAX_CHARS: usize = 100;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\\|*~<>^()\[\]{}[:cntrl:]]").expect("unsafe char pattern is valid")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// 文本分割配置
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// 片段最大字符数
    pub max_chars: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// 检查是否为句读分隔符
#[inline]
fn is_delimiter(ch: char) -> bool {
    matches!(ch, '.' | ',' | '?' | '!' | ':' | ';')
}

/// 清洗输入文本
///
/// 特殊字符与控制字符替换为空格，连续空白合并，去除首尾空白
pub fn sanitize_text(text: &str) -> Result<String, SpeechError> {
    let replaced = UNSAFE_CHARS.replace_all(text, " ");
    let collapsed = WHITESPACE_RUN.replace_all(&replaced, " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        return Err(SpeechError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// 构造分割模式：优先在分隔符处截断，否则在空白处截断
fn chunk_pattern(max_chars: usize) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r".{{1,{max}}}[.,?!:;]|.{{1,{max}}}\s",
        max = max_chars.max(1)
    ))
}

/// 对清洗后的文本进行分段
///
/// 分段策略：
/// 1. 末尾没有句读分隔符时补一个 `.`
/// 2. 每段最多 `max_chars` 个字符，尽量在分隔符后截断，其次在空白处截断
/// 3. 超过 `max_chars` 且没有任何截断点的连续文本按字符数硬切
/// 4. 去除每段首尾空白，丢弃空片段
pub fn segment_text(text: &str, config: &SegmentConfig) -> Result<Vec<String>, SpeechError> {
    let mut text = text.trim().to_string();
    if text.is_empty() {
        return Err(SpeechError::EmptyText);
    }
    if !text.chars().last().is_some_and(is_delimiter) {
        text.push('.');
    }

    let pattern = chunk_pattern(config.max_chars).map_err(|e| {
        tracing::error!(error = %e, max_chars = config.max_chars, "Invalid chunk pattern");
        SpeechError::InvalidChunkSize(config.max_chars)
    })?;

    let max_chars = config.max_chars.max(1);
    let mut segments = Vec::new();
    let mut last_end = 0;
    for m in pattern.find_iter(&text) {
        // 模式跳过的部分不能丢
        push_hard_split(&mut segments, &text[last_end..m.start()], max_chars);
        push_segment(&mut segments, m.as_str());
        last_end = m.end();
    }
    push_hard_split(&mut segments, &text[last_end..], max_chars);

    if segments.is_empty() {
        return Err(SpeechError::EmptyText);
    }
    Ok(segments)
}

fn push_segment(segments: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        segments.push(piece.to_string());
    }
}

/// 按字符边界每 `max_chars` 个字符切一段
fn push_hard_split(segments: &mut Vec<String>, span: &str, max_chars: usize) {
    let span = span.trim();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in span.char_indices() {
        if count == max_chars {
            push_segment(segments, &span[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    push_segment(segments, &span[start..]);
}
