//! AGI 响应行解码
//!
//! 响应格式为 `<status> result=<int> [data]`。仅 `200 result=<int>` 被视为有效，
//! 其余一律解码为 `result_code = -1`：主机错误与缺少 `result=` 的普通行不作区分

use regex::Regex;
use std::sync::LazyLock;

use crate::application::ports::ParsedResponse;

static RESPONSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^200 result=(-?\d+)(?:\s+(.*))?$").expect("response pattern is valid")
});

/// 解码一行响应（可带行尾换行符）
pub fn decode_response(line: &str) -> ParsedResponse {
    let line = line.trim_end_matches(['\r', '\n']);

    let Some(captures) = RESPONSE_PATTERN.captures(line) else {
        return ParsedResponse::failure();
    };

    let result_code = captures
        .get(1)
        .and_then(|m| m.as_str().parse::<i64>().ok());
    match result_code {
        Some(code) => ParsedResponse::new(
            code,
            captures.get(2).map_or("", |m| m.as_str()).trim(),
        ),
        None => ParsedResponse::failure(),
    }
}

/// `520-` 开头表示多行用法说明，后续行直到 [`is_usage_end`] 为止
pub fn is_multiline_usage(line: &str) -> bool {
    line.starts_with("520-")
}

/// 多行用法说明的结束行
pub fn is_usage_end(line: &str) -> bool {
    line.starts_with("520 ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success_with_data() {
        let response = decode_response("200 result=1 (slin16)\n");
        assert_eq!(response, ParsedResponse::new(1, "(slin16)"));
    }

    #[test]
    fn test_decode_success_without_data() {
        assert_eq!(decode_response("200 result=0"), ParsedResponse::new(0, ""));
        assert_eq!(decode_response("200 result=0\r\n"), ParsedResponse::new(0, ""));
    }

    #[test]
    fn test_decode_stream_file_endpos() {
        let response = decode_response("200 result=49 endpos=12345");
        assert_eq!(response.result_code, 49);
        assert_eq!(response.data, "endpos=12345");
    }

    #[test]
    fn test_decode_explicit_negative_result() {
        let response = decode_response("200 result=-1 endpos=0");
        assert!(response.is_failure());
        assert_eq!(response.data, "endpos=0");
    }

    #[test]
    fn test_decode_non_200_status() {
        assert!(decode_response("511 result=").is_failure());
        assert!(decode_response("510 Invalid or unknown command").is_failure());
        assert!(decode_response("520 End of proper usage.").is_failure());
    }

    #[test]
    fn test_decode_missing_result_field() {
        assert!(decode_response("200").is_failure());
        assert!(decode_response("200 ok").is_failure());
    }

    #[test]
    fn test_decode_truncated_line() {
        assert!(decode_response("200 result=").is_failure());
        assert!(decode_response("200 res").is_failure());
        assert!(decode_response("").is_failure());
    }

    #[test]
    fn test_decode_rejects_garbage_integer() {
        assert!(decode_response("200 result=abc").is_failure());
        assert!(decode_response("200 result=99999999999999999999999").is_failure());
    }

    #[test]
    fn test_multiline_usage_markers() {
        assert!(is_multiline_usage("520-Invalid command syntax.  Proper usage follows:"));
        assert!(!is_multiline_usage("520 End of proper usage."));
        assert!(is_usage_end("520 End of proper usage."));
    }
}
