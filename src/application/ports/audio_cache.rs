//! Audio Cache Port - 音频缓存管理
//!
//! 内容寻址的音频缓存，具体实现为文件系统目录
//!
//! - 缓存 key: md5(text.language.speed)
//! - 条目一经命名即不可变，不做淘汰
//! - 多个进程可并发写同一 key，内容确定，后写者覆盖

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::speech::{Language, Speed};

/// 缓存 key 长度（md5 十六进制）
pub const CACHE_KEY_LEN: usize = 32;

/// 扩展名最大长度（含 `.`，如 `.sln48`）
pub const MAX_EXTENSION_LEN: usize = 6;

/// Audio Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache source not found: {0}")]
    SourceNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Audio Cache Port
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 查找当前进程可读的缓存条目
    async fn lookup(&self, cache_key: &str, extension: &str) -> Option<PathBuf>;

    /// 将已完成的音频原子地移入缓存，返回缓存内路径
    async fn store(
        &self,
        cache_key: &str,
        extension: &str,
        source: &Path,
    ) -> Result<PathBuf, CacheError>;
}

/// 生成缓存 key
///
/// 相同的 (text, language, speed) 总是得到相同的 key
pub fn generate_cache_key(text: &str, language: &Language, speed: Speed) -> String {
    let digest = md5::compute(format!("{}.{}.{}", text, language, speed).as_bytes());
    format!("{:x}", digest)
}

/// 判断缓存目录是否能容纳最长的条目路径
///
/// 最长条目路径为 `<dir>/<32 位 key>.<ext>`，其中 `.<ext>` 最多 6 个字节。
/// 启动时计算一次，不满足则整次运行禁用缓存
pub fn cache_enabled(cache_dir: &Path, max_path_len: usize) -> bool {
    let longest_entry = cache_dir.as_os_str().len() + 1 + CACHE_KEY_LEN + MAX_EXTENSION_LEN;
    longest_entry <= max_path_len
}
