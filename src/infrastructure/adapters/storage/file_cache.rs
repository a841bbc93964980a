//! File Audio Cache - 文件系统音频缓存
//!
//! 实现 AudioCachePort trait
//!
//! 条目路径为 `<dir>/<key>.<ext>`，写入通过同目录下的 rename 完成，
//! 读者要么看不到条目，要么看到完整文件

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{AudioCachePort, CacheError};

/// 文件系统音频缓存
pub struct FileAudioCache {
    cache_dir: PathBuf,
}

impl FileAudioCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    /// 条目路径
    pub fn entry_path(&self, cache_key: &str, extension: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", cache_key, extension))
    }

    /// 跨文件系统时先复制到缓存目录内的临时文件，再原子替换
    async fn copy_into(&self, source: &Path, dest: &Path) -> Result<(), CacheError> {
        let staging = tempfile::NamedTempFile::new_in(&self.cache_dir)
            .map_err(|e| CacheError::IoError(e.to_string()))?;

        fs::copy(source, staging.path())
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;

        staging
            .persist(dest)
            .map_err(|e| CacheError::IoError(e.error.to_string()))?;

        if let Err(e) = fs::remove_file(source).await {
            tracing::warn!(path = %source.display(), error = %e, "Failed to remove cache source");
        }
        Ok(())
    }
}

#[async_trait]
impl AudioCachePort for FileAudioCache {
    async fn lookup(&self, cache_key: &str, extension: &str) -> Option<PathBuf> {
        let path = self.entry_path(cache_key, extension);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    async fn store(
        &self,
        cache_key: &str,
        extension: &str,
        source: &Path,
    ) -> Result<PathBuf, CacheError> {
        if fs::metadata(source).await.is_err() {
            return Err(CacheError::SourceNotFound(source.display().to_string()));
        }

        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;

        let dest = self.entry_path(cache_key, extension);
        if let Err(e) = fs::rename(source, &dest).await {
            tracing::debug!(error = %e, "Rename into cache failed, copying instead");
            self.copy_into(source, &dest).await?;
        }

        tracing::debug!(path = %dest.display(), "Stored cache entry");
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_then_lookup() {
        let scratch = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        let cache = FileAudioCache::new(cache_dir.path());

        let source = scratch.path().join("chunk_0.sln");
        std::fs::write(&source, b"pcm-data").unwrap();

        let key = "0123456789abcdef0123456789abcdef";
        let stored = cache.store(key, "sln", &source).await.unwrap();
        assert_eq!(stored, cache_dir.path().join(format!("{}.sln", key)));
        assert!(!source.exists());

        let found = cache.lookup(key, "sln").await.unwrap();
        assert_eq!(std::fs::read(found).unwrap(), b"pcm-data");
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let cache_dir = tempdir().unwrap();
        let cache = FileAudioCache::new(cache_dir.path());
        assert!(cache.lookup("missing", "sln").await.is_none());
        // 扩展名不同视为不同条目
        std::fs::write(cache_dir.path().join("key.sln16"), b"x").unwrap();
        assert!(cache.lookup("key", "sln").await.is_none());
    }

    #[tokio::test]
    async fn test_restore_same_key_overwrites() {
        let scratch = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        let cache = FileAudioCache::new(cache_dir.path());

        for _ in 0..2 {
            let source = scratch.path().join("chunk.sln");
            std::fs::write(&source, b"same").unwrap();
            cache.store("key", "sln", &source).await.unwrap();
        }

        let entries = std::fs::read_dir(cache_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(std::fs::read(cache.entry_path("key", "sln")).unwrap(), b"same");
    }

    #[tokio::test]
    async fn test_store_creates_missing_dir() {
        let scratch = tempdir().unwrap();
        let root = tempdir().unwrap();
        let cache = FileAudioCache::new(root.path().join("nested/cache"));

        let source = scratch.path().join("chunk.sln");
        std::fs::write(&source, b"x").unwrap();
        let stored = cache.store("key", "sln", &source).await.unwrap();
        assert!(stored.exists());
    }

    #[tokio::test]
    async fn test_copy_fallback_leaves_no_staging_file() {
        let scratch = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        let cache = FileAudioCache::new(cache_dir.path());

        let source = scratch.path().join("chunk_0.sln16");
        std::fs::write(&source, b"pcm-copy").unwrap();
        let dest = cache.entry_path("key", "sln16");

        cache.copy_into(&source, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"pcm-copy");
        assert!(!source.exists());
        let entries: Vec<_> = std::fs::read_dir(cache_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries, vec![dest]);
    }

    #[tokio::test]
    async fn test_copy_fallback_replaces_existing_entry() {
        let scratch = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        let cache = FileAudioCache::new(cache_dir.path());
        let dest = cache.entry_path("key", "sln");
        std::fs::write(&dest, b"old").unwrap();

        let source = scratch.path().join("chunk.sln");
        std::fs::write(&source, b"new").unwrap();
        cache.copy_into(&source, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
        assert_eq!(std::fs::read_dir(cache_dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_store_missing_source() {
        let cache_dir = tempdir().unwrap();
        let cache = FileAudioCache::new(cache_dir.path());
        let err = cache
            .store("key", "sln", Path::new("/nonexistent/chunk.sln"))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::SourceNotFound(_)));
    }
}
