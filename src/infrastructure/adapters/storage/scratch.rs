//! 单次调用的临时工作目录
//!
//! 目录在 drop 时连同内容一起删除，正常结束、出错或信号终止都会经过 drop

use std::path::Path;
use tempfile::TempDir;

const SCRATCH_PREFIX: &str = "agitts_";

pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// 在 `parent` 下创建，未指定时使用系统临时目录
    pub fn create(parent: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        tracing::debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::create(Some(parent.path())).unwrap();
        let path = scratch.path().to_path_buf();

        assert!(path.starts_with(parent.path()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));

        std::fs::write(path.join("chunk_0.mp3"), b"x").unwrap();
        drop(scratch);
        assert!(!path.exists());
    }
}
