//! 课表缓存文件
//!
//! 内容即 `serialize_schedule` 的输出；文件不存在表示首次运行

use crate::error::{AppError, AppResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 最近一次课表状态的存储
pub struct ScheduleCache {
    path: PathBuf,
}

impl ScheduleCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取缓存，文件不存在时返回 `None`
    pub async fn load(&self) -> AppResult<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                debug!("读取缓存 {} ({} 字节)", self.path.display(), content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::file_read_failed(self.path.display().to_string(), e)),
        }
    }

    /// 原子写入：先写临时文件再重命名
    pub async fn store(&self, content: &str) -> AppResult<()> {
        let shown = self.path.display().to_string();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| AppError::file_write_failed(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| AppError::file_write_failed(shown.clone(), e))?;

        debug!("缓存已更新: {}", shown);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScheduleCache::new(dir.path().join("latest_courses.txt"));
        assert_eq!(tokio_test::assert_ok!(cache.load().await), None);
    }

    #[tokio::test]
    async fn test_store_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScheduleCache::new(dir.path().join("data").join("latest_courses.txt"));

        cache.store("CS101 - Intro").await.unwrap();
        cache.store("CS102 - Data").await.unwrap();

        assert_eq!(cache.load().await.unwrap().as_deref(), Some("CS102 - Data"));
        assert!(!dir.path().join("data").join("latest_courses.tmp").exists());
    }
}
