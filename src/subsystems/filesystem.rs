//! 文件系统子系统

use std::fs;
use std::path::PathBuf;

use crate::core::error::EngineResult;

/// 文件系统查询
#[derive(Debug, Clone, Default)]
pub struct FileSystem {
    /// 偏好目录根（测试或便携模式下覆盖系统目录）
    preferences_root: Option<PathBuf>,
}

impl FileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences_root(root: impl Into<PathBuf>) -> Self {
        Self {
            preferences_root: Some(root.into()),
        }
    }

    /// 应用偏好目录 `<root>/<org>/<app>/`，不存在时创建
    pub fn app_preferences_dir(&self, org: &str, app: &str) -> EngineResult<PathBuf> {
        let root = match &self.preferences_root {
            Some(root) => root.clone(),
            None => dirs::config_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(std::env::temp_dir),
        };
        let dir = root.join(org).join(app);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// 当前工作目录
    pub fn current_dir(&self) -> EngineResult<PathBuf> {
        Ok(std::env::current_dir()?)
    }
}
