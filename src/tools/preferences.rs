//! 编辑器偏好设置
//!
//! 以 TOML 持久化在应用偏好目录中。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, ConfigResult};

/// 偏好文件名
pub const PREFERENCES_FILE_NAME: &str = "prefs.toml";

/// 最近项目列表上限
const MAX_RECENT_PROJECTS: usize = 10;

/// 偏好内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceData {
    #[serde(default)]
    pub recent_projects: Vec<String>,
    #[serde(default = "default_window_size")]
    pub window_size: [u32; 2],
}

fn default_window_size() -> [u32; 2] {
    [1280, 720]
}

impl Default for PreferenceData {
    fn default() -> Self {
        Self {
            recent_projects: Vec::new(),
            window_size: default_window_size(),
        }
    }
}

/// 偏好文件尚不存在（首次启动）
fn is_missing(err: &ConfigError) -> bool {
    matches!(err, ConfigError::FileError(e) if e.kind() == io::ErrorKind::NotFound)
}

/// 偏好服务
#[derive(Debug, Default)]
pub struct Preferences {
    path: Option<PathBuf>,
    data: PreferenceData,
}

impl Preferences {
    /// 未绑定文件的偏好（不持久化）
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// 从目录加载；文件损坏时使用默认值并记录警告
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(PREFERENCES_FILE_NAME);
        let data = match Self::read(&path) {
            Ok(data) => data,
            Err(e) if is_missing(&e) => PreferenceData::default(),
            Err(e) => {
                tracing::warn!(target: "preferences", "Ignoring {:?}: {}", path, e);
                PreferenceData::default()
            }
        };
        Self {
            path: Some(path),
            data,
        }
    }

    fn read(path: &Path) -> ConfigResult<PreferenceData> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn save(&self) -> ConfigResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = toml::to_string_pretty(&self.data)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn data(&self) -> &PreferenceData {
        &self.data
    }

    /// 记录最近打开的项目，最新的在最前
    pub fn push_recent_project(&mut self, project: impl Into<String>) {
        let project = project.into();
        self.data.recent_projects.retain(|p| *p != project);
        self.data.recent_projects.insert(0, project);
        self.data.recent_projects.truncate(MAX_RECENT_PROJECTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = Preferences::load(dir.path());
        assert_eq!(prefs.data(), &PreferenceData::default());

        prefs.push_recent_project("/projects/a");
        prefs.push_recent_project("/projects/b");
        prefs.push_recent_project("/projects/a");
        prefs.save().unwrap();

        let reloaded = Preferences::load(dir.path());
        assert_eq!(
            reloaded.data().recent_projects,
            vec!["/projects/a".to_string(), "/projects/b".to_string()]
        );
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PREFERENCES_FILE_NAME), "window_size = \"big\"").unwrap();
        let prefs = Preferences::load(dir.path());
        assert_eq!(prefs.data().window_size, [1280, 720]);
    }

    #[test]
    fn test_only_missing_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Preferences::read(&dir.path().join(PREFERENCES_FILE_NAME)).unwrap_err();
        assert!(is_missing(&missing));

        // 同名目录导致的读取失败不是“文件不存在”
        let blocked = dir.path().join("blocked");
        fs::create_dir_all(blocked.join(PREFERENCES_FILE_NAME)).unwrap();
        let unreadable = Preferences::read(&blocked.join(PREFERENCES_FILE_NAME)).unwrap_err();
        assert!(matches!(unreadable, ConfigError::FileError(_)));
        assert!(!is_missing(&unreadable));

        let prefs = Preferences::load(&blocked);
        assert_eq!(prefs.data(), &PreferenceData::default());
    }

    #[test]
    fn test_recent_projects_capped() {
        let mut prefs = Preferences::in_memory();
        for i in 0..15 {
            prefs.push_recent_project(format!("/p/{}", i));
        }
        assert_eq!(prefs.data().recent_projects.len(), MAX_RECENT_PROJECTS);
        assert_eq!(prefs.data().recent_projects[0], "/p/14");
        assert!(prefs.save().is_ok());
    }
}
