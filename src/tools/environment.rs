//! 工具环境
//!
//! 开发构建从 JSON 配置中读取源码根目录与数据目录。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, ConfigResult};

/// 开发配置文件默认名
pub const DEV_CONFIG_FILE_NAME: &str = "toolenv.json";

/// 开发配置文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevConfig {
    root_source_dir: PathBuf,
    core_data_dir: PathBuf,
    editor_data_dir: PathBuf,
    #[serde(default)]
    extra: BTreeMap<String, String>,
}

/// 工具环境
#[derive(Debug, Clone)]
pub struct ToolEnvironment {
    dev_config_filename: PathBuf,
    root_source_dir: PathBuf,
    core_data_dir: PathBuf,
    editor_data_dir: PathBuf,
    extra: BTreeMap<String, String>,
    initialized: bool,
}

impl ToolEnvironment {
    pub fn new(dev_config_filename: impl Into<PathBuf>) -> Self {
        Self {
            dev_config_filename: dev_config_filename.into(),
            root_source_dir: PathBuf::new(),
            core_data_dir: PathBuf::new(),
            editor_data_dir: PathBuf::new(),
            extra: BTreeMap::new(),
            initialized: false,
        }
    }

    /// 默认开发配置位置：`<config_dir>/editor_host/toolenv.json`
    pub fn default_dev_config_filename() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("editor_host")
            .join(DEV_CONFIG_FILE_NAME)
    }

    pub fn dev_config_filename(&self) -> &Path {
        &self.dev_config_filename
    }

    /// 从开发配置 JSON 初始化
    ///
    /// 配置中的相对路径相对于配置文件所在目录。
    pub fn init_from_json(&mut self) -> ConfigResult<()> {
        let content = fs::read_to_string(&self.dev_config_filename)?;
        let config: DevConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let base = self
            .dev_config_filename
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let absolute = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };

        self.root_source_dir = absolute(config.root_source_dir);
        self.core_data_dir = absolute(config.core_data_dir);
        self.editor_data_dir = absolute(config.editor_data_dir);
        self.extra = config.extra;
        self.initialized = true;

        tracing::debug!(
            target: "tools",
            "Tool environment: root={:?} core={:?} editor={:?}",
            self.root_source_dir,
            self.core_data_dir,
            self.editor_data_dir
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn root_source_dir(&self) -> &Path {
        &self.root_source_dir
    }

    pub fn core_data_dir(&self) -> &Path {
        &self.core_data_dir
    }

    pub fn editor_data_dir(&self) -> &Path {
        &self.editor_data_dir
    }

    /// 开发构建的资源搜索路径：核心数据、编辑器数据、源码 Script 目录
    pub fn resource_paths(&self) -> Vec<PathBuf> {
        vec![
            self.core_data_dir.clone(),
            self.editor_data_dir.clone(),
            self.root_source_dir.join("Script"),
        ]
    }

    /// 按名称查询环境值，供脚本使用
    pub fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "rootSourceDir" => Some(self.root_source_dir.display().to_string()),
            "coreDataDir" => Some(self.core_data_dir.display().to_string()),
            "editorDataDir" => Some(self.editor_data_dir.display().to_string()),
            other => self.extra.get(other).cloned(),
        }
    }
}
