/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和校验
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::impl_default;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 编辑器宿主主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 路径配置
    #[serde(default)]
    pub paths: PathsConfig,

    /// 运行循环配置
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl EditorConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("EDITOR_HOST_LOG_LEVEL") {
            if let Some(level) = LogLevel::parse(&val) {
                self.logging.level = level;
            }
        }
        if let Ok(val) = env::var("EDITOR_HOST_MAX_FRAMES") {
            if let Ok(frames) = val.parse() {
                self.runtime.max_frames = Some(frames);
            }
        }
        if let Ok(val) = env::var("EDITOR_HOST_TARGET_FPS") {
            if let Ok(fps) = val.parse() {
                self.runtime.target_fps = fps;
            }
        }
        if let Ok(val) = env::var("EDITOR_HOST_DEV_CONFIG") {
            self.paths.dev_config = Some(PathBuf::from(val));
        }
        if let Ok(val) = env::var("EDITOR_HOST_PREFERENCES_DIR") {
            self.paths.preferences_dir = Some(PathBuf::from(val));
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.window.title.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "window.title must not be empty".to_string(),
            ));
        }
        if self.paths.editor_root.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "paths.editor_root must not be empty".to_string(),
            ));
        }
        if self.runtime.target_fps == 0 || self.runtime.target_fps > 1000 {
            return Err(ConfigError::ValidationError(format!(
                "runtime.target_fps must be in 1..=1000, got {}",
                self.runtime.target_fps
            )));
        }
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./editor_host.toml
    /// 2. <config_dir>/editor_host/config.toml
    /// 3. 使用默认配置
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::from_toml_file("editor_host.toml") {
            tracing::info!(target: "config", "Loaded config from editor_host.toml");
            return config;
        }

        if let Some(dir) = dirs::config_dir() {
            let config_path = dir.join("editor_host").join("config.toml");
            if let Ok(config) = Self::from_toml_file(&config_path) {
                tracing::info!(target: "config", "Loaded config from {:?}", config_path);
                return config;
            }
        }

        tracing::info!(target: "config", "Using default configuration");
        Self::default()
    }

    /// 入口脚本的资源名
    pub fn entry_script(&self) -> String {
        format!("{}/main.js", self.paths.editor_root)
    }
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub resizable: bool,
    pub fullscreen: bool,
    /// 仅 macOS 使用的窗口图标
    pub icon: String,
}

impl_default!(WindowConfig {
    title: "EditorHost".to_string(),
    resizable: true,
    fullscreen: false,
    icon: "Images/EditorLogo32.png".to_string(),
});

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 日志文件名（位于偏好目录的 Logs 子目录）
    pub file_name: String,
}

impl_default!(LoggingConfig {
    level: LogLevel::Debug,
    file_name: "EditorHost.log".to_string(),
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// `tracing_subscriber::EnvFilter` 指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 路径配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// 编辑器脚本根目录（资源名前缀，也是模块搜索根）
    pub editor_root: String,
    /// 组织名，用于偏好目录
    pub organization: String,
    /// 开发配置文件（工具环境 JSON）
    pub dev_config: Option<PathBuf>,
    /// 覆盖偏好目录
    pub preferences_dir: Option<PathBuf>,
}

impl_default!(PathsConfig {
    editor_root: "EditorHost".to_string(),
    organization: "EditorHost".to_string(),
    dev_config: None,
    preferences_dir: None,
});

/// 运行循环配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 目标帧率
    pub target_fps: u32,
    /// 最大帧数（无头运行时使用）
    pub max_frames: Option<u64>,
}

impl_default!(RuntimeConfig {
    target_fps: 60,
    max_frames: None,
});
