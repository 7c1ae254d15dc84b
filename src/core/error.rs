//! 统一错误处理模块
//!
//! 提供编辑器宿主范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **引擎层错误** (`EngineError`): 引擎启动、日志、子系统初始化
//! - **脚本层错误** (`ScriptError`): 虚拟机生命周期、编译、绑定
//! - **生命周期错误** (`LifecycleError`): Setup/Start/Stop 阶段的致命错误
//!
//! `LifecycleError` 的 `Display` 文本就是 `ErrorExit` 记录的最终诊断信息。

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// 引擎核心错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid engine parameter {name}: expected {expected}")]
    InvalidParameter {
        name: &'static str,
        expected: &'static str,
    },

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 脚本系统错误
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Script VM creation failed: {0}")]
    VmCreation(String),

    #[error("A script VM is already live: {0}")]
    VmAlreadyLive(String),

    #[error("Invalid VM state: expected {expected}, found {found}")]
    InvalidState { expected: String, found: String },

    #[error("Script compilation error: {0}")]
    Compilation(String),

    #[error("Script runtime error: {0}")]
    Runtime(String),

    #[error("Invalid script binding: {0}")]
    Binding(String),

    #[error("Script file is not valid UTF-8: {0}")]
    Encoding(String),
}

impl From<rquickjs::Error> for ScriptError {
    fn from(err: rquickjs::Error) -> Self {
        ScriptError::Binding(err.to_string())
    }
}

/// 应用生命周期错误
///
/// 所有变体最终都通过 `ExitController::error_exit` 汇聚为同一个退出点。
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Unable to initialize tool environment from {}", path.display())]
    ToolEnvironment { path: PathBuf },

    #[error("Resource paths are only known in development builds")]
    ResourcePathsUnknown,

    #[error("Unable to load {path}")]
    EntryScriptMissing { path: String },

    #[error("Error executing {path}: {source}")]
    EntryScriptFailed {
        path: String,
        #[source]
        source: ScriptError,
    },

    #[error("Required subsystem not registered: {0}")]
    MissingSubsystem(&'static str),

    #[error("{outstanding} script VM reference(s) still live after shutdown")]
    VmLeak { outstanding: usize },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
}

/// 引擎结果类型别名
pub type EngineResult<T> = Result<T, EngineError>;
pub type ScriptResult<T> = Result<T, ScriptError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
