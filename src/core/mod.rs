//! 核心模块
//!
//! 包含编辑器宿主的核心功能：
//! - `engine` - 引擎启动与帧计时
//! - `registry` - 子系统注册表
//! - `events` - 进程级事件总线
//! - `exit` - 错误退出控制
//! - `params` - 引擎启动参数
//! - `error` - 错误类型定义

pub mod engine;
pub mod error;
pub mod events;
pub mod exit;
pub mod params;
pub mod registry;
#[macro_use]
pub mod macros;

#[cfg(test)]
mod tests;

// 重新导出错误类型
pub use error::{
    EngineError, EngineResult, LifecycleError, LifecycleResult, ScriptError, ScriptResult,
};

// 重新导出主要类型
pub use engine::{Engine, WindowSettings};
pub use events::{EditorEvent, EventBus, EventKind, EventSender};
pub use exit::{ExitController, ExitState};
pub use params::{keys, EngineParameters, ParamValue};
pub use registry::{lock, shared, Shared, SubsystemRegistry};
