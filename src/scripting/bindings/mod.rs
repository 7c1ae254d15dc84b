//! 暴露给脚本的原生 API
//!
//! 每组 API 是一个全局对象，绑定闭包只捕获 `Arc`/`EventSender`，
//! 不持有虚拟机本身。

pub mod editor;
pub mod toolcore;

use crate::core::error::{ScriptError, ScriptResult};
use crate::core::registry::{Shared, SubsystemRegistry};

/// 绑定所需的共享子系统
pub(crate) fn require_shared<T: 'static>(
    registry: &SubsystemRegistry,
    name: &'static str,
) -> ScriptResult<Shared<T>> {
    registry
        .shared::<T>()
        .ok_or_else(|| ScriptError::Binding(format!("{} is not registered", name)))
}

/// 把脚本日志转发到 `tracing`
pub(crate) fn forward_log(level: &str, message: &str) {
    match level {
        "error" => tracing::error!(target: "script.console", "{}", message),
        "warn" => tracing::warn!(target: "script.console", "{}", message),
        "debug" => tracing::debug!(target: "script.console", "{}", message),
        "trace" => tracing::trace!(target: "script.console", "{}", message),
        _ => tracing::info!(target: "script.console", "{}", message),
    }
}
