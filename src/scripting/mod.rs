//! 嵌入式 JavaScript 脚本系统
//!
//! - `JsVm`: QuickJS 虚拟机，按固定顺序初始化
//! - `ScriptingHost`: 注册到子系统注册表的宿主，保证单一虚拟机
//! - `bindings`: 暴露给脚本的原生 API

pub mod bindings;
pub mod exception;
pub mod host;
pub mod modules;
pub mod vm;

pub use exception::ScriptRuntimeError;
pub use host::ScriptingHost;
pub use modules::ModuleResolver;
pub use vm::{BindingRecord, JsVm, VmHandle, VmState, VmWatch, UPDATE_CALLBACK};
