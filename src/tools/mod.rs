//! Setup 阶段注册的叶子服务

pub mod environment;
pub mod preferences;
pub mod system;

pub use environment::ToolEnvironment;
pub use preferences::{PreferenceData, Preferences};
pub use system::{Project, ProjectError, ToolSystem};
