//! 引擎子系统
//!
//! 宿主只依赖这些协作者的窄接口：
//! - `filesystem` - 偏好目录等文件系统查询
//! - `resource_cache` - 资源加载
//! - `ui` - UI 初始化转发
//! - 输入、授权、模型设置等简单状态

pub mod filesystem;
pub mod resource_cache;
pub mod ui;

pub use filesystem::FileSystem;
pub use resource_cache::{ResourceCache, ResourceFile};
pub use ui::{FontEntry, Ui};

use crate::impl_default_and_new;

/// 输入子系统
#[derive(Debug)]
pub struct Input {
    mouse_visible: bool,
}

impl_default_and_new!(Input {
    mouse_visible: false,
});

impl Input {
    pub fn set_mouse_visible(&mut self, visible: bool) {
        self.mouse_visible = visible;
    }

    pub fn is_mouse_visible(&self) -> bool {
        self.mouse_visible
    }
}

/// 动画模型设置
#[derive(Debug)]
pub struct ModelSettings {
    /// 加载动画模型时是否自动创建骨骼结构
    bone_creation_enabled: bool,
}

impl_default_and_new!(ModelSettings {
    bone_creation_enabled: true,
});

impl ModelSettings {
    pub fn set_bone_creation_enabled(&mut self, enabled: bool) {
        self.bone_creation_enabled = enabled;
    }

    pub fn bone_creation_enabled(&self) -> bool {
        self.bone_creation_enabled
    }
}

/// 授权状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    Uninitialized,
    Initialized,
}

/// 授权子系统
///
/// 初始化结果不反馈给调用方。
#[derive(Debug)]
pub struct LicenseSystem {
    state: LicenseState,
}

impl_default_and_new!(LicenseSystem {
    state: LicenseState::Uninitialized,
});

impl LicenseSystem {
    pub fn initialize(&mut self) {
        if self.state == LicenseState::Initialized {
            return;
        }
        self.state = LicenseState::Initialized;
        tracing::info!(target: "license", "License system initialized");
    }

    pub fn state(&self) -> LicenseState {
        self.state
    }
}
