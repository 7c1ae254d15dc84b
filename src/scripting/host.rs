//! 脚本宿主子系统
//!
//! 负责创建虚拟机并保证同一时刻只有一个虚拟机存活。
//! 宿主从注册表移除并释放时，它持有的虚拟机引用随之释放。

use std::rc::Rc;

use super::vm::{JsVm, VmHandle, VmWatch};
use crate::core::error::{ScriptError, ScriptResult};
use crate::core::events::EventSender;
use crate::subsystems::ResourceCache;

/// 脚本宿主
#[derive(Debug)]
pub struct ScriptingHost {
    resources: ResourceCache,
    events: EventSender,
    vm: Option<VmHandle>,
    last: Option<VmWatch>,
}

impl ScriptingHost {
    pub fn new(resources: ResourceCache, events: EventSender) -> Self {
        Self {
            resources,
            events,
            vm: None,
            last: None,
        }
    }

    /// 创建虚拟机
    ///
    /// 已有虚拟机存活（包括被外部引用滞留的旧虚拟机）时返回错误。
    pub fn instantiate_vm(&mut self, name: &str) -> ScriptResult<VmHandle> {
        if self.vm.is_some() || self.last.as_ref().is_some_and(|w| !w.is_released()) {
            return Err(ScriptError::VmAlreadyLive(name.to_string()));
        }

        let vm = Rc::new(JsVm::new(name, self.resources.clone(), self.events.clone())?);
        self.last = Some(JsVm::watch(&vm));
        self.vm = Some(Rc::clone(&vm));
        tracing::info!(target: "script", "Instantiated VM {}", name);
        Ok(vm)
    }

    /// 当前虚拟机
    pub fn vm(&self) -> Option<&VmHandle> {
        self.vm.as_ref()
    }

    /// 释放宿主持有的虚拟机引用
    pub fn release_vm(&mut self) -> Option<VmWatch> {
        let vm = self.vm.take()?;
        let watch = JsVm::watch(&vm);
        drop(vm);
        Some(watch)
    }
}

impl Drop for ScriptingHost {
    fn drop(&mut self) {
        if let Some(watch) = self.release_vm() {
            tracing::debug!(
                target: "script",
                "Scripting host released, {} VM reference(s) remain",
                watch.outstanding()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::EventBus;

    #[test]
    fn test_single_live_vm() {
        let bus = EventBus::new();
        let mut host = ScriptingHost::new(ResourceCache::default(), bus.sender());

        let vm = host.instantiate_vm("MainVM").unwrap();
        assert_eq!(vm.name(), "MainVM");
        assert!(matches!(
            host.instantiate_vm("SecondVM"),
            Err(ScriptError::VmAlreadyLive(_))
        ));

        // 宿主释放后仍有外部引用，不能创建新虚拟机
        let watch = host.release_vm().unwrap();
        assert_eq!(watch.outstanding(), 1);
        assert!(host.instantiate_vm("SecondVM").is_err());

        drop(vm);
        assert!(watch.is_released());
        assert!(host.instantiate_vm("SecondVM").is_ok());
    }

    #[test]
    fn test_dropping_host_releases_vm() {
        let bus = EventBus::new();
        let mut host = ScriptingHost::new(ResourceCache::default(), bus.sender());
        let watch = JsVm::watch(&host.instantiate_vm("MainVM").unwrap());

        assert_eq!(watch.outstanding(), 1);
        drop(host);
        assert!(watch.is_released());
    }
}
