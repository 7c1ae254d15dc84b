//! 子系统注册表
//!
//! 以能力类型为键的单例服务存储。每个类型同一时刻最多只有一个实例。
//!
//! 注册表是一个显式传递的服务定位器对象，而不是隐藏的全局变量：
//! 需要查找服务的组件在调用时拿到 `&SubsystemRegistry` 或 `&mut SubsystemRegistry`。
//!
//! 底层使用 `bevy_ecs::World` 的 non-send 资源槽位，因此脚本虚拟机这类
//! 非 `Send` 的服务也可以注册。所有访问都发生在主线程上。

use bevy_ecs::world::World;
use std::any::type_name;
use std::sync::{Arc, Mutex, MutexGuard};

/// 可在脚本绑定闭包之间共享的子系统
pub type Shared<T> = Arc<Mutex<T>>;

/// 将服务包装为共享子系统
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// 锁定共享子系统，锁中毒时沿用内部数据
pub fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 子系统注册表
pub struct SubsystemRegistry {
    world: World,
}

impl Default for SubsystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubsystemRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            world: World::new(),
        }
    }

    /// 注册子系统
    ///
    /// 若该类型已有实例，旧实例先被移除并释放，然后才安装新实例。
    pub fn register<T: 'static>(&mut self, instance: T) {
        if let Some(previous) = self.world.remove_non_send_resource::<T>() {
            tracing::debug!(target: "registry", "Replacing subsystem {}", type_name::<T>());
            drop(previous);
        }
        self.world.insert_non_send_resource(instance);
        tracing::debug!(target: "registry", "Registered subsystem {}", type_name::<T>());
    }

    /// 移除子系统，返回其所有权（调用方丢弃即释放）
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        let removed = self.world.remove_non_send_resource::<T>();
        if removed.is_some() {
            tracing::debug!(target: "registry", "Removed subsystem {}", type_name::<T>());
        }
        removed
    }

    /// 按类型查找子系统；未注册是合法状态
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.world.get_non_send_resource::<T>()
    }

    /// 按类型可变查找子系统
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.world
            .get_non_send_resource_mut::<T>()
            .map(|slot| slot.into_inner())
    }

    /// 是否已注册
    pub fn contains<T: 'static>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// 注册共享子系统并返回句柄副本
    pub fn register_shared<T: 'static>(&mut self, instance: T) -> Shared<T> {
        let handle = shared(instance);
        self.register(Arc::clone(&handle));
        handle
    }

    /// 获取共享子系统句柄副本
    pub fn shared<T: 'static>(&self) -> Option<Shared<T>> {
        self.get::<Shared<T>>().map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// 析构时记录日志的测试服务
    struct Tracked {
        id: u32,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Tracked {
        fn new(id: u32, log: &Rc<RefCell<Vec<String>>>) -> Self {
            log.borrow_mut().push(format!("create {}", id));
            Self {
                id,
                log: Rc::clone(log),
            }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.log.borrow_mut().push(format!("drop {}", self.id));
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = SubsystemRegistry::new();
        assert!(registry.get::<u32>().is_none());

        registry.register(7u32);
        assert_eq!(registry.get::<u32>(), Some(&7));
        assert!(registry.contains::<u32>());
    }

    #[test]
    fn test_register_replaces_and_releases_previous() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SubsystemRegistry::new();

        registry.register(Tracked::new(1, &log));
        let second = Tracked::new(2, &log);
        registry.register(second);

        // 旧实例先从槽位移除并释放，之后才安装新实例；只释放一次
        assert_eq!(
            *log.borrow(),
            vec!["create 1", "create 2", "drop 1"]
        );
        assert_eq!(registry.get::<Tracked>().map(|p| p.id), Some(2));

        drop(registry);
        assert_eq!(log.borrow().last().map(String::as_str), Some("drop 2"));
        assert_eq!(log.borrow().iter().filter(|e| *e == "drop 1").count(), 1);
    }

    #[test]
    fn test_remove_releases_ownership() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SubsystemRegistry::new();
        registry.register(Tracked::new(1, &log));

        let removed = registry.remove::<Tracked>();
        assert!(removed.is_some());
        assert!(registry.get::<Tracked>().is_none());
        assert_eq!(log.borrow().len(), 1);

        drop(removed);
        assert_eq!(log.borrow().last().map(String::as_str), Some("drop 1"));
        assert!(registry.remove::<Tracked>().is_none());
    }

    #[test]
    fn test_shared_handles() {
        let mut registry = SubsystemRegistry::new();
        let handle = registry.register_shared(String::from("tools"));

        lock(&handle).push_str("-ready");
        let looked_up = registry.shared::<String>().unwrap();
        assert_eq!(*lock(&looked_up), "tools-ready");
        assert!(registry.shared::<u64>().is_none());
    }

    #[test]
    fn test_get_mut() {
        let mut registry = SubsystemRegistry::new();
        registry.register(vec![1, 2]);
        registry.get_mut::<Vec<i32>>().unwrap().push(3);
        assert_eq!(registry.get::<Vec<i32>>().unwrap().len(), 3);
    }
}
