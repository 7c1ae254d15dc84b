//! 核心模块单元测试
//!
//! 覆盖注册表、事件总线与退出控制之间的协作

#[cfg(test)]
mod exit_flow_tests {
    use crate::core::{EditorEvent, EventBus, EventKind, ExitController, ExitState};
    use crate::scripting::ScriptRuntimeError;

    fn record(message: &str) -> ScriptRuntimeError {
        ScriptRuntimeError {
            filename: "EditorHost/main.js".to_string(),
            message: message.to_string(),
            stack: None,
            line_number: 3,
        }
    }

    #[test]
    fn test_runtime_errors_from_bus_fail_once() {
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::ScriptRuntimeError);
        let sender = bus.sender();
        sender.send(EditorEvent::ScriptRuntimeError(record("first")));
        sender.send(EditorEvent::ScriptRuntimeError(record("second")));

        let mut exit = ExitController::new();
        for event in bus.drain() {
            if let EditorEvent::ScriptRuntimeError(record) = event {
                exit.on_script_runtime_error(&record);
            }
        }

        assert_eq!(
            exit.state(),
            &ExitState::Failed("EditorHost/main.js - first - Line: 3".to_string())
        );
        assert_eq!(exit.suppressed(), 1);
    }

    #[test]
    fn test_exit_request_after_failure_keeps_diagnostic() {
        let mut exit = ExitController::new();
        exit.error_exit("Unable to load EditorHost/main.js");
        exit.on_exit_requested();

        assert!(exit.is_failed());
        assert_eq!(exit.diagnostic(), Some("Unable to load EditorHost/main.js"));
    }
}

#[cfg(test)]
mod registry_tests {
    use crate::core::{lock, SubsystemRegistry};
    use crate::tools::ToolSystem;

    #[test]
    fn test_shared_handle_sees_registered_instance() {
        let mut registry = SubsystemRegistry::new();
        let handle = registry.register_shared(ToolSystem::new());

        let dir = tempfile::tempdir().unwrap();
        lock(&handle).open_project(dir.path()).unwrap();

        let looked_up = registry.shared::<ToolSystem>().unwrap();
        assert!(lock(&looked_up).project().is_some());
    }

    #[test]
    fn test_remove_releases_ownership() {
        let mut registry = SubsystemRegistry::new();
        let handle = registry.register_shared(ToolSystem::new());
        assert_eq!(std::sync::Arc::strong_count(&handle), 2);

        drop(registry.remove::<crate::core::Shared<ToolSystem>>());
        assert_eq!(std::sync::Arc::strong_count(&handle), 1);
        assert!(registry.shared::<ToolSystem>().is_none());
    }
}
