// ============================================================================
// ToolCore 绑定：项目与工具环境
// ============================================================================

use rquickjs::{Function, Object};
use std::sync::Arc;

use super::require_shared;
use crate::core::error::ScriptResult;
use crate::core::registry::{lock, SubsystemRegistry};
use crate::scripting::JsVm;
use crate::tools::{Preferences, ToolEnvironment, ToolSystem};

pub const API_NAME: &str = "ToolCore";

/// 注册 `ToolCore` 全局对象
pub fn bind(vm: &JsVm, registry: &SubsystemRegistry) -> ScriptResult<()> {
    let tools = require_shared::<ToolSystem>(registry, "ToolSystem")?;
    let preferences = registry.shared::<Preferences>();
    let environment = registry.get::<ToolEnvironment>().cloned();

    vm.register_bindings(API_NAME, move |ctx, globals| {
        let api = Object::new(ctx.clone())?;

        let open_tools = Arc::clone(&tools);
        api.set(
            "openProject",
            Function::new(ctx.clone(), move |path: String| -> bool {
                let opened = lock(&open_tools)
                    .open_project(&path)
                    .map(|project| project.path.display().to_string());
                match opened {
                    Ok(project_path) => {
                        if let Some(preferences) = &preferences {
                            let mut preferences = lock(preferences);
                            preferences.push_recent_project(project_path);
                            if let Err(e) = preferences.save() {
                                tracing::warn!(target: "tools", "Failed to save preferences: {}", e);
                            }
                        }
                        true
                    }
                    Err(e) => {
                        tracing::error!(target: "tools", "{}", e);
                        false
                    }
                }
            })?,
        )?;

        let close_tools = Arc::clone(&tools);
        api.set(
            "closeProject",
            Function::new(ctx.clone(), move || -> bool {
                lock(&close_tools).close_project().is_some()
            })?,
        )?;

        let path_tools = Arc::clone(&tools);
        api.set(
            "getProjectPath",
            Function::new(ctx.clone(), move || -> Option<String> {
                lock(&path_tools)
                    .project()
                    .map(|project| project.path.display().to_string())
            })?,
        )?;

        api.set(
            "getEnvironment",
            Function::new(ctx.clone(), move |key: String| -> Option<String> {
                environment.as_ref().and_then(|env| env.lookup(&key))
            })?,
        )?;

        globals.set(API_NAME, api)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{EventBus, EventKind};
    use crate::subsystems::ResourceCache;

    #[test]
    fn test_project_round_trip_through_script() {
        let project = tempfile::tempdir().unwrap();
        let mut registry = SubsystemRegistry::new();
        let tools = registry.register_shared(ToolSystem::new());

        let mut bus = EventBus::new();
        bus.subscribe(EventKind::ScriptRuntimeError);
        let vm = JsVm::new("TestVM", ResourceCache::default(), bus.sender()).unwrap();
        vm.init_execution_context().unwrap();
        vm.set_module_search_paths("Scripts").unwrap();
        bind(&vm, &registry).unwrap();

        let path = project.path().display().to_string().replace('\\', "/");
        vm.execute_source(
            "main.js",
            &format!(
                "if (!ToolCore.openProject('{}')) throw new Error('open failed');\n\
                 if (ToolCore.getEnvironment('rootSourceDir') !== undefined) throw new Error('env');",
                path
            ),
        )
        .unwrap();
        assert!(bus.drain().is_empty());
        assert!(lock(&tools).project().is_some());

        vm.execute_source("close.js", "ToolCore.closeProject();").unwrap();
        assert!(lock(&tools).project().is_none());
    }

    #[test]
    fn test_requires_tool_system() {
        let registry = SubsystemRegistry::new();
        let bus = EventBus::new();
        let vm = JsVm::new("TestVM", ResourceCache::default(), bus.sender()).unwrap();
        vm.init_execution_context().unwrap();
        vm.set_module_search_paths("Scripts").unwrap();
        assert!(bind(&vm, &registry).is_err());
    }
}
