// ============================================================================
// Editor 绑定：日志、退出请求、Player 场景加载
// ============================================================================

use rquickjs::{Function, Object};
use std::sync::Arc;

use super::{forward_log, require_shared};
use crate::core::error::ScriptResult;
use crate::core::events::{EditorEvent, EventSender};
use crate::core::registry::{lock, SubsystemRegistry};
use crate::player::Player;
use crate::scripting::JsVm;

pub const API_NAME: &str = "Editor";
pub const PLAYER_API_NAME: &str = "Player";

/// 注册 `Editor` 与 `Player` 全局对象
pub fn bind(
    vm: &JsVm,
    registry: &SubsystemRegistry,
    events: EventSender,
    editor_content: bool,
) -> ScriptResult<()> {
    vm.register_bindings(API_NAME, move |ctx, globals| {
        let api = Object::new(ctx.clone())?;

        api.set(
            "log",
            Function::new(ctx.clone(), |level: String, message: String| {
                forward_log(&level, &message)
            })?,
        )?;
        api.set(
            "requestExit",
            Function::new(ctx.clone(), move || {
                tracing::info!(target: "editor", "Exit requested by script");
                events.send(EditorEvent::ExitRequested);
            })?,
        )?;
        api.set(
            "getVersion",
            Function::new(ctx.clone(), || env!("CARGO_PKG_VERSION").to_string())?,
        )?;
        api.set(
            "isEditorContent",
            Function::new(ctx.clone(), move || editor_content)?,
        )?;

        globals.set(API_NAME, api)
    })?;

    let player = require_shared::<Player>(registry, "Player")?;
    vm.register_bindings(PLAYER_API_NAME, move |ctx, globals| {
        let api = Object::new(ctx.clone())?;

        let load = Arc::clone(&player);
        api.set(
            "loadScene",
            Function::new(ctx.clone(), move |path: String| -> Option<String> {
                lock(&load)
                    .load_scene(&path, None)
                    .map(|scene| scene.name().to_string())
            })?,
        )?;

        let load_with_camera = Arc::clone(&player);
        api.set(
            "loadSceneWithCamera",
            Function::new(
                ctx.clone(),
                move |path: String, camera_name: String| -> Option<String> {
                    lock(&load_with_camera)
                        .load_scene_with_camera(&path, &camera_name)
                        .map(|scene| scene.name().to_string())
                },
            )?,
        )?;

        let current = Arc::clone(&player);
        api.set(
            "currentScene",
            Function::new(ctx.clone(), move || -> Option<String> {
                lock(&current)
                    .viewport()
                    .scene()
                    .map(|scene| scene.name().to_string())
            })?,
        )?;

        globals.set(PLAYER_API_NAME, api)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{EventBus, EventKind};
    use crate::subsystems::ResourceCache;
    use std::fs;

    #[test]
    fn test_editor_and_player_api() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("intro.scene"),
            r#"{ "name": "intro", "entities": [ { "id": 1, "components": {
                "Name": { "type": "Name", "value": "wide" },
                "Camera": { "type": "Camera", "fov_degrees": 80, "near": 0.1, "far": 10 }
            } } ] }"#,
        )
        .unwrap();
        let mut cache = ResourceCache::new(dir.path());
        cache.add_resource_dir(dir.path());

        let mut registry = SubsystemRegistry::new();
        let player = registry.register_shared(Player::new(cache.clone()));

        let mut bus = EventBus::new();
        bus.subscribe(EventKind::ScriptRuntimeError);
        bus.subscribe(EventKind::ExitRequested);

        let vm = JsVm::new("TestVM", cache, bus.sender()).unwrap();
        vm.init_execution_context().unwrap();
        vm.set_module_search_paths("Scripts").unwrap();
        bind(&vm, &registry, bus.sender(), true).unwrap();

        vm.execute_source(
            "main.js",
            "if (!Editor.isEditorContent()) throw new Error('content');\n\
             if (typeof Editor.getVersion() !== 'string') throw new Error('version');\n\
             Editor.log('info', 'hello from script');\n\
             if (Player.loadScene('intro.scene') !== 'intro') throw new Error('load');\n\
             if (Player.loadSceneWithCamera('intro.scene', 'wide') !== 'intro') throw new Error('camera');\n\
             if (Player.loadScene('missing.scene') !== undefined) throw new Error('missing');\n\
             if (Player.currentScene() !== 'intro') throw new Error('current');\n\
             Editor.requestExit();",
        )
        .unwrap();

        assert_eq!(bus.drain(), vec![EditorEvent::ExitRequested]);
        let player = lock(&player);
        assert_eq!(player.viewport().camera().unwrap().camera.fov_degrees, 80.0);
    }
}
