// ============================================================================
// 编辑器应用：生命周期控制器
// ============================================================================

use crate::config::EditorConfig;
use crate::core::error::{LifecycleError, LifecycleResult};
use crate::core::events::{EditorEvent, EventKind};
use crate::core::params::{keys, EngineParameters};
use crate::core::registry::lock;
use crate::player::Player;
use crate::scripting::bindings::{editor, toolcore};
use crate::scripting::{JsVm, ScriptRuntimeError, ScriptingHost, VmHandle};
use crate::subsystems::{FileSystem, Input, LicenseSystem, ModelSettings, ResourceCache, Ui};
use crate::tools::{Preferences, ToolEnvironment, ToolSystem};

use super::{AppContext, Application};

/// 主虚拟机名
pub const MAIN_VM_NAME: &str = "MainVM";

/// 编辑器应用
pub struct EditorApp {
    config: EditorConfig,
    vm: Option<VmHandle>,
}

impl EditorApp {
    pub fn new(config: EditorConfig) -> Self {
        Self { config, vm: None }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// 生命周期控制器持有的虚拟机句柄
    pub fn vm(&self) -> Option<&VmHandle> {
        self.vm.as_ref()
    }

    fn handle_script_error(&mut self, ctx: &mut AppContext, record: &ScriptRuntimeError) {
        ctx.exit.on_script_runtime_error(record);
    }

    fn handle_exit_requested(&mut self, ctx: &mut AppContext) {
        ctx.exit.on_exit_requested();
    }

    fn root(&self) -> &str {
        &self.config.paths.editor_root
    }

    /// 开发构建：资源路径来自工具环境
    #[cfg(feature = "dev_build")]
    fn resource_params(params: &mut EngineParameters, env: &ToolEnvironment) -> LifecycleResult<()> {
        params.set(keys::RESOURCE_PREFIX_PATH, "");
        params.set(keys::RESOURCE_PATHS, env.resource_paths());
        Ok(())
    }

    #[cfg(not(feature = "dev_build"))]
    fn resource_params(_params: &mut EngineParameters, _env: &ToolEnvironment) -> LifecycleResult<()> {
        Err(LifecycleError::ResourcePathsUnknown)
    }

    fn initialize_ui(&self, ctx: &mut AppContext) -> LifecycleResult<()> {
        let root = self.root();
        let ui = ctx
            .registry
            .get_mut::<Ui>()
            .ok_or(LifecycleError::MissingSubsystem("Ui"))?;
        ui.initialize(&format!("{}/resources/language/lng_en.tb.txt", root));
        ui.load_skin(
            &format!("{}/resources/default_skin/skin.tb.txt", root),
            &format!("{}/editor/skin/skin.tb.txt", root),
        );
        ui.add_font(&format!("{}/resources/vera.ttf", root), "Vera");
        ui.add_font(&format!("{}/resources/MesloLGS-Regular.ttf", root), "Monaco");
        ui.set_default_font("Vera", 12);
        Ok(())
    }
}

impl Application for EditorApp {
    fn setup(&mut self, ctx: &mut AppContext, params: &mut EngineParameters) -> LifecycleResult<()> {
        let file_system = ctx
            .registry
            .get::<FileSystem>()
            .cloned()
            .ok_or(LifecycleError::MissingSubsystem("FileSystem"))?;
        let organization = self.config.paths.organization.clone();

        let preferences_dir = file_system.app_preferences_dir(&organization, "Preferences")?;
        ctx.registry.register_shared(Preferences::load(preferences_dir));

        let dev_config = self
            .config
            .paths
            .dev_config
            .clone()
            .unwrap_or_else(ToolEnvironment::default_dev_config_filename);
        ctx.registry.register(ToolEnvironment::new(dev_config));
        ctx.registry.register_shared(ToolSystem::new());

        let env = ctx
            .registry
            .get_mut::<ToolEnvironment>()
            .ok_or(LifecycleError::MissingSubsystem("ToolEnvironment"))?;
        if cfg!(feature = "dev_build") {
            if let Err(e) = env.init_from_json() {
                tracing::error!(target: "editor", "Tool environment: {}", e);
                return Err(LifecycleError::ToolEnvironment {
                    path: env.dev_config_filename().to_path_buf(),
                });
            }
        }

        let window = &self.config.window;
        params.set(keys::WINDOW_TITLE, window.title.as_str());
        params.set(keys::WINDOW_RESIZABLE, window.resizable);
        params.set(keys::FULL_SCREEN, window.fullscreen);

        let log_dir = file_system.app_preferences_dir(&organization, "Logs")?;
        params.set(keys::LOG_NAME, log_dir.join(&self.config.logging.file_name));
        params.set(keys::LOG_LEVEL, self.config.logging.level);

        if cfg!(target_os = "macos") {
            params.set(keys::WINDOW_ICON, window.icon.as_str());
        }

        Self::resource_params(params, env)
    }

    fn start(&mut self, ctx: &mut AppContext) -> LifecycleResult<()> {
        ctx.registry
            .get_mut::<ModelSettings>()
            .ok_or(LifecycleError::MissingSubsystem("ModelSettings"))?
            .set_bone_creation_enabled(false);

        ctx.set_editor_content(true);

        ctx.registry
            .get_mut::<Input>()
            .ok_or(LifecycleError::MissingSubsystem("Input"))?
            .set_mouse_visible(true);

        self.initialize_ui(ctx)?;

        let resources = ctx
            .registry
            .get::<ResourceCache>()
            .cloned()
            .ok_or(LifecycleError::MissingSubsystem("ResourceCache"))?;
        ctx.registry
            .register(ScriptingHost::new(resources.clone(), ctx.events.sender()));

        ctx.events.subscribe(EventKind::ScriptRuntimeError);
        ctx.events.subscribe(EventKind::ExitRequested);

        let vm = ctx
            .registry
            .get_mut::<ScriptingHost>()
            .ok_or(LifecycleError::MissingSubsystem("ScriptingHost"))?
            .instantiate_vm(MAIN_VM_NAME)?;
        self.vm = Some(VmHandle::clone(&vm));
        vm.init_execution_context()?;
        vm.set_module_search_paths(self.root())?;

        ctx.registry.register_shared(Player::new(resources.clone()));
        toolcore::bind(&vm, &ctx.registry)?;
        editor::bind(
            &vm,
            &ctx.registry,
            ctx.events.sender(),
            ctx.is_editor_content(),
        )?;

        let entry = self.config.entry_script();
        let file = resources
            .get_file(&entry)
            .ok_or_else(|| LifecycleError::EntryScriptMissing { path: entry.clone() })?;
        vm.execute_file(&file)
            .map_err(|source| LifecycleError::EntryScriptFailed { path: entry, source })?;

        ctx.registry
            .get_mut::<LicenseSystem>()
            .ok_or(LifecycleError::MissingSubsystem("LicenseSystem"))?
            .initialize();
        Ok(())
    }

    fn stop(&mut self, ctx: &mut AppContext) -> LifecycleResult<()> {
        if let Some(preferences) = ctx.registry.shared::<Preferences>() {
            if let Err(e) = lock(&preferences).save() {
                tracing::warn!(target: "editor", "Failed to save preferences: {}", e);
            }
        }

        let watch = self.vm.take().map(|vm| JsVm::watch(&vm));
        drop(ctx.registry.remove::<ScriptingHost>());

        let outstanding = watch.map_or(0, |watch| watch.outstanding());
        if outstanding > 0 {
            tracing::error!(target: "editor", "{} VM reference(s) leaked past shutdown", outstanding);
            return Err(LifecycleError::VmLeak { outstanding });
        }
        tracing::info!(target: "editor", "Scripting host released");
        Ok(())
    }

    fn update(&mut self, _ctx: &mut AppContext, dt: f32) {
        if let Some(vm) = &self.vm {
            if let Err(e) = vm.dispatch_update(dt) {
                tracing::error!(target: "editor", "Update callback failed: {}", e);
            }
        }
    }

    fn handle_event(&mut self, ctx: &mut AppContext, event: EditorEvent) {
        match event {
            EditorEvent::ScriptRuntimeError(record) => self.handle_script_error(ctx, &record),
            EditorEvent::ExitRequested => self.handle_exit_requested(ctx),
        }
    }
}
