// ============================================================================
// 应用生命周期
// Setup -> 引擎启动 -> Start -> 主循环 -> Stop
// ============================================================================

pub mod editor;

pub use editor::EditorApp;

use std::process::ExitCode;

use crate::config::RuntimeConfig;
use crate::core::error::LifecycleResult;
use crate::core::events::{EditorEvent, EventBus};
use crate::core::exit::ExitController;
use crate::core::params::EngineParameters;
use crate::core::registry::SubsystemRegistry;
use crate::core::Engine;
use crate::subsystems::FileSystem;

/// 生命周期各阶段共享的进程状态
pub struct AppContext {
    pub registry: SubsystemRegistry,
    pub events: EventBus,
    pub exit: ExitController,
    editor_content: bool,
}

impl AppContext {
    pub fn new(file_system: FileSystem) -> Self {
        let mut registry = SubsystemRegistry::new();
        registry.register(file_system);
        Self {
            registry,
            events: EventBus::new(),
            exit: ExitController::new(),
            editor_content: false,
        }
    }

    /// 标记当前运行的是编辑器内容而非游戏内容
    pub fn set_editor_content(&mut self, editor_content: bool) {
        self.editor_content = editor_content;
    }

    pub fn is_editor_content(&self) -> bool {
        self.editor_content
    }
}

/// 可被驱动的应用
///
/// `setup` 与 `start` 返回的错误由驱动器统一交给 `ExitController::error_exit`。
pub trait Application {
    /// 引擎启动前：注册叶子服务，填写启动参数
    fn setup(&mut self, ctx: &mut AppContext, params: &mut EngineParameters) -> LifecycleResult<()>;

    /// 引擎启动后：创建脚本虚拟机并执行入口脚本
    fn start(&mut self, ctx: &mut AppContext) -> LifecycleResult<()>;

    /// 关闭：释放 Start 中获取的资源
    fn stop(&mut self, ctx: &mut AppContext) -> LifecycleResult<()>;

    /// 每帧更新
    fn update(&mut self, _ctx: &mut AppContext, _dt: f32) {}

    /// 处理已订阅的事件
    fn handle_event(&mut self, ctx: &mut AppContext, event: EditorEvent);
}

/// 生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    SetUp,
    Started,
    Stopped,
    Aborted,
}

/// 一次运行的结果
#[derive(Debug)]
pub struct RunOutcome {
    pub exit_code: ExitCode,
    pub diagnostic: Option<String>,
    pub frames: u64,
    /// 是否执行了 Stop
    pub stopped: bool,
    /// Stop 检测到的关闭违规（例如虚拟机泄漏）
    pub teardown_error: Option<String>,
}

/// 应用驱动器
pub struct AppRunner {
    ctx: AppContext,
    runtime: RuntimeConfig,
    engine: Option<Engine>,
    phase: Phase,
    teardown_error: Option<String>,
}

impl AppRunner {
    pub fn new(file_system: FileSystem, runtime: RuntimeConfig) -> Self {
        Self {
            ctx: AppContext::new(file_system),
            runtime,
            engine: None,
            phase: Phase::Created,
            teardown_error: None,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    /// 完整运行：Setup、引擎启动、Start、主循环、Stop
    ///
    /// Setup 或 Start 失败时不进入主循环，也不执行 Stop。
    pub fn run<A: Application>(&mut self, app: &mut A) -> RunOutcome {
        let mut frames = 0;
        if self.setup(app) && self.start(app) {
            frames = self.run_loop(app);
            self.stop(app);
        }
        self.outcome(frames)
    }

    /// Setup 与引擎启动；失败时返回 `false`
    pub fn setup<A: Application>(&mut self, app: &mut A) -> bool {
        if self.phase != Phase::Created {
            tracing::warn!(target: "app", "Setup called in phase {:?}", self.phase);
            return false;
        }

        let mut params = EngineParameters::new();
        if let Err(e) = app.setup(&mut self.ctx, &mut params) {
            return self.abort(e.to_string());
        }

        match Engine::bring_up(params, &mut self.ctx.registry) {
            Ok(engine) => {
                self.engine = Some(engine);
                self.phase = Phase::SetUp;
                true
            }
            Err(e) => self.abort(e.to_string()),
        }
    }

    /// Start；失败时返回 `false`
    pub fn start<A: Application>(&mut self, app: &mut A) -> bool {
        if self.phase != Phase::SetUp {
            tracing::warn!(target: "app", "Start called in phase {:?}", self.phase);
            return false;
        }

        match app.start(&mut self.ctx) {
            Ok(()) => {
                self.phase = Phase::Started;
                tracing::info!(target: "app", "Application started");
                true
            }
            Err(e) => self.abort(e.to_string()),
        }
    }

    /// 主循环，直到退出控制器要求停止；返回运行的帧数
    pub fn run_loop<A: Application>(&mut self, app: &mut A) -> u64 {
        let mut frames = 0;
        if self.phase != Phase::Started {
            return frames;
        }

        loop {
            self.pump_events(app);
            if self.ctx.exit.should_stop() {
                break;
            }
            if self.runtime.max_frames.is_some_and(|max| frames >= max) {
                tracing::info!(target: "app", "Frame limit reached after {} frames", frames);
                self.ctx.exit.on_exit_requested();
                break;
            }

            let dt = match self.engine.as_mut() {
                Some(engine) => engine.begin_frame(),
                None => 0.0,
            };
            app.update(&mut self.ctx, dt);
            frames += 1;

            if let Some(engine) = &self.engine {
                engine.end_frame(self.runtime.target_fps);
            }
        }
        if let Some(engine) = &self.engine {
            tracing::info!(
                target: "app",
                "Run loop ended after {} frames, engine up {:.2?}",
                frames,
                engine.uptime()
            );
        }
        frames
    }

    /// 分发已订阅的事件
    pub fn pump_events<A: Application>(&mut self, app: &mut A) {
        for event in self.ctx.events.drain() {
            app.handle_event(&mut self.ctx, event);
        }
    }

    /// Stop；只在 Start 成功后执行一次
    pub fn stop<A: Application>(&mut self, app: &mut A) -> bool {
        if self.phase != Phase::Started {
            tracing::warn!(target: "app", "Stop called in phase {:?}", self.phase);
            return false;
        }

        self.phase = Phase::Stopped;
        match app.stop(&mut self.ctx) {
            Ok(()) => {
                tracing::info!(target: "app", "Application stopped");
                true
            }
            Err(e) => {
                let message = e.to_string();
                self.teardown_error = Some(message.clone());
                self.ctx.exit.error_exit(message);
                false
            }
        }
    }

    fn abort(&mut self, message: String) -> bool {
        self.ctx.exit.error_exit(message);
        self.phase = Phase::Aborted;
        false
    }

    fn outcome(&self, frames: u64) -> RunOutcome {
        RunOutcome {
            exit_code: self.ctx.exit.exit_code(),
            diagnostic: self.ctx.exit.diagnostic().map(str::to_string),
            frames,
            stopped: self.phase == Phase::Stopped,
            teardown_error: self.teardown_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LifecycleError;

    /// 记录调用顺序的测试应用
    #[derive(Default)]
    struct Scripted {
        calls: Vec<&'static str>,
        fail_setup: bool,
        fail_start: bool,
        updates: u32,
    }

    impl Application for Scripted {
        fn setup(&mut self, _ctx: &mut AppContext, _params: &mut EngineParameters) -> LifecycleResult<()> {
            self.calls.push("setup");
            if self.fail_setup {
                return Err(LifecycleError::ResourcePathsUnknown);
            }
            Ok(())
        }

        fn start(&mut self, _ctx: &mut AppContext) -> LifecycleResult<()> {
            self.calls.push("start");
            if self.fail_start {
                return Err(LifecycleError::EntryScriptMissing {
                    path: "EditorHost/main.js".to_string(),
                });
            }
            Ok(())
        }

        fn stop(&mut self, _ctx: &mut AppContext) -> LifecycleResult<()> {
            self.calls.push("stop");
            Ok(())
        }

        fn update(&mut self, ctx: &mut AppContext, _dt: f32) {
            self.updates += 1;
            if self.updates == 3 {
                ctx.exit.on_exit_requested();
            }
        }

        fn handle_event(&mut self, _ctx: &mut AppContext, _event: EditorEvent) {}
    }

    fn runner(max_frames: Option<u64>) -> AppRunner {
        AppRunner::new(
            FileSystem::new(),
            RuntimeConfig {
                target_fps: 0,
                max_frames,
            },
        )
    }

    #[test]
    fn test_graceful_cycle_runs_stop() {
        let mut app = Scripted::default();
        let outcome = runner(None).run(&mut app);

        assert_eq!(app.calls, vec!["setup", "start", "stop"]);
        assert_eq!(outcome.frames, 3);
        assert!(outcome.stopped);
        assert!(outcome.diagnostic.is_none());
    }

    #[test]
    fn test_setup_failure_skips_start_and_stop() {
        let mut app = Scripted {
            fail_setup: true,
            ..Default::default()
        };
        let mut runner = runner(None);
        let outcome = runner.run(&mut app);

        assert_eq!(app.calls, vec!["setup"]);
        assert!(!outcome.stopped);
        assert_eq!(runner.phase(), Phase::Aborted);
        assert_eq!(
            outcome.diagnostic.as_deref(),
            Some("Resource paths are only known in development builds")
        );
    }

    #[test]
    fn test_start_failure_skips_stop() {
        let mut app = Scripted {
            fail_start: true,
            ..Default::default()
        };
        let outcome = runner(None).run(&mut app);

        assert_eq!(app.calls, vec!["setup", "start"]);
        assert!(!outcome.stopped);
        assert_eq!(outcome.diagnostic.as_deref(), Some("Unable to load EditorHost/main.js"));
    }

    #[test]
    fn test_frame_limit_requests_graceful_exit() {
        let mut app = Scripted::default();
        let mut runner = runner(Some(1));
        let outcome = runner.run(&mut app);

        assert_eq!(outcome.frames, 1);
        assert!(outcome.stopped);
        assert!(runner.context().exit.should_stop());
        assert!(!runner.context().exit.is_failed());
    }

    #[test]
    fn test_phases_out_of_order() {
        let mut app = Scripted::default();
        let mut runner = runner(None);
        assert!(!runner.start(&mut app));
        assert!(!runner.stop(&mut app));
        assert!(app.calls.is_empty());
    }
}
