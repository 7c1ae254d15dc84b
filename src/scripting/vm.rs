// ============================================================================
// JavaScript 虚拟机
// 初始化顺序：执行上下文 -> 模块搜索路径 -> 原生绑定 -> 执行脚本
// ============================================================================

use rquickjs::{qjs, Context, Ctx, Function, Object, Runtime, Value};
use std::cell::{Cell, RefCell};
use std::ffi::CString;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};

use super::bindings::forward_log;
use super::exception::{catch_exception, ScriptRuntimeError};
use super::modules::ModuleResolver;
use crate::core::error::{ScriptError, ScriptResult};
use crate::core::events::{EditorEvent, EventSender};
use crate::subsystems::{ResourceCache, ResourceFile};

/// 虚拟机句柄；主线程内共享
pub type VmHandle = Rc<JsVm>;

/// 全局每帧回调名
pub const UPDATE_CALLBACK: &str = "onEditorUpdate";

/// 执行上下文序言：`console` 与 CommonJS 风格的 `require`
const PRELUDE: &str = r#"
(function (global, host) {
    "use strict";
    function format(args) {
        return Array.prototype.map.call(args, function (arg) {
            if (typeof arg === "string") return arg;
            try {
                var text = JSON.stringify(arg);
                return text === undefined ? String(arg) : text;
            } catch (e) {
                return String(arg);
            }
        }).join(" ");
    }
    function logger(level) {
        return function () { host.log(level, format(arguments)); };
    }
    global.console = {
        log: logger("info"),
        info: logger("info"),
        debug: logger("debug"),
        warn: logger("warn"),
        error: logger("error")
    };

    var cache = Object.create(null);
    global.require = function require(id) {
        var resolved = host.resolveModule(String(id));
        if (resolved === undefined || resolved === null) {
            throw new Error("Cannot find module '" + id + "'");
        }
        var cached = cache[resolved];
        if (cached !== undefined) return cached.exports;

        var source = host.readModule(resolved);
        if (source === undefined || source === null) {
            throw new Error("Cannot read module '" + resolved + "'");
        }
        var module = { id: resolved, exports: {} };
        cache[resolved] = module;
        var factory = new Function("exports", "require", "module", "__filename", source);
        factory.call(module.exports, module.exports, require, module, resolved);
        return module.exports;
    };
    delete global.__host;
})(globalThis, globalThis.__host);
"#;

/// 虚拟机初始化状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VmState {
    Created,
    ContextReady,
    SearchPathsSet,
    Bound,
    Running,
}

impl VmState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmState::Created => "Created",
            VmState::ContextReady => "ContextReady",
            VmState::SearchPathsSet => "SearchPathsSet",
            VmState::Bound => "Bound",
            VmState::Running => "Running",
        }
    }
}

/// 已注册的原生 API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRecord {
    pub api: String,
    pub sequence: u64,
}

/// JavaScript 虚拟机
pub struct JsVm {
    name: String,
    // context 先于 runtime 释放
    context: Context,
    _runtime: Runtime,
    state: Cell<VmState>,
    resolver: Arc<Mutex<ModuleResolver>>,
    events: EventSender,
    sequence: Cell<u64>,
    bindings: RefCell<Vec<BindingRecord>>,
    first_execution: Cell<Option<u64>>,
    current_file: RefCell<String>,
}

impl std::fmt::Debug for JsVm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsVm")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .field("bindings", &self.bindings.borrow().len())
            .finish()
    }
}

impl JsVm {
    pub(crate) fn new(
        name: impl Into<String>,
        resources: ResourceCache,
        events: EventSender,
    ) -> ScriptResult<Self> {
        let runtime = Runtime::new().map_err(|e| ScriptError::VmCreation(e.to_string()))?;
        let context = Context::full(&runtime).map_err(|e| ScriptError::VmCreation(e.to_string()))?;
        let name = name.into();
        tracing::debug!(target: "script", "Created VM {}", name);

        Ok(Self {
            name,
            context,
            _runtime: runtime,
            state: Cell::new(VmState::Created),
            resolver: Arc::new(Mutex::new(ModuleResolver::new(resources))),
            events,
            sequence: Cell::new(0),
            bindings: RefCell::new(Vec::new()),
            first_execution: Cell::new(None),
            current_file: RefCell::new(String::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> VmState {
        self.state.get()
    }

    /// 观察句柄，不延长虚拟机生命周期
    pub fn watch(handle: &VmHandle) -> VmWatch {
        VmWatch(Rc::downgrade(handle))
    }

    fn expect_state(&self, allowed: &[VmState]) -> ScriptResult<()> {
        let found = self.state.get();
        if allowed.contains(&found) {
            Ok(())
        } else {
            Err(ScriptError::InvalidState {
                expected: allowed
                    .iter()
                    .map(VmState::as_str)
                    .collect::<Vec<_>>()
                    .join("|"),
                found: found.as_str().to_string(),
            })
        }
    }

    fn next_sequence(&self) -> u64 {
        let next = self.sequence.get() + 1;
        self.sequence.set(next);
        next
    }

    // ========================================================================
    // 初始化
    // ========================================================================

    /// 安装标准全局对象：`console` 与 `require`
    pub fn init_execution_context(&self) -> ScriptResult<()> {
        self.expect_state(&[VmState::Created])?;

        let resolver = Arc::clone(&self.resolver);
        let reader = Arc::clone(&self.resolver);
        self.context.with(|ctx| -> rquickjs::Result<()> {
            let host = Object::new(ctx.clone())?;
            host.set(
                "log",
                Function::new(ctx.clone(), |level: String, message: String| {
                    forward_log(&level, &message)
                })?,
            )?;
            host.set(
                "resolveModule",
                Function::new(ctx.clone(), move |id: String| -> Option<String> {
                    crate::core::registry::lock(&resolver).resolve(&id)
                })?,
            )?;
            host.set(
                "readModule",
                Function::new(ctx.clone(), move |name: String| -> Option<String> {
                    crate::core::registry::lock(&reader).read(&name)
                })?,
            )?;
            ctx.globals().set("__host", host)?;
            ctx.eval::<Value, _>(PRELUDE)?;
            Ok(())
        })?;

        self.state.set(VmState::ContextReady);
        tracing::debug!(target: "script", "VM {} execution context ready", self.name);
        Ok(())
    }

    /// 设置模块搜索路径；多个根用 `;` 分隔
    pub fn set_module_search_paths(&self, roots: &str) -> ScriptResult<()> {
        self.expect_state(&[VmState::ContextReady, VmState::SearchPathsSet])?;

        let roots: Vec<String> = roots
            .split(';')
            .map(|root| root.trim().trim_end_matches('/'))
            .filter(|root| !root.is_empty())
            .map(str::to_string)
            .collect();
        tracing::debug!(target: "script", "VM {} module search paths: {:?}", self.name, roots);
        crate::core::registry::lock(&self.resolver).set_roots(roots);

        self.state.set(VmState::SearchPathsSet);
        Ok(())
    }

    /// 注册一组原生 API
    ///
    /// 必须在搜索路径之后、任何脚本执行之前调用。
    pub fn register_bindings<F>(&self, api: &str, install: F) -> ScriptResult<()>
    where
        F: for<'js> FnOnce(&Ctx<'js>, &Object<'js>) -> rquickjs::Result<()>,
    {
        self.expect_state(&[VmState::SearchPathsSet, VmState::Bound])?;

        self.context
            .with(|ctx| {
                let globals = ctx.globals();
                install(&ctx, &globals)
            })
            .map_err(|e| ScriptError::Binding(format!("{}: {}", api, e)))?;

        let sequence = self.next_sequence();
        self.bindings.borrow_mut().push(BindingRecord {
            api: api.to_string(),
            sequence,
        });
        self.state.set(VmState::Bound);
        tracing::debug!(target: "script", "Registered {} bindings", api);
        Ok(())
    }

    pub fn bindings(&self) -> Vec<BindingRecord> {
        self.bindings.borrow().clone()
    }

    /// 第一次执行脚本时的序号
    pub fn first_execution_sequence(&self) -> Option<u64> {
        self.first_execution.get()
    }

    // ========================================================================
    // 执行
    // ========================================================================

    /// 执行资源文件
    ///
    /// 编译失败返回错误；运行时抛出的异常作为事件发布，本调用仍返回 `Ok`。
    pub fn execute_file(&self, file: &ResourceFile) -> ScriptResult<()> {
        let source = file
            .text()
            .ok_or_else(|| ScriptError::Encoding(file.name.clone()))?;
        self.execute_source(&file.name, source)
    }

    /// 执行源码文本
    pub fn execute_source(&self, file_name: &str, source: &str) -> ScriptResult<()> {
        self.expect_state(&[VmState::Bound, VmState::Running])?;

        if self.first_execution.get().is_none() {
            self.first_execution.set(Some(self.next_sequence()));
        }
        self.state.set(VmState::Running);
        *self.current_file.borrow_mut() = file_name.to_string();
        tracing::info!(target: "script", "Executing {}", file_name);

        let result = self.context.with(|ctx| -> rquickjs::Result<Option<_>> {
            Ok(match eval_in_stages(&ctx, file_name, source)? {
                Ok(()) => None,
                Err(stage) => Some((stage, catch_exception(&ctx))),
            })
        });

        match result {
            Ok(None) => Ok(()),
            Ok(Some((Stage::Compile, caught))) => {
                Err(ScriptError::Compilation(caught.describe(file_name)))
            }
            Ok(Some((Stage::Run, caught))) => {
                self.publish_runtime_error(caught.into_record(file_name));
                Ok(())
            }
            Err(e) => Err(ScriptError::Runtime(e.to_string())),
        }
    }

    /// 调用脚本定义的每帧回调；返回回调是否存在
    pub fn dispatch_update(&self, dt: f32) -> ScriptResult<bool> {
        if self.state.get() != VmState::Running {
            return Ok(false);
        }

        let result = self.context.with(|ctx| -> rquickjs::Result<Option<_>> {
            let callback: Value = ctx.globals().get(UPDATE_CALLBACK)?;
            let Some(function) = callback.as_function() else {
                return Ok(None);
            };
            match function.call::<_, Value>((dt,)) {
                Ok(_) => Ok(Some(None)),
                Err(rquickjs::Error::Exception) => Ok(Some(Some(catch_exception(&ctx)))),
                Err(e) => Err(e),
            }
        });

        match result {
            Ok(None) => Ok(false),
            Ok(Some(None)) => Ok(true),
            Ok(Some(Some(caught))) => {
                let current = self.current_file.borrow().clone();
                self.publish_runtime_error(caught.into_record(&current));
                Ok(true)
            }
            Err(e) => Err(ScriptError::Runtime(e.to_string())),
        }
    }

    fn publish_runtime_error(&self, record: ScriptRuntimeError) {
        tracing::error!(target: "script", "Uncaught script error: {}", record);
        if let Some(stack) = &record.stack {
            tracing::debug!(target: "script", "{}", stack);
        }
        self.events.send(EditorEvent::ScriptRuntimeError(record));
    }
}

impl Drop for JsVm {
    fn drop(&mut self) {
        tracing::debug!(target: "script", "Destroying VM {}", self.name);
    }
}

/// 异常发生的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Compile,
    Run,
}

/// 先只编译、再执行全局脚本
///
/// 按阶段区分错误：只有编译阶段的异常才是加载失败，
/// 执行中抛出的任何异常（包括 `SyntaxError`）都属于运行时错误。
fn eval_in_stages(ctx: &Ctx<'_>, file_name: &str, source: &str) -> rquickjs::Result<Result<(), Stage>> {
    let source = CString::new(source)?;
    let file_name = CString::new(file_name)?;
    let raw = ctx.as_raw().as_ptr();
    let flags =
        (qjs::JS_EVAL_TYPE_GLOBAL | qjs::JS_EVAL_FLAG_STRICT | qjs::JS_EVAL_FLAG_COMPILE_ONLY) as i32;

    // SAFETY: 调用方处于 `Context::with` 内；字节码函数的引用由 JS_EvalFunction 接管，
    // 返回值交给 `Value` 释放
    unsafe {
        let compiled = qjs::JS_Eval(
            raw,
            source.as_ptr(),
            source.as_bytes().len() as _,
            file_name.as_ptr(),
            flags,
        );
        if qjs::JS_IsException(compiled) {
            return Ok(Err(Stage::Compile));
        }
        let completion = qjs::JS_EvalFunction(raw, compiled);
        if qjs::JS_IsException(completion) {
            return Ok(Err(Stage::Run));
        }
        drop(Value::from_raw(ctx.clone(), completion));
    }
    Ok(Ok(()))
}

/// 虚拟机观察句柄
#[derive(Debug, Clone)]
pub struct VmWatch(Weak<JsVm>);

impl VmWatch {
    /// 仍持有虚拟机的强引用数
    pub fn outstanding(&self) -> usize {
        self.0.strong_count()
    }

    pub fn is_released(&self) -> bool {
        self.outstanding() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{EventBus, EventKind};
    use std::fs;

    fn scripts(files: &[(&str, &str)]) -> (tempfile::TempDir, ResourceCache) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let mut cache = ResourceCache::new(dir.path());
        cache.add_resource_dir(dir.path());
        (dir, cache)
    }

    fn ready_vm(cache: ResourceCache, bus: &EventBus) -> JsVm {
        let vm = JsVm::new("TestVM", cache, bus.sender()).unwrap();
        vm.init_execution_context().unwrap();
        vm.set_module_search_paths("Scripts").unwrap();
        vm.register_bindings("Test", |ctx, globals| {
            globals.set("answer", Function::new(ctx.clone(), || 42)?)
        })
        .unwrap();
        vm
    }

    #[test]
    fn test_out_of_order_calls_rejected() {
        let (_dir, cache) = scripts(&[]);
        let bus = EventBus::new();
        let vm = JsVm::new("TestVM", cache, bus.sender()).unwrap();

        assert!(matches!(
            vm.set_module_search_paths("Scripts"),
            Err(ScriptError::InvalidState { .. })
        ));
        assert!(vm.execute_source("x.js", "1").is_err());

        vm.init_execution_context().unwrap();
        assert!(vm
            .register_bindings("Early", |_, _| Ok(()))
            .is_err());
        assert!(vm.init_execution_context().is_err());
    }

    #[test]
    fn test_bindings_precede_first_execution() {
        let (_dir, cache) = scripts(&[]);
        let bus = EventBus::new();
        let vm = ready_vm(cache, &bus);

        vm.execute_source("main.js", "if (answer() !== 42) throw new Error('unbound');")
            .unwrap();
        let first = vm.first_execution_sequence().unwrap();
        assert!(vm.bindings().iter().all(|b| b.sequence < first));
        assert_eq!(vm.state(), VmState::Running);

        // 执行后不能再注册
        assert!(vm.register_bindings("Late", |_, _| Ok(())).is_err());
    }

    #[test]
    fn test_syntax_error_is_compilation_failure() {
        let (_dir, cache) = scripts(&[]);
        let bus = EventBus::new();
        let vm = ready_vm(cache, &bus);

        let err = vm.execute_source("main.js", "function (").unwrap_err();
        assert!(matches!(err, ScriptError::Compilation(_)));
    }

    #[test]
    fn test_runtime_error_published_as_event() {
        let (_dir, cache) = scripts(&[]);
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::ScriptRuntimeError);
        let vm = ready_vm(cache, &bus);

        vm.execute_source("main.js", "var a = 1;\nthrow new Error('bad state');")
            .unwrap();

        let events = bus.drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            EditorEvent::ScriptRuntimeError(record) => {
                assert_eq!(record.message, "bad state");
                assert_eq!(record.filename, "main.js");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_thrown_while_running_is_runtime_error() {
        let (_dir, cache) = scripts(&[]);
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::ScriptRuntimeError);
        let vm = ready_vm(cache, &bus);

        for source in [
            "var ready = true;\nthrow new SyntaxError('bad state');",
            "var ready = true;\nvar prefs = JSON.parse('{ broken');",
        ] {
            vm.execute_source("main.js", source).unwrap();
            let events = bus.drain();
            assert_eq!(events.len(), 1, "{}", source);
            match &events[0] {
                EditorEvent::ScriptRuntimeError(record) => {
                    assert_eq!(record.filename, "main.js");
                    assert_eq!(record.line_number, 2, "{:?}", record);
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn test_require_uses_search_paths() {
        let (_dir, cache) = scripts(&[
            ("Scripts/util.js", "exports.double = function (x) { return x * 2; };"),
        ]);
        let bus = EventBus::new();
        let vm = ready_vm(cache, &bus);

        vm.execute_source(
            "main.js",
            "var util = require('util');\n\
             if (util.double(21) !== 42) throw new Error('wrong');\n\
             if (require('./util') !== util) throw new Error('not cached');\n\
             console.log('loaded', { ok: true });",
        )
        .unwrap();
        vm.execute_source("check.js", "globalThis.hostType = typeof __host;")
            .unwrap();
        let hidden = vm
            .context
            .with(|ctx| ctx.globals().get::<_, String>("hostType"))
            .unwrap();
        assert_eq!(hidden, "undefined");
    }

    #[test]
    fn test_dispatch_update() {
        let (_dir, cache) = scripts(&[]);
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::ScriptRuntimeError);
        let vm = ready_vm(cache, &bus);

        // 尚未执行任何脚本
        assert!(!vm.dispatch_update(0.016).unwrap());

        vm.execute_source(
            "main.js",
            "var ticks = 0;\nfunction onEditorUpdate(dt) { ticks++; if (ticks > 1) throw new Error('tick'); }",
        )
        .unwrap();
        assert!(vm.dispatch_update(0.016).unwrap());
        assert!(bus.drain().is_empty());

        assert!(vm.dispatch_update(0.016).unwrap());
        assert_eq!(bus.drain().len(), 1);
    }
}
