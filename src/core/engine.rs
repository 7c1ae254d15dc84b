//! 引擎启动
//!
//! 在 Setup 与 Start 之间按启动参数完成引擎初始化：
//! 日志、窗口设置、资源缓存以及 Start 依赖的引擎子系统。

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use super::error::{EngineError, EngineResult};
use super::params::{keys, EngineParameters};
use super::registry::SubsystemRegistry;
use crate::config::LogLevel;
use crate::subsystems::{FileSystem, Input, LicenseSystem, ModelSettings, ResourceCache, Ui};

/// 窗口设置（无头运行时只记录）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSettings {
    pub title: String,
    pub resizable: bool,
    pub fullscreen: bool,
    pub icon: Option<String>,
}

/// 已启动的引擎
#[derive(Debug)]
pub struct Engine {
    window: WindowSettings,
    started_at: Instant,
    last_frame: Instant,
    frame_count: u64,
}

impl Engine {
    /// 按启动参数初始化引擎并注册引擎子系统
    pub fn bring_up(params: EngineParameters, registry: &mut SubsystemRegistry) -> EngineResult<Self> {
        let level = params.log_level(keys::LOG_LEVEL)?.unwrap_or(LogLevel::Info);
        let log_file = params.path(keys::LOG_NAME)?;
        initialize_logging(log_file.as_deref(), level)?;
        tracing::info!(target: "engine", "Engine starting ({} parameters)", params.len());

        let window = WindowSettings {
            title: params
                .text(keys::WINDOW_TITLE)?
                .unwrap_or(env!("CARGO_PKG_NAME"))
                .to_string(),
            resizable: params.bool_or(keys::WINDOW_RESIZABLE, false)?,
            fullscreen: params.bool_or(keys::FULL_SCREEN, false)?,
            icon: params.text(keys::WINDOW_ICON)?.map(str::to_string),
        };
        tracing::info!(
            target: "engine",
            "Window '{}' (resizable: {}, fullscreen: {})",
            window.title,
            window.resizable,
            window.fullscreen
        );

        let resources = build_resource_cache(&params, registry)?;

        registry.register(Input::new());
        registry.register(Ui::new(resources.clone()));
        registry.register(ModelSettings::new());
        registry.register(LicenseSystem::new());
        registry.register(resources);

        let now = Instant::now();
        Ok(Self {
            window,
            started_at: now,
            last_frame: now,
            frame_count: 0,
        })
    }

    pub fn window(&self) -> &WindowSettings {
        &self.window
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// 开始新的一帧，返回距上一帧的秒数
    pub fn begin_frame(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;
        dt
    }

    /// 按目标帧率休眠剩余时间
    pub fn end_frame(&self, target_fps: u32) {
        if target_fps == 0 {
            return;
        }
        let frame_time = Duration::from_secs_f64(1.0 / f64::from(target_fps));
        let spent = self.last_frame.elapsed();
        if spent < frame_time {
            std::thread::sleep(frame_time - spent);
        }
    }
}

/// 资源缓存：前缀目录加上 `ResourcePaths` 中的每个目录
fn build_resource_cache(
    params: &EngineParameters,
    registry: &SubsystemRegistry,
) -> EngineResult<ResourceCache> {
    let prefix = match params.path(keys::RESOURCE_PREFIX_PATH)? {
        Some(prefix) if !prefix.as_os_str().is_empty() => prefix,
        _ => match registry.get::<FileSystem>() {
            Some(file_system) => file_system.current_dir()?,
            None => std::env::current_dir()?,
        },
    };

    let mut cache = ResourceCache::new(prefix);
    for dir in params.paths(keys::RESOURCE_PATHS)? {
        cache.add_resource_dir(dir);
    }
    tracing::debug!(target: "engine", "Resource search paths: {:?}", cache.search_paths());
    Ok(cache)
}

/// 初始化日志
///
/// 指定日志文件时同时写入文件与标准错误。`RUST_LOG` 优先于配置级别。
/// 全局订阅者已安装时（例如同一进程中的多次启动）保留原订阅者。
pub fn initialize_logging(log_file: Option<&Path>, level: LogLevel) -> EngineResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    let installed = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| EngineError::Logging(format!("{}: {}", path.display(), e)))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file).and(std::io::stderr))
                .try_init()
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    if installed.is_err() {
        tracing::debug!(target: "engine", "Logging already initialized");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_bring_up_registers_subsystems() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("CoreData");
        fs::create_dir_all(&data).unwrap();

        let mut params = EngineParameters::new();
        params.set(keys::WINDOW_TITLE, "EditorHost");
        params.set(keys::WINDOW_RESIZABLE, true);
        params.set(keys::LOG_NAME, dir.path().join("Logs").join("EditorHost.log"));
        params.set(keys::LOG_LEVEL, LogLevel::Debug);
        params.set(keys::RESOURCE_PREFIX_PATH, dir.path().to_path_buf());
        params.set(keys::RESOURCE_PATHS, vec![PathBuf::from("CoreData")]);

        let mut registry = SubsystemRegistry::new();
        let engine = Engine::bring_up(params, &mut registry).unwrap();

        assert_eq!(engine.window().title, "EditorHost");
        assert!(engine.window().resizable);
        assert!(registry.contains::<Input>());
        assert!(registry.contains::<Ui>());
        assert!(registry.contains::<ModelSettings>());
        assert!(registry.contains::<LicenseSystem>());
        let cache = registry.get::<ResourceCache>().unwrap();
        assert_eq!(cache.search_paths(), &[data]);
        assert!(dir.path().join("Logs").is_dir());
    }

    #[test]
    fn test_invalid_parameter_type() {
        let mut params = EngineParameters::new();
        params.set(keys::FULL_SCREEN, "yes");
        let mut registry = SubsystemRegistry::new();
        assert!(matches!(
            Engine::bring_up(params, &mut registry),
            Err(EngineError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_frame_timing() {
        let mut registry = SubsystemRegistry::new();
        let mut engine = Engine::bring_up(EngineParameters::new(), &mut registry).unwrap();
        assert!(engine.begin_frame() >= 0.0);
        assert_eq!(engine.frame_count(), 1);
        engine.end_frame(0);
    }
}
