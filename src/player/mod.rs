//! Player 子系统
//!
//! 持有唯一的视口，并把加载的场景挂到视口上。
//! 重新加载场景只替换视口引用的场景，视口本身保持不变。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::scene::{CameraView, Scene, SceneError};
use crate::subsystems::ResourceCache;

static NEXT_VIEWPORT_ID: AtomicU64 = AtomicU64::new(1);

/// 视口
#[derive(Debug)]
pub struct Viewport {
    id: u64,
    scene: Option<Arc<Scene>>,
    camera: Option<CameraView>,
}

impl Viewport {
    fn new() -> Self {
        Self {
            id: NEXT_VIEWPORT_ID.fetch_add(1, Ordering::Relaxed),
            scene: None,
            camera: None,
        }
    }

    /// 视口身份
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn scene(&self) -> Option<&Arc<Scene>> {
        self.scene.as_ref()
    }

    pub fn camera(&self) -> Option<&CameraView> {
        self.camera.as_ref()
    }

    fn attach(&mut self, scene: Arc<Scene>, camera: CameraView) {
        self.scene = Some(scene);
        self.camera = Some(camera);
    }
}

/// Player 门面
#[derive(Debug)]
pub struct Player {
    resources: ResourceCache,
    viewport: Viewport,
}

impl Player {
    pub fn new(resources: ResourceCache) -> Self {
        let viewport = Viewport::new();
        tracing::debug!(target: "player", "Player created with viewport {}", viewport.id());
        Self {
            resources,
            viewport,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// 加载场景并挂到视口上
    ///
    /// 指定 `camera` 时使用它代替场景的默认相机。失败返回 `None`，
    /// 此时视口保持原来的场景。
    pub fn load_scene(&mut self, filename: &str, camera: Option<CameraView>) -> Option<Arc<Scene>> {
        match self.try_load_scene(filename, camera) {
            Ok(scene) => Some(scene),
            Err(e) => {
                tracing::error!(target: "player", "{}", e);
                None
            }
        }
    }

    /// 带错误信息的场景加载
    pub fn try_load_scene(
        &mut self,
        filename: &str,
        camera: Option<CameraView>,
    ) -> Result<Arc<Scene>, SceneError> {
        let scene = self.read_scene(filename)?;
        Ok(self.attach(scene, camera))
    }

    /// 加载场景并使用场景中名为 `camera_name` 的相机
    ///
    /// 找不到该相机时退回场景默认相机。
    pub fn load_scene_with_camera(&mut self, filename: &str, camera_name: &str) -> Option<Arc<Scene>> {
        let scene = match self.read_scene(filename) {
            Ok(scene) => scene,
            Err(e) => {
                tracing::error!(target: "player", "{}", e);
                return None;
            }
        };
        let camera = scene.named_camera(camera_name);
        if camera.is_none() {
            tracing::warn!(target: "player", "Camera {} not found in {}", camera_name, filename);
        }
        Some(self.attach(scene, camera))
    }

    fn read_scene(&self, filename: &str) -> Result<Scene, SceneError> {
        let file = self
            .resources
            .get_file(filename)
            .ok_or_else(|| SceneError::NotFound(filename.to_string()))?;
        Scene::from_json_bytes(filename, &file.bytes)
    }

    fn attach(&mut self, scene: Scene, camera: Option<CameraView>) -> Arc<Scene> {
        let view = camera
            .or_else(|| scene.default_camera())
            .unwrap_or_default();
        let scene = Arc::new(scene);

        if let Some(previous) = self.viewport.scene() {
            tracing::debug!(target: "player", "Replacing scene {}", previous.name());
        }
        self.viewport.attach(Arc::clone(&scene), view);
        tracing::info!(target: "player", "Loaded scene {} from {}", scene.name(), scene.source());
        scene
    }
}
