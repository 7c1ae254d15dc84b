//! 场景系统
//!
//! 场景描述以 JSON 存储，加载后实体存放在场景自己的 `World` 中。

pub mod serialization;

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub use serialization::{SerializedComponent, SerializedEntity, SerializedScene};

/// 场景加载错误
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Scene not found: {0}")]
    NotFound(String),

    #[error("Failed to parse scene {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub pos: Vec3,
    pub rot: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            rot: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct Name(pub String);

/// 透视相机组件
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// 视口使用的相机：相机参数加位姿
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub camera: Camera,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
}

fn identity_rotation() -> [f32; 4] {
    Quat::IDENTITY.to_array()
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            position: [0.0; 3],
            rotation: identity_rotation(),
        }
    }
}

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// 已加载的场景
pub struct Scene {
    id: u64,
    name: String,
    source: String,
    world: World,
    entity_map: HashMap<u64, Entity>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("source", &self.source)
            .field("entities", &self.entity_map.len())
            .finish()
    }
}

impl Scene {
    /// 从场景描述构建
    pub fn from_serialized(source: impl Into<String>, serialized: &SerializedScene) -> Self {
        let mut world = World::new();
        let entity_map = serialized.to_world(&mut world);
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            name: serialized.name.clone(),
            source: source.into(),
            world,
            entity_map,
        }
    }

    /// 从 JSON 字节解析场景
    pub fn from_json_bytes(source: &str, bytes: &[u8]) -> Result<Self, SceneError> {
        let serialized =
            SerializedScene::from_json_bytes(bytes).map_err(|e| SceneError::Parse {
                path: source.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_serialized(source, &serialized))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 加载该场景的资源名
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entity_count(&self) -> usize {
        self.entity_map.len()
    }

    /// 场景默认相机：第一个带相机组件的实体（按描述ID排序）
    pub fn default_camera(&self) -> Option<CameraView> {
        self.sorted_entities()
            .find_map(|entity| self.camera_view(entity))
    }

    /// 名称为 `name` 的相机实体
    pub fn named_camera(&self, name: &str) -> Option<CameraView> {
        self.sorted_entities()
            .filter(|entity| {
                self.world
                    .get::<Name>(*entity)
                    .is_some_and(|n| n.0 == name)
            })
            .find_map(|entity| self.camera_view(entity))
    }

    fn sorted_entities(&self) -> impl Iterator<Item = Entity> {
        let mut ids: Vec<_> = self.entity_map.iter().map(|(k, v)| (*k, *v)).collect();
        ids.sort_by_key(|(id, _)| *id);
        ids.into_iter().map(|(_, entity)| entity)
    }

    fn camera_view(&self, entity: Entity) -> Option<CameraView> {
        let camera = *self.world.get::<Camera>(entity)?;
        let transform = self
            .world
            .get::<Transform>(entity)
            .copied()
            .unwrap_or_default();
        Some(CameraView {
            camera,
            position: transform.pos.to_array(),
            rotation: transform.rot.to_array(),
        })
    }
}
