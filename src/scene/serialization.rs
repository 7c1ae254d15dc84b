use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Camera, Name, Transform};

/// 序列化的场景数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedScene {
    /// 场景名称
    pub name: String,
    /// 实体列表
    #[serde(default)]
    pub entities: Vec<SerializedEntity>,
}

/// 序列化的实体数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedEntity {
    /// 实体ID
    pub id: u64,
    /// 组件列表
    pub components: HashMap<String, SerializedComponent>,
}

/// 序列化的组件数据
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializedComponent {
    Transform {
        position: [f32; 3],
        rotation: [f32; 4], // Quaternion (x, y, z, w)
        scale: [f32; 3],
    },
    Name {
        value: String,
    },
    Camera {
        fov_degrees: f32,
        near: f32,
        far: f32,
    },
}

impl SerializedScene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    /// 从World序列化场景
    pub fn from_world(world: &World, name: impl Into<String>) -> Self {
        let mut scene = Self::new(name);

        for entity in world.iter_entities() {
            let id = entity.id();
            let mut serialized_entity = SerializedEntity {
                id: id.to_bits(),
                components: HashMap::new(),
            };

            if let Some(transform) = world.get::<Transform>(id) {
                serialized_entity.components.insert(
                    "Transform".to_string(),
                    SerializedComponent::Transform {
                        position: transform.pos.to_array(),
                        rotation: transform.rot.to_array(),
                        scale: transform.scale.to_array(),
                    },
                );
            }
            if let Some(name) = world.get::<Name>(id) {
                serialized_entity.components.insert(
                    "Name".to_string(),
                    SerializedComponent::Name {
                        value: name.0.clone(),
                    },
                );
            }
            if let Some(camera) = world.get::<Camera>(id) {
                serialized_entity.components.insert(
                    "Camera".to_string(),
                    SerializedComponent::Camera {
                        fov_degrees: camera.fov_degrees,
                        near: camera.near,
                        far: camera.far,
                    },
                );
            }

            // 只添加有组件的实体
            if !serialized_entity.components.is_empty() {
                scene.entities.push(serialized_entity);
            }
        }

        scene
    }

    /// 反序列化场景到World
    pub fn to_world(&self, world: &mut World) -> HashMap<u64, Entity> {
        let mut entity_map = HashMap::new();

        for serialized_entity in &self.entities {
            let mut entity_mut = world.spawn_empty();
            entity_map.insert(serialized_entity.id, entity_mut.id());

            for component_data in serialized_entity.components.values() {
                match component_data {
                    SerializedComponent::Transform {
                        position,
                        rotation,
                        scale,
                    } => {
                        entity_mut.insert(Transform {
                            pos: Vec3::from_array(*position),
                            rot: Quat::from_array(*rotation),
                            scale: Vec3::from_array(*scale),
                        });
                    }
                    SerializedComponent::Name { value } => {
                        entity_mut.insert(Name(value.clone()));
                    }
                    SerializedComponent::Camera {
                        fov_degrees,
                        near,
                        far,
                    } => {
                        entity_mut.insert(Camera {
                            fov_degrees: *fov_degrees,
                            near: *near,
                            far: *far,
                        });
                    }
                }
            }
        }

        entity_map
    }

    /// 从JSON字节解析
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// 序列化为JSON文本
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_serialization() {
        let mut world = World::new();

        world.spawn((
            Transform {
                pos: Vec3::new(1.0, 2.0, 3.0),
                rot: Quat::IDENTITY,
                scale: Vec3::ONE,
            },
            Name("cube".to_string()),
        ));
        world.spawn((Transform::default(), Camera::default()));

        let scene = SerializedScene::from_world(&world, "test_scene");
        assert_eq!(scene.entities.len(), 2);

        let mut new_world = World::new();
        let entity_map = scene.to_world(&mut new_world);
        assert_eq!(entity_map.len(), 2);

        let mut query = new_world.query::<(&Transform, &Name)>();
        let named: Vec<_> = query.iter(&new_world).collect();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].0.pos, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(named[0].1 .0, "cube");

        let mut cameras = new_world.query::<&Camera>();
        assert_eq!(cameras.iter(&new_world).count(), 1);
    }

    #[test]
    fn test_json_text_format() {
        let json = r#"{
            "name": "level",
            "entities": [
                { "id": 1, "components": {
                    "Name": { "type": "Name", "value": "light" },
                    "Transform": { "type": "Transform",
                        "position": [0, 5, 0], "rotation": [0, 0, 0, 1], "scale": [1, 1, 1] }
                } }
            ]
        }"#;
        let scene = SerializedScene::from_json_bytes(json.as_bytes()).unwrap();
        assert_eq!(scene.name, "level");
        assert_eq!(scene.entities[0].components.len(), 2);

        let text = scene.to_json().unwrap();
        assert!(text.contains("\"light\""));
    }
}
