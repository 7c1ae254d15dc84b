//! 资源缓存
//!
//! 按资源名在搜索路径中查找文件。搜索路径按注册顺序优先，
//! 相对路径相对于资源前缀目录解析。

use std::fs;
use std::path::{Path, PathBuf};

/// 已加载的资源文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    /// 资源名（调用方使用的相对名称）
    pub name: String,
    /// 实际文件路径
    pub path: PathBuf,
    /// 文件内容
    pub bytes: Vec<u8>,
}

impl ResourceFile {
    /// 以 UTF-8 文本读取内容
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// 资源缓存
#[derive(Debug, Clone, Default)]
pub struct ResourceCache {
    prefix: PathBuf,
    search_paths: Vec<PathBuf>,
}

impl ResourceCache {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            search_paths: Vec::new(),
        }
    }

    /// 添加资源目录
    pub fn add_resource_dir(&mut self, dir: impl AsRef<Path>) {
        let dir = dir.as_ref();
        let resolved = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.prefix.join(dir)
        };
        if !resolved.is_dir() {
            tracing::warn!(target: "resources", "Resource dir {:?} does not exist", resolved);
        }
        if !self.search_paths.contains(&resolved) {
            tracing::debug!(target: "resources", "Added resource dir {:?}", resolved);
            self.search_paths.push(resolved);
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// 解析资源名到第一个存在的文件
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = sanitize(name)?;
        self.search_paths
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// 读取资源文件；不存在或不可读时返回 `None`
    pub fn get_file(&self, name: &str) -> Option<ResourceFile> {
        let path = self.resolve(name)?;
        match fs::read(&path) {
            Ok(bytes) => Some(ResourceFile {
                name: name.to_string(),
                path,
                bytes,
            }),
            Err(e) => {
                tracing::error!(target: "resources", "Failed to read {:?}: {}", path, e);
                None
            }
        }
    }
}

/// 资源名统一为相对路径，拒绝跳出搜索目录
fn sanitize(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let trimmed = normalized.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.split('/').any(|part| part == "..") {
        return None;
    }
    Some(PathBuf::from(trimmed))
}
