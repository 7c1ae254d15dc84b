//! 模块解析：在搜索根下查找 `require` 的目标

use crate::subsystems::ResourceCache;

/// 模块解析器
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    resources: ResourceCache,
    roots: Vec<String>,
}

impl ModuleResolver {
    pub fn new(resources: ResourceCache) -> Self {
        Self {
            resources,
            roots: Vec::new(),
        }
    }

    pub fn set_roots(&mut self, roots: Vec<String>) {
        self.roots = roots;
    }

    /// 把模块标识解析为资源名
    ///
    /// 依次尝试每个搜索根，最后尝试把标识本身当作资源名。
    pub fn resolve(&self, id: &str) -> Option<String> {
        let id = id.trim().trim_start_matches("./");
        if id.is_empty() {
            return None;
        }
        let file = if id.ends_with(".js") {
            id.to_string()
        } else {
            format!("{}.js", id)
        };

        self.roots
            .iter()
            .map(|root| format!("{}/{}", root, file))
            .chain(std::iter::once(file.clone()))
            .find(|candidate| self.resources.exists(candidate))
    }

    /// 读取模块源码
    pub fn read(&self, name: &str) -> Option<String> {
        let file = self.resources.get_file(name)?;
        match file.text() {
            Some(text) => Some(text.to_string()),
            None => {
                tracing::warn!(target: "script", "Module {} is not valid UTF-8", name);
                None
            }
        }
    }
}
