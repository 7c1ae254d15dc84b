//! 工具系统：当前项目

use std::path::{Path, PathBuf};

/// 打开的项目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub path: PathBuf,
    pub name: String,
}

/// 项目打开失败
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Project directory not found: {0}")]
    NotFound(String),
}

/// 工具系统
#[derive(Debug, Default)]
pub struct ToolSystem {
    project: Option<Project>,
}

impl ToolSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// 打开项目目录，替换当前项目
    pub fn open_project(&mut self, path: impl AsRef<Path>) -> Result<&Project, ProjectError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(ProjectError::NotFound(path.display().to_string()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if let Some(previous) = self.project.take() {
            tracing::info!(target: "tools", "Closing project {}", previous.name);
        }
        tracing::info!(target: "tools", "Opened project {} at {:?}", name, path);
        Ok(self.project.insert(Project {
            path: path.to_path_buf(),
            name,
        }))
    }

    pub fn close_project(&mut self) -> Option<Project> {
        self.project.take()
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }
}
