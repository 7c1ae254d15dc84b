//! 引擎启动参数
//!
//! Setup 阶段构建一次，引擎启动时按值消费，之后不可再修改。

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::config::LogLevel;

use super::error::{EngineError, EngineResult};

/// 已知的参数名
pub mod keys {
    pub const WINDOW_TITLE: &str = "WindowTitle";
    pub const WINDOW_RESIZABLE: &str = "WindowResizable";
    pub const FULL_SCREEN: &str = "FullScreen";
    pub const LOG_NAME: &str = "LogName";
    pub const LOG_LEVEL: &str = "LogLevel";
    pub const WINDOW_ICON: &str = "WindowIcon";
    pub const RESOURCE_PREFIX_PATH: &str = "ResourcePrefixPath";
    pub const RESOURCE_PATHS: &str = "ResourcePaths";
}

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Text(String),
    Level(LogLevel),
    Path(PathBuf),
    Paths(Vec<PathBuf>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Text(s) => write!(f, "{}", s),
            ParamValue::Level(level) => write!(f, "{:?}", level),
            ParamValue::Path(p) => write!(f, "{}", p.display()),
            ParamValue::Paths(paths) => {
                let joined: Vec<String> =
                    paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "{}", joined.join(";"))
            }
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<LogLevel> for ParamValue {
    fn from(value: LogLevel) -> Self {
        ParamValue::Level(value)
    }
}

impl From<PathBuf> for ParamValue {
    fn from(value: PathBuf) -> Self {
        ParamValue::Path(value)
    }
}

impl From<Vec<PathBuf>> for ParamValue {
    fn from(value: Vec<PathBuf>) -> Self {
        ParamValue::Paths(value)
    }
}

/// 引擎参数表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineParameters {
    values: BTreeMap<&'static str, ParamValue>,
}

impl EngineParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<ParamValue>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&&'static str, &ParamValue)> {
        self.values.iter()
    }

    pub fn bool_or(&self, key: &'static str, default: bool) -> EngineResult<bool> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Bool(b)) => Ok(*b),
            Some(_) => Err(EngineError::InvalidParameter {
                name: key,
                expected: "bool",
            }),
        }
    }

    pub fn text(&self, key: &'static str) -> EngineResult<Option<&str>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s)),
            Some(_) => Err(EngineError::InvalidParameter {
                name: key,
                expected: "text",
            }),
        }
    }

    pub fn path(&self, key: &'static str) -> EngineResult<Option<PathBuf>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Path(p)) => Ok(Some(p.clone())),
            Some(ParamValue::Text(s)) => Ok(Some(PathBuf::from(s))),
            Some(_) => Err(EngineError::InvalidParameter {
                name: key,
                expected: "path",
            }),
        }
    }

    pub fn paths(&self, key: &'static str) -> EngineResult<Vec<PathBuf>> {
        match self.values.get(key) {
            None => Ok(Vec::new()),
            Some(ParamValue::Paths(paths)) => Ok(paths.clone()),
            Some(ParamValue::Path(p)) => Ok(vec![p.clone()]),
            // 兼容以分号分隔的文本形式
            Some(ParamValue::Text(s)) => Ok(s
                .split(';')
                .filter(|part| !part.is_empty())
                .map(PathBuf::from)
                .collect()),
            Some(_) => Err(EngineError::InvalidParameter {
                name: key,
                expected: "path list",
            }),
        }
    }

    pub fn log_level(&self, key: &'static str) -> EngineResult<Option<LogLevel>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Level(level)) => Ok(Some(*level)),
            Some(_) => Err(EngineError::InvalidParameter {
                name: key,
                expected: "log level",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let mut params = EngineParameters::new();
        params.set(keys::WINDOW_TITLE, "EditorHost");
        params.set(keys::FULL_SCREEN, false);
        params.set(keys::LOG_LEVEL, LogLevel::Debug);

        assert_eq!(params.text(keys::WINDOW_TITLE).unwrap(), Some("EditorHost"));
        assert!(!params.bool_or(keys::FULL_SCREEN, true).unwrap());
        assert!(params.bool_or(keys::WINDOW_RESIZABLE, true).unwrap());
        assert_eq!(params.log_level(keys::LOG_LEVEL).unwrap(), Some(LogLevel::Debug));
        assert!(params.bool_or(keys::WINDOW_TITLE, false).is_err());
    }

    #[test]
    fn test_semicolon_paths() {
        let mut params = EngineParameters::new();
        params.set(keys::RESOURCE_PATHS, "CoreData;EditorData;;Script");
        let paths = params.paths(keys::RESOURCE_PATHS).unwrap();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[2], PathBuf::from("Script"));

        let display = ParamValue::Paths(paths).to_string();
        assert_eq!(display, "CoreData;EditorData;Script");
    }
}
