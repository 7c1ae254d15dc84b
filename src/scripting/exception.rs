//! 脚本异常捕获
//!
//! 把 QuickJS 抛出的异常值整理成运行时错误记录。

use rquickjs::Ctx;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `Ctx::eval` 执行源码时 QuickJS 使用的文件名
const EVAL_FILE_NAME: &str = "eval_script";

/// 脚本运行时错误记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRuntimeError {
    pub filename: String,
    pub message: String,
    pub stack: Option<String>,
    pub line_number: u32,
}

impl fmt::Display for ScriptRuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - Line: {}", self.filename, self.message, self.line_number)
    }
}

/// 捕获到的异常
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CaughtException {
    pub name: Option<String>,
    pub message: String,
    pub stack: Option<String>,
    pub location: Option<(String, u32)>,
}

impl CaughtException {
    /// 转为运行时错误记录；无法定位时归到 `current_file`
    pub fn into_record(self, current_file: &str) -> ScriptRuntimeError {
        let (filename, line_number) = match self.location {
            Some((file, line)) if !is_anonymous(&file) => (file, line),
            Some((_, line)) => (current_file.to_string(), line),
            None => (current_file.to_string(), 0),
        };
        ScriptRuntimeError {
            filename,
            message: self.message,
            stack: self.stack,
            line_number,
        }
    }

    /// 编译错误的描述文本
    pub fn describe(&self, current_file: &str) -> String {
        let name = self.name.as_deref().unwrap_or("Error");
        match &self.location {
            Some((file, line)) if !is_anonymous(file) => {
                format!("{}: {} ({}:{})", name, self.message, file, line)
            }
            Some((_, line)) => format!("{}: {} ({}:{})", name, self.message, current_file, line),
            None => format!("{}: {} ({})", name, self.message, current_file),
        }
    }
}

fn is_anonymous(file: &str) -> bool {
    file == EVAL_FILE_NAME || file.starts_with('<') || file == "native"
}

/// 取出当前挂起的异常
pub(crate) fn catch_exception(ctx: &Ctx<'_>) -> CaughtException {
    let value = ctx.catch();

    if let Some(object) = value.as_object() {
        let name = object.get::<_, Option<String>>("name").ok().flatten();
        let message = object
            .get::<_, Option<String>>("message")
            .ok()
            .flatten()
            .unwrap_or_default();
        let stack = object
            .get::<_, Option<String>>("stack")
            .ok()
            .flatten()
            .filter(|s| !s.trim().is_empty());

        // QuickJS 对解析错误会设置 fileName/lineNumber；
        // `JSON.parse` 等给出 `<input>` 这类占位名时改从调用栈中找脚本位置
        let file = object.get::<_, Option<String>>("fileName").ok().flatten();
        let line = object.get::<_, Option<i32>>("lineNumber").ok().flatten();
        let location = match (file, line) {
            (Some(file), Some(line)) if !is_anonymous(&file) => Some((file, line.max(0) as u32)),
            (file, line) => stack
                .as_deref()
                .and_then(parse_location)
                .or_else(|| Some((file?, line?.max(0) as u32))),
        };

        return CaughtException {
            name,
            message,
            stack,
            location,
        };
    }

    // 抛出的是非对象值，例如 `throw "oops"`
    let message = value
        .as_string()
        .and_then(|s| s.to_string().ok())
        .unwrap_or_else(|| format!("{:?}", value));
    CaughtException {
        name: None,
        message,
        stack: None,
        location: None,
    }
}

/// 从调用栈文本中解析 `file:line[:col]` 位置
///
/// 优先取第一个真实脚本文件的帧，全是占位名时退回第一帧。
pub(crate) fn parse_location(stack: &str) -> Option<(String, u32)> {
    let mut frames = stack.lines().filter_map(|frame| {
        let frame = frame.trim();
        let frame = frame.strip_prefix("at ").unwrap_or(frame);
        let location = match (frame.rfind('('), frame.rfind(')')) {
            (Some(open), Some(close)) if open < close => &frame[open + 1..close],
            _ => frame,
        };
        split_location(location)
    });
    let first = frames.next()?;
    if !is_anonymous(&first.0) {
        return Some(first);
    }
    frames.find(|(file, _)| !is_anonymous(file)).or(Some(first))
}

fn split_location(location: &str) -> Option<(String, u32)> {
    let mut parts: Vec<&str> = location.split(':').collect();
    if parts.len() < 2 {
        return None;
    }
    let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    // 末尾可能带列号
    if parts.len() >= 3 && is_number(parts[parts.len() - 1]) && is_number(parts[parts.len() - 2]) {
        parts.pop();
    }
    let line = parts.pop().filter(|s| is_number(s))?.parse().ok()?;
    let file = parts.join(":");
    if file.is_empty() {
        return None;
    }
    Some((file, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let record = ScriptRuntimeError {
            filename: "foo.js".to_string(),
            message: "bad state".to_string(),
            stack: None,
            line_number: 42,
        };
        assert_eq!(record.to_string(), "foo.js - bad state - Line: 42");
    }

    #[test]
    fn test_parse_location_variants() {
        assert_eq!(
            parse_location("    at <eval> (eval_script:3)\n"),
            Some(("eval_script".to_string(), 3))
        );
        assert_eq!(
            parse_location("    at tick (EditorHost/main.js:12:7)"),
            Some(("EditorHost/main.js".to_string(), 12))
        );
        assert_eq!(
            parse_location("    at native\n    at C:/data/main.js:8"),
            Some(("C:/data/main.js".to_string(), 8))
        );
        assert_eq!(parse_location("no frames here"), None);
    }

    #[test]
    fn test_parse_location_skips_placeholder_frames() {
        let stack = "    at <input>:1\n    at parse (native)\n    at <eval> (EditorHost/main.js:2)\n";
        assert_eq!(
            parse_location(stack),
            Some(("EditorHost/main.js".to_string(), 2))
        );
    }

    #[test]
    fn test_anonymous_location_maps_to_current_file() {
        let caught = CaughtException {
            name: Some("TypeError".to_string()),
            message: "x is undefined".to_string(),
            stack: None,
            location: Some(("eval_script".to_string(), 9)),
        };
        let record = caught.into_record("EditorHost/main.js");
        assert_eq!(record.filename, "EditorHost/main.js");
        assert_eq!(record.line_number, 9);
    }

    #[test]
    fn test_describe_syntax_error() {
        let caught = CaughtException {
            name: Some("SyntaxError".to_string()),
            message: "unexpected token".to_string(),
            stack: None,
            location: None,
        };
        assert_eq!(
            caught.describe("main.js"),
            "SyntaxError: unexpected token (main.js)"
        );
    }
}
