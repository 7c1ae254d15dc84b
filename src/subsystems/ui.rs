//! UI 子系统
//!
//! 宿主只做转发调用：语言包、皮肤、字体。缺失的资源只记录警告。

use super::resource_cache::ResourceCache;

/// 已注册字体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    pub file: String,
    pub name: String,
}

/// UI 子系统
#[derive(Debug, Default)]
pub struct Ui {
    resources: ResourceCache,
    language: Option<String>,
    skin: Option<(String, String)>,
    fonts: Vec<FontEntry>,
    default_font: Option<(String, u32)>,
}

impl Ui {
    pub fn new(resources: ResourceCache) -> Self {
        Self {
            resources,
            ..Default::default()
        }
    }

    fn check(&self, name: &str) {
        if !self.resources.exists(name) {
            tracing::warn!(target: "ui", "UI resource not found: {}", name);
        }
    }

    /// 使用语言包初始化
    pub fn initialize(&mut self, language_file: &str) {
        self.check(language_file);
        self.language = Some(language_file.to_string());
        tracing::debug!(target: "ui", "UI initialized with {}", language_file);
    }

    /// 加载基础皮肤与覆盖皮肤
    pub fn load_skin(&mut self, skin: &str, override_skin: &str) {
        self.check(skin);
        self.check(override_skin);
        self.skin = Some((skin.to_string(), override_skin.to_string()));
    }

    pub fn add_font(&mut self, file: &str, name: &str) {
        self.check(file);
        self.fonts.push(FontEntry {
            file: file.to_string(),
            name: name.to_string(),
        });
    }

    pub fn set_default_font(&mut self, name: &str, size: u32) {
        if !self.fonts.iter().any(|font| font.name == name) {
            tracing::warn!(target: "ui", "Default font {} was never added", name);
        }
        self.default_font = Some((name.to_string(), size));
    }

    pub fn is_initialized(&self) -> bool {
        self.language.is_some()
    }

    pub fn fonts(&self) -> &[FontEntry] {
        &self.fonts
    }

    pub fn default_font(&self) -> Option<(&str, u32)> {
        self.default_font
            .as_ref()
            .map(|(name, size)| (name.as_str(), *size))
    }
}
