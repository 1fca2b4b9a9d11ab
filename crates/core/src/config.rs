use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{Result, SmartSkipError},
    types::{CATEGORIES, DEFAULT_CATEGORY, category_info},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySetting {
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn visible_by_default() -> bool {
    true
}

impl Default for CategorySetting {
    fn default() -> Self {
        Self {
            visible: true,
            color: None,
        }
    }
}

/// User settings as persisted. Missing keys mean every category visible, the
/// default palette and auto-skip off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredConfig {
    pub auto_skip_enabled: bool,
    pub categories: BTreeMap<String, CategorySetting>,
}

impl StoredConfig {
    pub fn set_visible(&mut self, category: &str, visible: bool) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .visible = visible;
    }

    pub fn set_color(&mut self, category: &str, color: impl Into<String>) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .color = Some(color.into());
    }
}

/// What the core actually consumes from [`StoredConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    visible: Vec<String>,
    colors: HashMap<String, String>,
}

impl Default for CategoryView {
    fn default() -> Self {
        Self::derive(&StoredConfig::default())
    }
}

impl CategoryView {
    /// Walk the fixed category table: a category is visible unless the config
    /// explicitly hides it. Configured colors override the default palette.
    pub fn derive(config: &StoredConfig) -> Self {
        let visible = CATEGORIES
            .iter()
            .filter(|info| {
                config
                    .categories
                    .get(info.name)
                    .is_none_or(|setting| setting.visible)
            })
            .map(|info| info.name.to_string())
            .collect();

        let mut colors: HashMap<String, String> = CATEGORIES
            .iter()
            .map(|info| (info.name.to_string(), info.color.to_string()))
            .collect();
        for (name, setting) in &config.categories {
            if let Some(color) = &setting.color {
                colors.insert(name.clone(), color.clone());
            }
        }

        Self { visible, colors }
    }

    pub fn visible_categories(&self) -> &[String] {
        &self.visible
    }

    pub fn is_visible(&self, category: &str) -> bool {
        self.visible.iter().any(|c| c == category)
    }

    pub fn colors(&self) -> &HashMap<String, String> {
        &self.colors
    }

    /// Color for a category, falling back to the sponsor color for categories
    /// the table does not know.
    pub fn color_for(&self, category: &str) -> &str {
        self.colors
            .get(category)
            .or_else(|| self.colors.get(DEFAULT_CATEGORY))
            .map(String::as_str)
            .or_else(|| category_info(DEFAULT_CATEGORY).map(|info| info.color))
            .unwrap_or("#ffd700")
    }
}

/// Reads and writes [`StoredConfig`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/smartskip/config.json`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(get_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. A missing, unreadable or malformed file counts as no
    /// configuration at all.
    pub fn load(&self) -> StoredConfig {
        match self.try_load() {
            Ok(Some(config)) => config,
            Ok(None) => StoredConfig::default(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "config unreadable, using defaults");
                StoredConfig::default()
            }
        }
    }

    pub fn try_load(&self) -> Result<Option<StoredConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn save(&self, config: &StoredConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let pretty_json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, pretty_json).map_err(|err| SmartSkipError::ConfigWriteFailed {
            path: self.path.clone(),
            reason: err.to_string(),
        })
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or(SmartSkipError::NoConfigDir)?;
    Ok(dir.join("smartskip").join("config.json"))
}
