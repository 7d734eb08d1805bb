//! Registry construction: a programmatic builder and a YAML config file.
//!
//! Both routes end in the same place. [`RegistryConfig`] is the serializable
//! form a host loads at startup; [`RegistryBuilder`] is what it turns into.
//!
//! ```yaml
//! base_path: ./themes
//! theme: example
//! layout: main
//! shared:
//!   - key: views/about
//!     theme: default
//! overrides:
//!   views/index: ./custom/index.jinja
//! data:
//!   title: Example site
//! ```
//!
//! Relative paths in a file loaded with [`RegistryConfig::from_file`] are
//! resolved against the directory containing that file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::data::DataMap;
use crate::error::{Result, ThemeError};
use crate::paths::{DEFAULT_EXTENSION, DEFAULT_THEME};
use crate::registry::ThemeRegistry;

/// Step-by-step construction of a [`ThemeRegistry`].
///
/// Settings are applied in a fixed order when [`build`](Self::build) runs:
/// base path and extension, theme, layout, shares, overrides, then data.
///
/// ```rust,ignore
/// let themes = ThemeRegistry::builder("./themes")
///     .theme("example")
///     .layout("main")
///     .share("views/about", "default")
///     .data("title", "Example site")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    base_path: PathBuf,
    theme: String,
    layout: Option<String>,
    extension: String,
    shared: Vec<(String, String)>,
    overrides: Vec<(String, PathBuf)>,
    data: DataMap,
}

impl RegistryBuilder {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            theme: DEFAULT_THEME.to_string(),
            layout: None,
            extension: DEFAULT_EXTENSION.to_string(),
            shared: Vec::new(),
            overrides: Vec::new(),
            data: DataMap::new(),
        }
    }

    /// Initial theme. Defaults to `default`.
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Initial layout. Defaults to `default`.
    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Template file extension, with or without the leading dot.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Queues a [`share`](ThemeRegistry::share).
    pub fn share(mut self, key: impl Into<String>, theme: impl Into<String>) -> Self {
        self.shared.push((key.into(), theme.into()));
        self
    }

    /// Queues an [`override_path`](ThemeRegistry::override_path).
    pub fn override_path(mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.push((key.into(), path.into()));
        self
    }

    /// Queues a [`set_data`](ThemeRegistry::set_data).
    pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Creates the registry, failing on the first invalid setting.
    pub fn build(self) -> Result<ThemeRegistry> {
        let registry = ThemeRegistry::empty(&self.base_path, &self.extension)?;
        registry.set_theme(&self.theme)?;

        if let Some(layout) = &self.layout {
            registry.set_layout(layout);
        }
        for (key, theme) in &self.shared {
            registry.share(key, theme)?;
        }
        for (key, path) in &self.overrides {
            registry.override_path(key, path)?;
        }
        for (key, value) in self.data {
            registry.set_data(key, value);
        }

        Ok(registry)
    }
}

/// One entry of the `shared` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedTemplate {
    /// Relative key including `views/` or `layouts/`.
    pub key: String,
    /// Theme providing the template.
    pub theme: String,
}

/// Serializable registry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    pub base_path: PathBuf,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub shared: Vec<SharedTemplate>,
    #[serde(default)]
    pub overrides: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub data: DataMap,
}

impl RegistryConfig {
    /// Parses a config from YAML. Paths are kept as written.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a config file, anchoring relative paths at its directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ThemeError::io(path, e))?;
        let mut config = Self::from_yaml(&content)?;

        let root = path.parent().unwrap_or_else(|| Path::new("."));
        config.base_path = anchor(root, &config.base_path);
        for target in config.overrides.values_mut() {
            *target = anchor(root, target);
        }

        Ok(config)
    }

    /// Converts the settings into a builder for further adjustment.
    pub fn builder(&self) -> RegistryBuilder {
        let mut builder = RegistryBuilder::new(&self.base_path);
        if let Some(theme) = &self.theme {
            builder = builder.theme(theme);
        }
        if let Some(layout) = &self.layout {
            builder = builder.layout(layout);
        }
        if let Some(extension) = &self.extension {
            builder = builder.extension(extension);
        }
        for shared in &self.shared {
            builder = builder.share(&shared.key, &shared.theme);
        }
        for (key, path) in &self.overrides {
            builder = builder.override_path(key, path);
        }
        for (key, value) in &self.data {
            builder = builder.data(key, value.clone());
        }
        builder
    }

    pub fn build(&self) -> Result<ThemeRegistry> {
        self.builder().build()
    }
}

fn anchor(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
