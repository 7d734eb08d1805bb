//! The theme registry: configuration, path resolution, fallback and page assembly.
//!
//! A [`ThemeRegistry`] owns everything that outlives a single render: the base
//! directory, the active theme and layout, the shared data every template sees,
//! the table of shared templates and the render cache. It is a cheap handle
//! (clones point at the same state) and is `Send + Sync`.
//!
//! # Resolution Order
//!
//! Views (`views/<name>`):
//!
//! 1. A path registered with [`override_path`](ThemeRegistry::override_path)
//! 2. `<base>/<theme>/views/<name>.<ext>`
//! 3. The shared entry for `views/<name>` (only when fallback is enabled)
//!
//! Layouts (`layouts/<layout>`):
//!
//! 1. A path registered with [`override_path`](ThemeRegistry::override_path)
//! 2. `<base>/<theme>/layouts/<layout>.<ext>`
//! 3. The shared entry for `layouts/<layout>`
//! 4. The shared entry for `layouts/default`, which every theme switch points
//!    at `<base>/default/layouts/default.<ext>`
//!
//! Running out of view candidates is a [`NotFound`](ThemeError::NotFound);
//! running out of layout candidates means the installation is broken and is a
//! [`Configuration`](ThemeError::Configuration) error.
//!
//! # Concurrency
//!
//! Each call observes one consistent configuration, and no lock is held while
//! a template executes, so templates may import other views freely. Sequences
//! are not atomic: a `set_theme` from one thread changes what another thread
//! resolves on its next lookup. Hosts that need per-request themes should
//! build one registry per request instead of sharing one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, RenderCache};
use crate::config::RegistryBuilder;
use crate::data::{is_empty_value, merge_scope, to_data_map, DataMap};
use crate::error::{Result, ThemeError};
use crate::paths::{
    self, layout_key, strip_extension, template_path, validate_name, view_key, DEFAULT_LAYOUT,
    DEFAULT_LAYOUT_KEY, DEFAULT_THEME,
};
use crate::sink::OutputSink;
use crate::view::{Importer, ViewOptions, ViewScope};

/// Key under which a layout receives the rendered view.
pub const MAIN_CONTENT_KEY: &str = "mainContent";

static GLOBAL: OnceCell<ThemeRegistry> = OnceCell::new();

/// Themed template resolution and rendering.
///
/// # Example
///
/// ```rust,ignore
/// use themeview::{ThemeRegistry, ViewOptions};
/// use serde_json::json;
///
/// let themes = ThemeRegistry::new("./themes", "example")?;
/// themes.set_layout("main").set_data("title", "Example");
///
/// let mut body = String::new();
/// themes.render(&mut body, "index", &json!({"foo": "bar"}))?;
///
/// // Fragments can be rendered on their own, optionally once per process.
/// let nav = themes.render_view("partials/nav", &(), ViewOptions::new().reuse(true))?;
/// ```
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    base_path: PathBuf,
    extension: String,
    state: RwLock<ThemeState>,
    cache: Mutex<RenderCache>,
}

#[derive(Debug)]
struct ThemeState {
    theme: String,
    theme_path: PathBuf,
    layout: String,
    data: DataMap,
    shared_paths: BTreeMap<String, PathBuf>,
    custom_paths: BTreeMap<String, PathBuf>,
}

impl ThemeRegistry {
    /// Creates a registry rooted at `base_path` with `theme` active.
    ///
    /// # Errors
    ///
    /// [`ThemeError::Configuration`] if `base_path` does not exist or the
    /// default theme has no `layouts/default` template.
    pub fn new(base_path: impl AsRef<Path>, theme: &str) -> Result<Self> {
        Self::builder(base_path).theme(theme).build()
    }

    /// Starts a [`RegistryBuilder`] for a registry rooted at `base_path`.
    pub fn builder(base_path: impl AsRef<Path>) -> RegistryBuilder {
        RegistryBuilder::new(base_path)
    }

    /// Returns the process-wide registry, creating it on first use.
    ///
    /// Only the first successful call configures the instance; the arguments
    /// of every later call are ignored. Prefer passing an explicitly created
    /// registry around; this exists for hosts that have nowhere to keep one.
    pub fn global_or_init(base_path: impl AsRef<Path>, theme: &str) -> Result<&'static Self> {
        GLOBAL.get_or_try_init(|| Self::new(base_path, theme))
    }

    /// Returns the process-wide registry if it has been created.
    pub fn global() -> Option<&'static Self> {
        GLOBAL.get()
    }

    /// Canonicalizes the base path and sets up empty state. No theme is
    /// active until [`set_theme`](Self::set_theme) succeeds.
    pub(crate) fn empty(base_path: &Path, extension: &str) -> Result<Self> {
        let base_path = paths::canonical_base(base_path)?;
        let extension = paths::normalize_extension(extension);
        if extension.is_empty() {
            return Err(ThemeError::Configuration(
                "template extension must not be empty".into(),
            ));
        }

        let state = ThemeState {
            theme: String::new(),
            theme_path: base_path.clone(),
            layout: DEFAULT_LAYOUT.to_string(),
            data: DataMap::new(),
            shared_paths: BTreeMap::new(),
            custom_paths: BTreeMap::new(),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                base_path,
                extension,
                state: RwLock::new(state),
                cache: Mutex::new(RenderCache::new()),
            }),
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ThemeState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ThemeState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, RenderCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn importer(&self) -> Arc<dyn Importer> {
        Arc::new(self.clone())
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// The canonical root directory holding all themes.
    pub fn base_path(&self) -> &Path {
        &self.inner.base_path
    }

    /// The extension appended to template names, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.inner.extension
    }

    /// Name of the active theme.
    pub fn theme(&self) -> String {
        self.read_state().theme.clone()
    }

    /// `<base>/<theme>` for the active theme.
    pub fn theme_path(&self) -> PathBuf {
        self.read_state().theme_path.clone()
    }

    /// Layout id used by the next [`render`](Self::render).
    pub fn layout(&self) -> String {
        self.read_state().layout.clone()
    }

    /// Switches the active theme.
    ///
    /// Also (re-)registers `layouts/default` as a shared template pointing at
    /// the default theme's default layout, so every theme has a last-resort
    /// layout. Renders already completed are unaffected.
    ///
    /// # Errors
    ///
    /// [`ThemeError::Configuration`] if the default theme's default layout is
    /// missing; the previous theme stays active.
    pub fn set_theme(&self, theme: &str) -> Result<&Self> {
        validate_name(theme)?;

        let default_layout = template_path(
            self.base_path(),
            DEFAULT_THEME,
            DEFAULT_LAYOUT_KEY,
            self.extension(),
        );
        if !default_layout.is_file() {
            return Err(ThemeError::Configuration(format!(
                "default layout \"{}\" is missing; every theme falls back to it",
                default_layout.display()
            )));
        }

        let theme_path = self.base_path().join(theme);
        if !theme_path.is_dir() {
            debug!(
                "theme directory {} does not exist; lookups will rely on shared templates",
                theme_path.display()
            );
        }

        let mut state = self.write_state();
        state.theme = theme.to_string();
        state.theme_path = theme_path;
        state
            .shared_paths
            .insert(DEFAULT_LAYOUT_KEY.to_string(), default_layout);
        debug!("active theme is now \"{}\"", theme);

        Ok(self)
    }

    /// Sets the layout used by subsequent [`render`](Self::render) calls.
    ///
    /// The layout is not looked up until a page is rendered.
    pub fn set_layout(&self, layout: &str) -> &Self {
        self.write_state().layout = layout.to_string();
        self
    }

    /// Marks a template from `theme` as the fallback for `key`.
    ///
    /// `key` names the template relative to a theme root and must include its
    /// directory, e.g. `views/about` or `layouts/main`. Any theme lacking its
    /// own copy will then render this one.
    ///
    /// # Errors
    ///
    /// [`ThemeError::NotFound`] if the template does not exist in `theme`.
    pub fn share(&self, key: &str, theme: &str) -> Result<&Self> {
        validate_name(key)?;
        validate_name(theme)?;

        let key = strip_extension(key, self.extension());
        let path = template_path(self.base_path(), theme, key, self.extension());
        if !path.is_file() {
            return Err(ThemeError::not_found(key, path));
        }

        debug!("sharing {} from theme \"{}\"", key, theme);
        self.write_state().shared_paths.insert(key.to_string(), path);
        Ok(self)
    }

    /// Removes a shared template, returning the path it pointed at.
    ///
    /// Removing `layouts/default` lasts only until the next theme switch.
    pub fn unshare(&self, key: &str) -> Option<PathBuf> {
        let key = strip_extension(key, self.extension());
        self.write_state().shared_paths.remove(key)
    }

    /// Snapshot of the shared-template table.
    pub fn shared_paths(&self) -> BTreeMap<String, PathBuf> {
        self.read_state().shared_paths.clone()
    }

    /// Pins `key` (e.g. `views/index`) to an explicit file for every theme.
    ///
    /// Overrides are consulted before the active theme's own directory.
    ///
    /// # Errors
    ///
    /// [`ThemeError::NotFound`] if `path` is not an existing file.
    pub fn override_path(&self, key: &str, path: impl AsRef<Path>) -> Result<&Self> {
        validate_name(key)?;

        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .ok()
            .filter(|p| p.is_file())
            .ok_or_else(|| ThemeError::not_found(key, path))?;

        let key = strip_extension(key, self.extension());
        debug!("overriding {} with {}", key, canonical.display());
        self.write_state()
            .custom_paths
            .insert(key.to_string(), canonical);
        Ok(self)
    }

    // =========================================================================
    // Shared data
    // =========================================================================

    /// Sets a value every template sees unless the render supplies its own.
    pub fn set_data(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.write_state().data.insert(key.into(), value.into());
        self
    }

    /// Returns a shared value if the key is set, whatever the value is.
    pub fn get_data(&self, key: &str) -> Option<Value> {
        self.read_state().data.get(key).cloned()
    }

    /// Returns a shared value, or `default` when the key is unset or its value
    /// is empty (see [`is_empty_value`]).
    pub fn get_data_or(&self, key: &str, default: impl Into<Value>) -> Value {
        match self.read_state().data.get(key) {
            Some(value) if !is_empty_value(value) => value.clone(),
            _ => default.into(),
        }
    }

    /// Snapshot of all shared data.
    pub fn shared_data(&self) -> DataMap {
        self.read_state().data.clone()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolves a view name to a template file.
    ///
    /// With `fallback` disabled only an override or the active theme's own
    /// file is accepted.
    ///
    /// # Errors
    ///
    /// [`ThemeError::NotFound`] when no candidate exists,
    /// [`ThemeError::InvalidInput`] for names that would leave the base path.
    pub fn resolve_view_path(&self, name: &str, fallback: bool) -> Result<PathBuf> {
        validate_name(name)?;
        let key = view_key(strip_extension(name, self.extension()));
        let state = self.read_state();

        if let Some(custom) = state.custom_paths.get(&key) {
            return Ok(custom.clone());
        }

        let primary = template_path(self.base_path(), &state.theme, &key, self.extension());
        if primary.is_file() {
            return Ok(primary);
        }

        if !fallback {
            return Err(ThemeError::not_found(name, primary));
        }

        match state.shared_paths.get(&key) {
            Some(shared) => {
                debug!(
                    "{} missing from theme \"{}\", using shared {}",
                    key,
                    state.theme,
                    shared.display()
                );
                Ok(shared.clone())
            }
            None => Err(ThemeError::not_found(name, primary)),
        }
    }

    /// Resolves the active layout to a template file, walking the fallbacks.
    ///
    /// # Errors
    ///
    /// [`ThemeError::Configuration`] when even the default layout is gone.
    pub fn resolve_layout_path(&self) -> Result<PathBuf> {
        let state = self.read_state();
        validate_name(&state.layout)?;
        let key = layout_key(strip_extension(&state.layout, self.extension()));

        if let Some(custom) = state.custom_paths.get(&key) {
            return Ok(custom.clone());
        }

        let primary = template_path(self.base_path(), &state.theme, &key, self.extension());
        if primary.is_file() {
            return Ok(primary);
        }

        if let Some(shared) = state.shared_paths.get(&key) {
            debug!("layout {} falls back to shared {}", key, shared.display());
            return Ok(shared.clone());
        }

        if let Some(default) = state.shared_paths.get(DEFAULT_LAYOUT_KEY) {
            debug!("layout {} falls back to default {}", key, default.display());
            return Ok(default.clone());
        }

        Err(ThemeError::Configuration(format!(
            "no layout found for \"{}\" in theme \"{}\" and no shared default layout",
            state.layout, state.theme
        )))
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Renders a single view with shared data overlaid by `data`.
    ///
    /// With [`ViewOptions::reuse`] the output is stored under the resolved path
    /// on first render and returned as-is afterwards; `data` is then ignored,
    /// so only use reuse for fragments that never vary.
    ///
    /// # Errors
    ///
    /// [`ThemeError::InvalidInput`] if `data` does not serialize to a map, plus
    /// anything [`resolve_view_path`](Self::resolve_view_path) or the template
    /// itself reports.
    pub fn render_view<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
        options: ViewOptions,
    ) -> Result<String> {
        self.render_view_with(name, options, || to_data_map(data))
    }

    fn render_view_with<F>(&self, name: &str, options: ViewOptions, local: F) -> Result<String>
    where
        F: FnOnce() -> Result<DataMap>,
    {
        let path = self.resolve_view_path(name, options.fallback)?;

        if options.reuse {
            if let Some(output) = self.lock_cache().lookup(&path) {
                debug!("reusing rendered {}", path.display());
                return Ok(output);
            }
        }

        let local = local()?;
        let scope = merge_scope(&self.read_state().data, local);
        let output = ViewScope::new(&path, scope).render(Some(self.importer()))?;

        if options.reuse {
            self.lock_cache().store(path, output.clone());
        }
        Ok(output)
    }

    /// Renders the active layout around already rendered view content.
    ///
    /// The content is available to the layout as `mainContent`.
    pub fn render_layout(&self, content: &str) -> Result<String> {
        let path = self.resolve_layout_path()?;

        let mut local = DataMap::new();
        local.insert(MAIN_CONTENT_KEY.to_string(), Value::from(content));
        let scope = merge_scope(&self.read_state().data, local);

        ViewScope::new(path, scope).render(Some(self.importer()))
    }

    /// Renders a full page into `sink` and hands the sink back.
    ///
    /// The view must exist in the active theme (no shared fallback) and is
    /// always rendered fresh. Use [`render_with_options`](Self::render_with_options)
    /// to change either.
    pub fn render<S, T>(&self, sink: S, name: &str, data: &T) -> Result<S>
    where
        S: OutputSink,
        T: Serialize + ?Sized,
    {
        self.render_with_options(sink, name, data, ViewOptions::strict())
    }

    /// Renders a view, wraps it in the active layout and writes it to `sink`.
    ///
    /// Nothing is written unless both renders succeed.
    pub fn render_with_options<S, T>(
        &self,
        mut sink: S,
        name: &str,
        data: &T,
        options: ViewOptions,
    ) -> Result<S>
    where
        S: OutputSink,
        T: Serialize + ?Sized,
    {
        let content = self.render_view(name, data, options)?;
        let page = self.render_layout(&content)?;
        sink.write_body(&page).map_err(ThemeError::Output)?;
        Ok(sink)
    }

    // =========================================================================
    // Cache maintenance
    // =========================================================================

    /// Number of stored fragments.
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Entry count plus hit and miss counters since creation.
    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    /// Drops the stored output for one resolved template path.
    pub fn forget(&self, path: &Path) -> bool {
        self.lock_cache().remove(path).is_some()
    }

    /// Drops every stored fragment.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }
}

impl Importer for ThemeRegistry {
    fn import_view(&self, name: &str, data: DataMap, options: ViewOptions) -> Result<String> {
        self.render_view_with(name, options, || Ok(data))
    }
}
