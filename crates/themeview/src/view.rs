//! Isolated execution of a single template file.
//!
//! A [`ViewScope`] pairs one template file with one fully merged data map and
//! renders it in a brand new MiniJinja environment. Nothing survives from one
//! render to the next and nothing leaks in: the template sees its bound keys
//! plus the two import functions, and that is all.
//!
//! # Nested Rendering
//!
//! Templates pull in other views through the registry, never by path:
//!
//! ```jinja
//! {# emitted where the call appears #}
//! {{ import("partials/nav", {"active": "home"}) }}
//!
//! {# bound to a name and placed explicitly #}
//! {% set footer = import_returning("partials/footer", none, true, true) %}
//! <footer>{{ footer }}</footer>
//! ```
//!
//! Both take `(name, data?, fallback?, reuse?)` with the same defaults as
//! [`ViewOptions::default`]. The nested view gets its own scope built from the
//! shared data and the data passed to the call; the calling template's locals
//! are not visible to it.
//!
//! Output is never escaped, so the two functions render identically when used
//! in `{{ ... }}`. They differ in intent only: `import` marks its result as
//! safe markup to print in place, `import_returning` hands back a plain string
//! meant to be bound and placed later.
//!
//! Imports nest at most [`MAX_IMPORT_DEPTH`] levels deep on one thread. A view
//! that imports itself, directly or through a cycle, fails the render with a
//! [`ThemeError::Template`] once the limit is reached.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::trace;
use minijinja::{AutoEscape, Environment, ErrorKind, Value};

use crate::data::{to_data_map, DataMap};
use crate::error::{Result, ThemeError};

/// Name of the import function that emits its output in place.
pub const IMPORT_FN: &str = "import";

/// Name of the import function that returns its output for explicit placement.
pub const IMPORT_RETURNING_FN: &str = "import_returning";

/// Deepest chain of nested imports a single render may build.
pub const MAX_IMPORT_DEPTH: usize = 10;

thread_local! {
    static IMPORT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of import nesting for as long as it lives.
struct DepthGuard;

impl DepthGuard {
    fn enter(name: &str) -> Result<Self> {
        IMPORT_DEPTH.with(|depth| {
            if depth.get() >= MAX_IMPORT_DEPTH {
                return Err(ThemeError::InvalidInput(format!(
                    "import depth limit of {} exceeded at \"{}\"; the view probably imports itself",
                    MAX_IMPORT_DEPTH, name
                )));
            }
            depth.set(depth.get() + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        IMPORT_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// How a view is looked up and whether its output may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Fall back to a shared template when the active theme lacks the view.
    pub fallback: bool,
    /// Render once per resolved path and serve the stored output afterwards.
    pub reuse: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            fallback: true,
            reuse: false,
        }
    }
}

impl ViewOptions {
    /// Same as [`ViewOptions::default`]: fallback on, reuse off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that only accept the active theme's own file.
    pub fn strict() -> Self {
        Self {
            fallback: false,
            reuse: false,
        }
    }

    /// Sets whether shared templates may stand in for a missing view.
    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sets whether stored output is returned instead of rendering again.
    pub fn reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }
}

/// Renders a view by name on behalf of a template.
///
/// Implemented by [`ThemeRegistry`](crate::ThemeRegistry); the seam keeps this
/// module free of any knowledge about themes or fallback.
pub trait Importer: Send + Sync {
    /// Resolves `name` and renders it with `data` as the render-local scope.
    fn import_view(&self, name: &str, data: DataMap, options: ViewOptions) -> Result<String>;
}

/// One template file bound to one data scope.
#[derive(Debug, Clone)]
pub struct ViewScope {
    path: PathBuf,
    data: DataMap,
}

impl ViewScope {
    pub fn new(path: impl Into<PathBuf>, data: DataMap) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// The template file this scope renders.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &DataMap {
        &self.data
    }

    /// Renders the template and returns its output.
    pub fn render(&self, importer: Option<Arc<dyn Importer>>) -> Result<String> {
        let mut out = String::new();
        self.render_into(&mut out, importer)?;
        Ok(out)
    }

    /// Renders the template and appends its output to `out`.
    ///
    /// On error `out` is left as it was.
    pub fn render_into(&self, out: &mut String, importer: Option<Arc<dyn Importer>>) -> Result<()> {
        if !self.path.is_file() {
            return Err(ThemeError::not_found(
                self.path.display().to_string(),
                &self.path,
            ));
        }

        let source = fs::read_to_string(&self.path).map_err(|e| ThemeError::io(&self.path, e))?;
        let name = self.path.display().to_string();
        trace!("rendering {} with {} bound keys", name, self.data.len());

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        if let Some(importer) = importer {
            register_imports(&mut env, importer);
        }

        env.add_template_owned(name.clone(), source)?;
        let template = env.get_template(&name)?;
        let rendered = template.render(Value::from_serialize(&self.data))?;

        out.push_str(&rendered);
        Ok(())
    }
}

/// Registers `import` and `import_returning` on a fresh environment.
fn register_imports(env: &mut Environment<'static>, importer: Arc<dyn Importer>) {
    let inline = Arc::clone(&importer);
    env.add_function(
        IMPORT_FN,
        move |name: String,
              data: Option<Value>,
              fallback: Option<bool>,
              reuse: Option<bool>|
              -> std::result::Result<Value, minijinja::Error> {
            let output = call_importer(inline.as_ref(), &name, data, fallback, reuse)?;
            Ok(Value::from_safe_string(output))
        },
    );

    env.add_function(
        IMPORT_RETURNING_FN,
        move |name: String,
              data: Option<Value>,
              fallback: Option<bool>,
              reuse: Option<bool>|
              -> std::result::Result<Value, minijinja::Error> {
            let output = call_importer(importer.as_ref(), &name, data, fallback, reuse)?;
            Ok(Value::from(output))
        },
    );
}

fn call_importer(
    importer: &dyn Importer,
    name: &str,
    data: Option<Value>,
    fallback: Option<bool>,
    reuse: Option<bool>,
) -> std::result::Result<String, minijinja::Error> {
    let defaults = ViewOptions::default();
    let options = ViewOptions {
        fallback: fallback.unwrap_or(defaults.fallback),
        reuse: reuse.unwrap_or(defaults.reuse),
    };

    let local = match data {
        Some(value) => to_data_map(&value).map_err(|e| import_error(name, e))?,
        None => DataMap::new(),
    };

    let _depth = DepthGuard::enter(name).map_err(|e| import_error(name, e))?;
    importer
        .import_view(name, local, options)
        .map_err(|e| import_error(name, e))
}

fn import_error(name: &str, err: ThemeError) -> minijinja::Error {
    minijinja::Error::new(
        ErrorKind::InvalidOperation,
        format!("import of \"{}\" failed: {}", name, err),
    )
    .with_source(err)
}
