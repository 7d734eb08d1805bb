//! # Themeview - Themed Template Resolution and Rendering
//!
//! `themeview` turns a logical template name into a finished page: it finds the
//! right file across a set of theme directories, renders it in an isolated
//! scope, wraps the result in a layout and writes it to whatever response body
//! the host provides.
//!
//! ## Core Concepts
//!
//! - [`ThemeRegistry`]: Owns the configuration, resolves names to files and
//!   assembles pages
//! - [`ViewScope`]: Renders one template file against one data map, nothing else
//! - [`RenderCache`]: Output of reusable fragments, keyed by resolved path
//! - [`OutputSink`]: Where finished pages go (`String`, `Vec<u8>`, [`IoSink`])
//! - [`RegistryConfig`] / [`RegistryBuilder`]: Startup configuration
//!
//! ## Directory Layout
//!
//! ```text
//! themes/
//!   default/
//!     layouts/default.jinja    # required: the layout of last resort
//!     views/about.jinja
//!   example/
//!     layouts/main.jinja
//!     views/index.jinja
//! ```
//!
//! Templates are MiniJinja files. Views get shared data overlaid with the
//! render's own data; layouts additionally receive the rendered view as
//! `mainContent`. Templates can render other views with `import(...)` and
//! `import_returning(...)` (see [`view`]).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use themeview::ThemeRegistry;
//! use serde_json::json;
//!
//! let themes = ThemeRegistry::new("./themes", "example")?;
//! themes.set_layout("main").set_data("title", "Example");
//!
//! let body = themes.render(String::new(), "index", &json!({"foo": "bar"}))?;
//! ```
//!
//! ## Fallback
//!
//! A theme does not need to ship every template. Templates marked with
//! [`ThemeRegistry::share`] stand in for missing views when fallback is
//! enabled, and layouts always fall back to a shared layout of the same name
//! and finally to `default/layouts/default`.
//!
//! ```rust,ignore
//! themes.share("views/about", "default")?;
//! let about = themes.render_view("about", &(), ViewOptions::default())?;
//! ```

pub mod cache;
pub mod config;
pub mod data;
mod error;
pub mod paths;
pub mod registry;
pub mod sink;
pub mod view;

pub use cache::{CacheStats, RenderCache};
pub use config::{RegistryBuilder, RegistryConfig, SharedTemplate};
pub use data::{is_empty_value, to_data_map, DataMap};
pub use error::{Result, ThemeError};
pub use paths::{DEFAULT_EXTENSION, DEFAULT_LAYOUT, DEFAULT_THEME};
pub use registry::{ThemeRegistry, MAIN_CONTENT_KEY};
pub use sink::{IoSink, OutputSink};
pub use view::{Importer, ViewOptions, ViewScope, MAX_IMPORT_DEPTH};
