//! Template naming and on-disk layout.
//!
//! Every theme lives in its own directory under the registry's base path and
//! splits its templates into two subdirectories:
//!
//! ```text
//! <base>/
//!   default/
//!     layouts/default.jinja   <- required, last-resort layout for every theme
//!     views/...
//!   example/
//!     layouts/main.jinja
//!     views/index.jinja
//! ```
//!
//! Template names are relative, `/`-separated and may omit the extension:
//! `"index"`, `"partials/nav"` and `"partials/nav.jinja"` are all valid view
//! names. Names that could leave the base directory are rejected.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, ThemeError};

/// Extension appended to template names that do not already carry it.
pub const DEFAULT_EXTENSION: &str = "jinja";

/// The theme that must provide the last-resort layout.
pub const DEFAULT_THEME: &str = "default";

/// Layout id used until [`set_layout`](crate::ThemeRegistry::set_layout) is called.
pub const DEFAULT_LAYOUT: &str = "default";

/// Subdirectory holding a theme's views.
pub const VIEWS_DIR: &str = "views";

/// Subdirectory holding a theme's layouts.
pub const LAYOUTS_DIR: &str = "layouts";

/// Shared key registered automatically on every theme switch.
pub const DEFAULT_LAYOUT_KEY: &str = "layouts/default";

/// Strips any leading dots so `".html"` and `"html"` mean the same thing.
pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_string()
}

/// Appends `.<ext>` unless `name` already ends with it.
pub fn with_extension(name: &str, ext: &str) -> String {
    let suffix = format!(".{}", ext);
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Removes a trailing `.<ext>` so `"nav"` and `"nav.jinja"` share one key.
pub(crate) fn strip_extension<'a>(name: &'a str, ext: &str) -> &'a str {
    name.strip_suffix(ext)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
}

/// Checks that a template name or key stays inside the directory it is joined to.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ThemeError::InvalidInput(
            "template name must not be empty".into(),
        ));
    }

    let escapes = Path::new(name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes || name.contains('\\') {
        return Err(ThemeError::InvalidInput(format!(
            "template name \"{}\" must be a relative path without '.' or '..' segments",
            name
        )));
    }

    Ok(())
}

/// Builds the relative key `views/<name>`.
pub(crate) fn view_key(name: &str) -> String {
    format!("{}/{}", VIEWS_DIR, name)
}

/// Builds the relative key `layouts/<name>`.
pub(crate) fn layout_key(name: &str) -> String {
    format!("{}/{}", LAYOUTS_DIR, name)
}

/// Joins `<base>/<theme>/<relative>.<ext>`.
///
/// `relative` is a `/`-separated key such as `views/index`; it is split so the
/// resulting path uses the platform separator throughout.
pub(crate) fn template_path(base: &Path, theme: &str, relative: &str, ext: &str) -> PathBuf {
    let mut path = base.join(theme);
    for part in with_extension(relative, ext).split('/') {
        path.push(part);
    }
    path
}

/// Canonicalizes a base directory, failing if it does not exist.
pub(crate) fn canonical_base(path: &Path) -> Result<PathBuf> {
    let canonical = path.canonicalize().map_err(|e| {
        ThemeError::Configuration(format!(
            "template base path \"{}\" cannot be resolved: {}",
            path.display(),
            e
        ))
    })?;

    if !canonical.is_dir() {
        return Err(ThemeError::Configuration(format!(
            "template base path \"{}\" is not a directory",
            canonical.display()
        )));
    }

    Ok(canonical)
}
