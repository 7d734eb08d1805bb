#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use themeview::ThemeRegistry;

/// The checked-in fixture themes under `tests/themes`.
pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("themes")
}

/// A fresh registry over the checked-in fixtures.
pub fn registry(theme: &str) -> ThemeRegistry {
    ThemeRegistry::new(fixtures(), theme).unwrap()
}

/// A writable theme tree for tests that need a specific set of files.
pub struct ThemeDir {
    dir: TempDir,
}

impl ThemeDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// A tree that already holds `default/layouts/default.jinja`.
    pub fn with_default_layout() -> Self {
        let themes = Self::new();
        themes.write(
            "default/layouts/default.jinja",
            "<title>default</title>{{ mainContent }}",
        );
        themes
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, body: &str) -> &Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
        self
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.dir.path().join(relative)).unwrap();
    }

    pub fn registry(&self, theme: &str) -> ThemeRegistry {
        ThemeRegistry::new(self.path(), theme).unwrap()
    }
}
