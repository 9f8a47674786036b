use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Settings shared by the rendering facade and template execution.
///
/// Every field has a default, so a partial TOML file (or none at all) works.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base directory prepended to relative template paths. `None` leaves
    /// paths untouched.
    pub views_root: Option<PathBuf>,

    /// Extension appended to template paths that have none. Empty disables
    /// the rewrite.
    pub default_ext: String,

    /// Upper bound on bytes captured across one view render.
    pub max_capture_bytes: usize,

    /// Upper bound on nested template includes.
    pub max_include_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            views_root: None,
            default_ext: "html".to_string(),
            max_capture_bytes: 64 * 1024 * 1024, // 64 MiB
            max_include_depth: 64,
        }
    }
}

impl RenderConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = toml::from_str::<RenderConfig>(content.as_str())?;
        Ok(config)
    }

    /// Applies `views_root` and `default_ext` to a template path.
    ///
    /// Absolute paths skip the root join; paths that already carry an
    /// extension keep it.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let mut resolved = match &self.views_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };

        if resolved.extension().is_none() && !self.default_ext.is_empty() {
            resolved.set_extension(&self.default_ext);
        }

        resolved
    }
}
