//! Output locations derived from `lessTarget`.
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Every path the build reads or writes, resolved against the root.
///
/// For a target of `web/cache/1500_abc.css` and root `R`:
///
/// ```text
/// build_dir      R/../web/cache
/// manifest       R/../web/cache/1500_abc.less
/// css            R/../web/cache/1500_abc.css
/// js             R/../web/cache/1500_abc.js
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    /// Directory the tool runs in; all relative sources resolve against it.
    pub root: PathBuf,
    /// Directory receiving the manifest and every build output.
    pub build_dir: PathBuf,
    /// Generated LESS entry file.
    pub manifest: PathBuf,
    /// Compiled stylesheet.
    pub css: PathBuf,
    /// Bundled script.
    pub js: PathBuf,
    /// Directory part of `lessTarget`, used as the source map URL prefix.
    pub target_dir: String,
    /// Stem of `lessTarget`, shared by all outputs.
    pub name: String,
}

impl BuildPaths {
    /// Derive the output locations from `less_target`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTarget`] if the target has no file stem.
    pub fn derive(root: &Path, less_target: &str) -> Result<Self, ConfigError> {
        let target = Path::new(less_target);
        let name = target
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::InvalidTarget(less_target.to_string()))?;
        let target_dir = target
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        let build_dir = root.join("..").join(&target_dir);
        Ok(Self {
            root: root.to_path_buf(),
            manifest: build_dir.join(format!("{name}.less")),
            css: build_dir.join(format!("{name}.css")),
            js: build_dir.join(format!("{name}.js")),
            build_dir,
            target_dir,
            name,
        })
    }

    /// Source map written next to the development stylesheet.
    #[must_use]
    pub fn css_map(&self) -> PathBuf {
        self.build_dir.join(format!("{}.css.map", self.name))
    }

    /// URL embedded in the stylesheet's `sourceMappingURL` comment.
    #[must_use]
    pub fn source_map_url(&self) -> String {
        if self.target_dir.is_empty() {
            format!("{}.css.map", self.name)
        } else {
            format!("{}/{}.css.map", self.target_dir, self.name)
        }
    }
}
