//! Shop configuration loading and the derived, read-only build description.
pub mod paths;
pub mod shop;

use indexmap::IndexMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::manifest;

pub use paths::BuildPaths;
pub use shop::ShopConfig;

/// Everything the tasks need, computed once at startup.
///
/// Shared behind an `Arc` by every task context; nothing mutates it after
/// [`BuildConfig::from_shop`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Shop whose configuration was loaded.
    pub shop_id: u32,
    /// The raw shop configuration.
    pub shop: ShopConfig,
    /// Resolved input and output locations.
    pub paths: BuildPaths,
    /// Compiler variables: built-ins overlaid with the shop's settings.
    pub variables: IndexMap<String, String>,
    /// Generated LESS entry file content.
    pub manifest: String,
    /// Scripts to bundle, relative to the root, in bundle order.
    pub js_files: Vec<String>,
    /// Whether the responsive theme was left out of the manifest.
    pub exclude_responsive_theme: bool,
}

impl BuildConfig {
    /// Derive the build description from an already loaded shop config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTarget`] if `lessTarget` cannot name the
    /// outputs.
    pub fn from_shop(
        root: &Path,
        shop_id: u32,
        shop: ShopConfig,
        exclude_responsive_theme: bool,
    ) -> Result<Self, ConfigError> {
        let paths = BuildPaths::derive(root, &shop.less_target)?;
        let manifest = manifest::build_less_manifest(&shop.less, exclude_responsive_theme);
        let js_files = manifest::build_js_file_list(&shop.js);
        let variables = manifest::merge_variables(manifest::builtin_variables(), &shop.config);
        Ok(Self {
            shop_id,
            shop,
            paths,
            variables,
            manifest,
            js_files,
            exclude_responsive_theme,
        })
    }

    /// Load `config_<shop_id>.json` below `root` and derive the build.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed, or if
    /// `lessTarget` is unusable.
    pub fn load(
        root: &Path,
        shop_id: u32,
        exclude_responsive_theme: bool,
    ) -> Result<Self, ConfigError> {
        let shop = ShopConfig::load(&shop::config_path(root, shop_id))?;
        Self::from_shop(root, shop_id, shop, exclude_responsive_theme)
    }

    /// Write the generated manifest to its place in the build directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ManifestWrite`] on I/O failure.
    pub fn write_manifest(&self) -> Result<(), ConfigError> {
        manifest::write_less_manifest(&self.paths.manifest, &self.manifest)
    }

    /// Absolute-ish locations of the configured scripts, in bundle order.
    #[must_use]
    pub fn js_sources(&self) -> Vec<std::path::PathBuf> {
        self.js_files
            .iter()
            .map(|file| self.paths.root.join(file))
            .collect()
    }
}
