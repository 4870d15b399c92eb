//! Per-shop JSON configuration (`config_<id>.json`).
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable consulted when `--shopId` is not given.
pub const SHOP_ID_ENV: &str = "SHOP_ID";

/// Shop id used when neither the flag nor the environment provide one.
pub const DEFAULT_SHOP_ID: u32 = 1;

/// Directory holding the per-shop configuration, relative to the root.
const CONFIG_DIR: &str = "../web/cache";

/// Shop-specific build configuration as exported by the shop backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShopConfig {
    /// LESS partials to import, in order.
    pub less: Vec<String>,
    /// JavaScript files to bundle, in order.
    pub js: Vec<String>,
    /// Theme variables passed to the LESS compiler.
    pub config: IndexMap<String, serde_json::Value>,
    /// Output CSS path; its directory and stem name every build artifact.
    #[serde(rename = "lessTarget")]
    pub less_target: String,
}

impl ShopConfig {
    /// Parse a configuration from JSON text. `origin` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid configuration.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file is missing,
    /// [`ConfigError::Io`] if it cannot be read and [`ConfigError::Parse`]
    /// if it is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }
}

/// Location of the configuration file for `shop_id` below `root`.
#[must_use]
pub fn config_path(root: &Path, shop_id: u32) -> PathBuf {
    root.join(CONFIG_DIR).join(format!("config_{shop_id}.json"))
}

/// Pick the shop id: explicit flag, then `$SHOP_ID`, then [`DEFAULT_SHOP_ID`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidShopId`] if `$SHOP_ID` is set but not a number.
pub fn resolve_shop_id(flag: Option<u32>) -> Result<u32, ConfigError> {
    resolve_shop_id_from(flag, std::env::var(SHOP_ID_ENV).ok().as_deref())
}

fn resolve_shop_id_from(flag: Option<u32>, env: Option<&str>) -> Result<u32, ConfigError> {
    if let Some(id) = flag {
        return Ok(id);
    }
    match env.map(str::trim) {
        None | Some("") => Ok(DEFAULT_SHOP_ID),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidShopId(value.to_string())),
    }
}
