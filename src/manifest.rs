//! Generated sources derived from the shop configuration: the LESS import
//! manifest, the ordered script list and the compiler variable map.
use indexmap::IndexMap;
use std::path::Path;

use crate::error::ConfigError;

/// Prefix that makes configured paths relative to the root.
pub const SOURCE_PREFIX: &str = "../";

/// Partial of the stock responsive theme, dropped by `--excludeSWtheme`.
pub const RESPONSIVE_THEME: &str = "themes/Frontend/Responsive/frontend/_public/src/less/all.less";

/// Variables every build starts with, before shop overrides.
const BUILTIN_VARIABLES: [(&str, &str); 2] = [
    (
        "font-directory",
        "\"../../themes/Frontend/Responsive/frontend/_public/src/fonts\"",
    ),
    (
        "OpenSansPath",
        "\"../../themes/Frontend/Responsive/frontend/_public/vendors/fonts/open-sans-fontface\"",
    ),
];

/// Build the LESS entry file: one line per partial, in order.
///
/// Empty entries, and the responsive theme when `exclude_responsive_theme`
/// is set, become blank lines so the line count always matches `partials`.
#[must_use]
pub fn build_less_manifest(partials: &[String], exclude_responsive_theme: bool) -> String {
    let mut content = String::new();
    for partial in partials {
        let excluded = exclude_responsive_theme && partial == RESPONSIVE_THEME;
        if !excluded && !partial.is_empty() {
            content.push_str("@import \"");
            content.push_str(SOURCE_PREFIX);
            content.push_str(partial);
            content.push_str("\";");
        }
        content.push('\n');
    }
    content
}

/// Write the manifest, replacing any previous file.
///
/// # Errors
///
/// Returns [`ConfigError::ManifestWrite`] if the build directory cannot be
/// created or the file cannot be written.
pub fn write_less_manifest(path: &Path, content: &str) -> Result<(), ConfigError> {
    let to_error = |source| ConfigError::ManifestWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    std::fs::write(path, content).map_err(to_error)
}

/// Prefix each configured script with [`SOURCE_PREFIX`], keeping the order.
#[must_use]
pub fn build_js_file_list(scripts: &[String]) -> Vec<String> {
    scripts
        .iter()
        .map(|script| format!("{SOURCE_PREFIX}{script}"))
        .collect()
}

/// The fixed font path variables.
#[must_use]
pub fn builtin_variables() -> IndexMap<String, String> {
    BUILTIN_VARIABLES
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Overlay the shop's variables on `builtins`.
///
/// Built-ins come first; a shop key with the same name replaces the value
/// in place, new keys are appended in configuration order.
#[must_use]
pub fn merge_variables(
    builtins: IndexMap<String, String>,
    overrides: &IndexMap<String, serde_json::Value>,
) -> IndexMap<String, String> {
    let mut merged = builtins;
    for (key, value) in overrides {
        merged.insert(key.clone(), render_value(value));
    }
    merged
}

/// LESS source text for a configuration value.
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
