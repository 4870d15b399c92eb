//! Top-level subcommand orchestration.
pub mod run;
mod scheduler;
pub mod tasks;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{BuildConfig, shop};
use crate::logging::{Log as _, Logger};

/// Environment variable naming the build root.
pub const ROOT_ENV: &str = "SHOP_BUILD_ROOT";

/// Resolve the build root: `--root`, then `$SHOP_BUILD_ROOT`, then the
/// current directory. The root is the directory one level below the shop.
///
/// # Errors
///
/// Returns an error if the current directory cannot be read.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(ref root) = global.root {
        return Ok(root.clone());
    }
    if let Ok(root) = std::env::var(ROOT_ENV)
        && !root.is_empty()
    {
        return Ok(PathBuf::from(root));
    }
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(dunce::simplified(&cwd).to_path_buf())
}

/// The loaded shop build, ready for task execution.
#[derive(Debug)]
pub struct CommandSetup {
    pub build: BuildConfig,
}

impl CommandSetup {
    /// Resolve the root and shop id, load the shop config and write the
    /// LESS manifest (only logged in dry-run mode).
    ///
    /// # Errors
    ///
    /// Returns an error if the shop id is invalid, the config file is missing
    /// or malformed, or the manifest cannot be written.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let root = resolve_root(global)?;
        let shop_id = shop::resolve_shop_id(global.shop_id)?;

        log.stage("Loading configuration");
        log.debug(&format!("root: {}", root.display()));
        let build = BuildConfig::load(&root, shop_id, global.exclude_sw_theme)?;
        log.info(&format!(
            "shop {shop_id}: {} partials, {} scripts, {} variables",
            build.shop.less.len(),
            build.js_files.len(),
            build.variables.len()
        ));
        if global.exclude_sw_theme {
            log.debug("responsive theme excluded from manifest");
        }

        let manifest = build.paths.manifest.display();
        if global.dry_run {
            log.dry_run(&format!("write {manifest}"));
        } else {
            build.write_manifest()?;
            log.info(&format!("wrote {manifest}"));
        }

        Ok(Self { build })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::{TEST_ENV_MUTEX, isolated_logger};

    fn write_shop(root: &std::path::Path, id: u32, body: &str) {
        let cache = root.join("../web/cache");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join(format!("config_{id}.json")), body).unwrap();
    }

    #[test]
    fn resolve_root_uses_explicit_root() {
        let global = GlobalOpts {
            root: Some(PathBuf::from("/explicit/path")),
            ..GlobalOpts::default()
        };
        assert_eq!(resolve_root(&global).unwrap(), PathBuf::from("/explicit/path"));
    }

    #[test]
    #[allow(unsafe_code)]
    fn resolve_root_falls_back_to_env() {
        let _lock = TEST_ENV_MUTEX.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = std::env::var(ROOT_ENV).ok();
        // SAFETY: serialised by TEST_ENV_MUTEX.
        unsafe { std::env::set_var(ROOT_ENV, "/from/env") };
        let resolved = resolve_root(&GlobalOpts::default());
        // SAFETY: serialised by TEST_ENV_MUTEX.
        unsafe {
            match previous {
                Some(v) => std::env::set_var(ROOT_ENV, v),
                None => std::env::remove_var(ROOT_ENV),
            }
        }
        assert_eq!(resolved.unwrap(), PathBuf::from("/from/env"));
    }

    #[test]
    fn init_writes_manifest() {
        let (log, _cache, _guard) = isolated_logger();
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("build");
        std::fs::create_dir_all(&root).unwrap();
        write_shop(
            &root,
            2,
            r#"{"less":["a.less"],"js":[],"config":{},"lessTarget":"web/cache/shop2.css"}"#,
        );
        let global = GlobalOpts {
            root: Some(root),
            shop_id: Some(2),
            ..GlobalOpts::default()
        };
        let setup = CommandSetup::init(&global, &log).unwrap();
        let written = std::fs::read_to_string(&setup.build.paths.manifest).unwrap();
        assert_eq!(written, "@import \"../a.less\";\n");
    }

    #[test]
    fn init_dry_run_leaves_manifest_unwritten() {
        let (log, _cache, _guard) = isolated_logger();
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("build");
        std::fs::create_dir_all(&root).unwrap();
        write_shop(
            &root,
            5,
            r#"{"less":["a.less"],"js":[],"config":{},"lessTarget":"web/cache/shop5.css"}"#,
        );
        let global = GlobalOpts {
            root: Some(root),
            shop_id: Some(5),
            dry_run: true,
            ..GlobalOpts::default()
        };
        let setup = CommandSetup::init(&global, &log).unwrap();
        assert!(!setup.build.paths.manifest.exists());
    }

    #[test]
    fn init_missing_config_fails() {
        let (log, _cache, _guard) = isolated_logger();
        let tmp = tempfile::tempdir().unwrap();
        let global = GlobalOpts {
            root: Some(tmp.path().join("build")),
            shop_id: Some(9),
            ..GlobalOpts::default()
        };
        let err = CommandSetup::init(&global, &log).unwrap_err();
        assert!(err.to_string().contains("config_9.json"), "{err}");
    }
}
