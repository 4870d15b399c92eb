// Shared helpers for integration tests.
//
// Provides a temporary shop checkout and an executor that records tool
// invocations instead of spawning them.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shop_build::cli::GlobalOpts;
use shop_build::exec::{ExecResult, Executor, display_name};

/// Theme directory used for the fixture's LESS and script sources.
pub const THEME: &str = "themes/Frontend/Demo/frontend/_public/src";

/// A shop checkout in a [`tempfile::TempDir`]:
///
/// ```text
/// <tmp>/build/                       build root (the tool's working dir)
/// <tmp>/web/cache/config_<id>.json   shop configuration
/// <tmp>/themes/Frontend/Demo/...     LESS partials and scripts
/// ```
pub struct ShopFixture {
    pub dir: tempfile::TempDir,
}

impl ShopFixture {
    /// Path of the build root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("build")
    }

    /// Path below the shop root.
    pub fn shop_path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Global options pointing at this fixture.
    pub fn global(&self, shop_id: u32) -> GlobalOpts {
        GlobalOpts {
            shop_id: Some(shop_id),
            root: Some(self.root()),
            ..GlobalOpts::default()
        }
    }
}

/// Fluent builder for [`ShopFixture`].
pub struct ShopFixtureBuilder {
    fixture: ShopFixture,
}

impl ShopFixtureBuilder {
    /// Begin with an empty build root and theme directories.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let theme = Path::new(THEME);
        for sub in [
            PathBuf::from("build"),
            PathBuf::from("web/cache"),
            theme.join("less"),
            theme.join("js/vendors"),
        ] {
            std::fs::create_dir_all(dir.path().join(sub)).expect("create fixture dir");
        }
        Self {
            fixture: ShopFixture { dir },
        }
    }

    /// Write `config_<id>.json` with the given JSON body.
    pub fn with_config(self, shop_id: u32, json: &str) -> Self {
        let path = self
            .fixture
            .dir
            .path()
            .join(format!("web/cache/config_{shop_id}.json"));
        std::fs::write(path, json).expect("write shop config");
        self
    }

    /// Write a file below the shop root, creating parent directories.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        let path = self.fixture.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write fixture file");
        self
    }

    pub fn build(self) -> ShopFixture {
        self.fixture
    }
}

/// A small but complete shop: two partials, two scripts, one variable.
pub fn demo_shop() -> ShopFixture {
    ShopFixtureBuilder::new()
        .with_config(
            1,
            &format!(
                r##"{{
                    "less": ["{THEME}/less/all.less", "{THEME}/less/extra.less"],
                    "js": ["{THEME}/js/app.js", "{THEME}/js/cart.js"],
                    "config": {{"brand-primary": "#d9400b", "font-size": 14}},
                    "lessTarget": "web/cache/demo.css"
                }}"##
            ),
        )
        .with_file(&format!("{THEME}/less/all.less"), "body { color: @brand-primary; }\n")
        .with_file(&format!("{THEME}/less/extra.less"), "p { margin: 0; }\n")
        .with_file(&format!("{THEME}/js/app.js"), "var app = {};")
        .with_file(&format!("{THEME}/js/cart.js"), "app.cart = [];")
        .with_file(&format!("{THEME}/js/vendors/jquery.js"), "/* vendor */")
        .build()
}

/// One recorded tool invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// [`Executor`] that pretends every tool exists and succeeds, unless told
/// to fail it.
#[derive(Debug, Default)]
pub struct FakeTools {
    failing: HashMap<String, String>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeTools {
    /// Make `tool` exit 1 with `output` on stdout.
    pub fn failing(mut self, tool: &str, output: &str) -> Self {
        self.failing.insert(tool.to_string(), output.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Short program names in call order.
    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

impl Executor for FakeTools {
    fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> anyhow::Result<ExecResult> {
        let result = self.run_unchecked_in(dir, program, args)?;
        Ok(result.check(&display_name(program))?)
    }

    fn run_unchecked_in(
        &self,
        dir: &Path,
        program: &str,
        args: &[String],
    ) -> anyhow::Result<ExecResult> {
        self.run_unchecked_with_env(dir, program, args, &[])
    }

    fn run_unchecked_with_env(
        &self,
        _dir: &Path,
        program: &str,
        args: &[String],
        env: &[(&str, &str)],
    ) -> anyhow::Result<ExecResult> {
        let name = display_name(program);
        self.calls.lock().expect("calls lock").push(Invocation {
            program: name.clone(),
            args: args.to_vec(),
            env: env
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
        Ok(match self.failing.get(&name) {
            Some(output) => ExecResult {
                stdout: output.clone(),
                stderr: String::new(),
                success: false,
                code: Some(1),
            },
            None => ExecResult {
                success: true,
                code: Some(0),
                ..ExecResult::default()
            },
        })
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/opt/node/bin").join(program))
    }
}
