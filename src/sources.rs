//! Gulp-style source globs: a list of patterns where a leading `!` marks an
//! exclusion, resolved against the root.
//!
//! Used both to collect the files handed to the linter and to decide which
//! watch rule a changed path belongs to.
use anyhow::{Context as _, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// LESS sources whose changes rebuild the development stylesheet.
pub const LESS_SOURCES: &[&str] = &[
    "../engine/Shopware/Plugins/**/*.less",
    "../themes/Frontend/**/*.less",
];

/// Theme scripts that are linted and whose changes rebuild the bundle.
pub const JS_SOURCES: &[&str] = &[
    "../themes/Frontend/**/frontend/_public/src/js/*.js",
    "!../themes/Frontend/**/frontend/_public/src/js/vendors/*.js",
];

/// A compiled set of include and exclude globs.
#[derive(Debug, Clone)]
pub struct SourceSet {
    patterns: Vec<String>,
    bases: Vec<PathBuf>,
    include: GlobSet,
    exclude: GlobSet,
}

impl SourceSet {
    /// Compile `patterns` relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn compile(root: &Path, patterns: &[&str]) -> Result<Self> {
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut bases = Vec::new();

        for pattern in patterns {
            let (negated, pattern) = pattern
                .strip_prefix('!')
                .map_or((false, *pattern), |rest| (true, rest));
            let (base, rest) = split_base(pattern);
            let base = normalize(&root.join(base));
            let absolute = if rest.is_empty() {
                to_glob_path(&base)
            } else {
                format!("{}/{rest}", to_glob_path(&base))
            };
            let glob = GlobBuilder::new(&absolute)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid source pattern: {pattern}"))?;
            if negated {
                exclude.add(glob);
            } else {
                include.add(glob);
                if !bases.contains(&base) {
                    bases.push(base);
                }
            }
        }

        Ok(Self {
            patterns: patterns.iter().map(ToString::to_string).collect(),
            bases,
            include: include.build().context("building include globs")?,
            exclude: exclude.build().context("building exclude globs")?,
        })
    }

    /// The patterns as configured, for display.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Directories that contain every possible match; these are watched.
    #[must_use]
    pub fn bases(&self) -> &[PathBuf] {
        &self.bases
    }

    /// Whether `path` is selected by an include and not by an exclude.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let candidate = to_glob_path(&normalize(path));
        self.include.is_match(&candidate) && !self.exclude.is_match(&candidate)
    }

    /// All existing files selected by this set, sorted.
    #[must_use]
    pub fn collect_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .bases
            .iter()
            .filter(|base| base.is_dir())
            .flat_map(|base| WalkDir::new(base).follow_links(true).into_iter())
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| self.matches(path))
            .collect();
        files.sort();
        files.dedup();
        files
    }
}

/// Split a pattern into its literal directory prefix and the glob remainder.
fn split_base(pattern: &str) -> (&str, &str) {
    let is_magic = |segment: &str| segment.contains(['*', '?', '[', '{']);
    let mut base_len = 0;
    for segment in pattern.split('/') {
        if is_magic(segment) {
            break;
        }
        base_len += segment.len() + 1;
    }
    if base_len > pattern.len() {
        // No glob characters: the whole pattern names one path.
        return (pattern, "");
    }
    let base = pattern.get(..base_len.saturating_sub(1)).unwrap_or("");
    let rest = pattern.get(base_len..).unwrap_or(pattern);
    (base, rest)
}

/// Lexically resolve `.` and `..` so globs and event paths compare equal.
///
/// Existing paths are canonicalized first so symlinked roots match the
/// paths reported by the watcher.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return canonical;
    }
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn to_glob_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn split_base_stops_at_first_glob_segment() {
        assert_eq!(
            split_base("../themes/Frontend/**/*.less"),
            ("../themes/Frontend", "**/*.less")
        );
        assert_eq!(split_base("src/*.js"), ("src", "*.js"));
        assert_eq!(split_base("*.js"), ("", "*.js"));
        assert_eq!(split_base("a/b/c.js"), ("a/b/c.js", ""));
    }

    #[test]
    fn normalize_resolves_parent_dirs_lexically() {
        let path = normalize(Path::new("/no-such-root/build/../themes/./x"));
        assert_eq!(path, Path::new("/no-such-root/themes/x"));
    }

    #[test]
    fn js_sources_exclude_vendors() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("build");
        std::fs::create_dir_all(&root).unwrap();
        let js = tmp
            .path()
            .join("themes/Frontend/Shop/frontend/_public/src/js");
        touch(&js.join("app.js"));
        touch(&js.join("vendors/jquery.js"));
        touch(&js.join("nested/deep.js"));

        let set = SourceSet::compile(&root, JS_SOURCES).unwrap();
        let files = set.collect_files();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["app.js"]);
        assert!(!set.matches(&js.join("vendors/jquery.js")));
    }

    #[test]
    fn less_sources_match_plugins_and_themes() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("build");
        std::fs::create_dir_all(&root).unwrap();
        let plugin = tmp
            .path()
            .join("engine/Shopware/Plugins/Local/Frontend/Foo/Views/x.less");
        let theme = tmp.path().join("themes/Frontend/Shop/src/less/all.less");
        touch(&plugin);
        touch(&theme);

        let set = SourceSet::compile(&root, LESS_SOURCES).unwrap();
        assert!(set.matches(&plugin));
        assert!(set.matches(&theme));
        assert!(!set.matches(&tmp.path().join("themes/Frontend/Shop/app.js")));
        assert_eq!(set.collect_files().len(), 2);
    }

    #[test]
    fn bases_are_watch_roots() {
        let set = SourceSet::compile(Path::new("/no-such-root/build"), JS_SOURCES).unwrap();
        assert_eq!(set.bases(), [PathBuf::from("/no-such-root/themes/Frontend")]);
        assert_eq!(set.patterns().len(), 2);
    }

    #[test]
    fn missing_bases_collect_nothing() {
        let set = SourceSet::compile(Path::new("/no-such-root/build"), LESS_SOURCES).unwrap();
        assert!(set.collect_files().is_empty());
    }

    #[test]
    fn invalid_pattern_is_error() {
        assert!(SourceSet::compile(Path::new("/r"), &["src/[.js"]).is_err());
    }
}
