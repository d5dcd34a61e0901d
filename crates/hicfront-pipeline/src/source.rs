use glob::{MatchOptions, Pattern};
use hicfront_common::{BuildError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Files under a base directory selected by glob patterns.
///
/// Patterns are matched against paths relative to the base, with `*` never
/// crossing a directory separator, so `*.js` selects top-level files only and
/// `**/*.scss` selects at any depth.
#[derive(Debug, Clone)]
pub struct SourceSet {
    base: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    skip_underscored: bool,
}

fn compile(patterns: &[&str]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| BuildError::Pattern {
                pattern: p.to_string(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

impl SourceSet {
    pub fn new(base: impl Into<PathBuf>, include: &[&str]) -> Result<Self> {
        Ok(Self {
            base: base.into(),
            include: compile(include)?,
            exclude: Vec::new(),
            skip_underscored: false,
        })
    }

    /// Leave out paths matching any of these patterns
    pub fn exclude(mut self, patterns: &[&str]) -> Result<Self> {
        self.exclude.extend(compile(patterns)?);
        Ok(self)
    }

    /// Leave out files whose name starts with `_` (Sass partials)
    pub fn skip_underscored(mut self) -> Self {
        self.skip_underscored = true;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether a path relative to the base belongs to this set
    pub fn matches(&self, relative: &Path) -> bool {
        if self.skip_underscored
            && relative
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('_'))
        {
            return false;
        }

        self.include
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// Whether an absolute path belongs to this set
    pub fn contains(&self, path: &Path) -> bool {
        path.strip_prefix(&self.base)
            .map(|relative| self.matches(relative))
            .unwrap_or(false)
    }

    /// Matching files as paths relative to the base, sorted
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if !self.base.is_dir() {
            return Err(BuildError::SourceMissing(self.base.clone()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.base).sort_by_file_name() {
            let entry = entry.map_err(|e| walk_error(&self.base, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.base) else {
                continue;
            };
            if self.matches(relative) {
                files.push(relative.to_path_buf());
            }
        }

        Ok(files)
    }
}

fn walk_error(base: &Path, err: walkdir::Error) -> BuildError {
    let path = err.path().unwrap_or(base).to_path_buf();
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, message));
    BuildError::io(path, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let set = SourceSet::new("/src/js", &["*.js"])
            .unwrap()
            .exclude(&["*.min.js"])
            .unwrap();
        assert!(set.matches(Path::new("app.js")));
        assert!(!set.matches(Path::new("app.min.js")));
        assert!(!set.matches(Path::new("lib/util.js")));
    }

    #[test]
    fn test_globstar_and_excluded_dir() {
        let set = SourceSet::new("/src", &["**/*.html"])
            .unwrap()
            .exclude(&["partials/**"])
            .unwrap();
        assert!(set.matches(Path::new("index.html")));
        assert!(set.matches(Path::new("blog/post.html")));
        assert!(!set.matches(Path::new("partials/head.html")));
        assert!(!set.matches(Path::new("partials/nav/menu.html")));
        assert!(!set.matches(Path::new("style.css")));
    }

    #[test]
    fn test_underscored_partials() {
        let set = SourceSet::new("/src/scss", &["**/*.scss"])
            .unwrap()
            .skip_underscored();
        assert!(set.matches(Path::new("main.scss")));
        assert!(!set.matches(Path::new("base/_reset.scss")));
    }

    #[test]
    fn test_contains_absolute() {
        let set = SourceSet::new("/site/src/images", &["**/*"]).unwrap();
        assert!(set.contains(Path::new("/site/src/images/logo.png")));
        assert!(!set.contains(Path::new("/site/src/js/app.js")));
    }

    #[test]
    fn test_collect_sorted() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.js");
        touch(dir.path(), "a.js");
        touch(dir.path(), "nested/c.js");

        let set = SourceSet::new(dir.path(), &["**/*.js"]).unwrap();
        assert_eq!(
            set.collect().unwrap(),
            vec![
                PathBuf::from("a.js"),
                PathBuf::from("b.js"),
                PathBuf::from("nested/c.js")
            ]
        );
    }

    #[test]
    fn test_missing_base() {
        let dir = tempdir().unwrap();
        let set = SourceSet::new(dir.path().join("nope"), &["*"]).unwrap();
        assert!(matches!(set.collect(), Err(BuildError::SourceMissing(_))));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = SourceSet::new("/src", &["[abc"]).unwrap_err();
        assert!(matches!(err, BuildError::Pattern { .. }));
    }
}
