use crate::{FileUnit, Transform, TransformError};
use std::path::PathBuf;

/// Compile SCSS to expanded CSS with grass
#[derive(Debug, Clone)]
pub struct SassCompile {
    /// Extra import search paths, tried after the file's own directory
    load_paths: Vec<PathBuf>,
}

impl SassCompile {
    pub fn new(load_paths: Vec<PathBuf>) -> Self {
        Self { load_paths }
    }
}

impl Transform for SassCompile {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn apply(&self, unit: FileUnit) -> Result<FileUnit, TransformError> {
        tracing::debug!("Compiling Sass: {:?}", unit.origin);

        let source = unit.text()?.to_owned();
        let own_dir = unit.origin_dir().to_path_buf();
        let mut options = grass::Options::default()
            .style(grass::OutputStyle::Expanded)
            .load_path(&own_dir);
        for path in &self.load_paths {
            options = options.load_path(path);
        }

        let css = grass::from_string(source, &options).map_err(|e| TransformError::Sass {
            path: unit.origin.clone(),
            message: e.to_string(),
        })?;

        Ok(unit.with_text(css).with_extension("css"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_compile_nested_rules() {
        let unit = FileUnit::new(
            "/p/src/scss/main.scss",
            "main.scss",
            b"$accent: #c00;\n.nav { a { color: $accent; } }\n".to_vec(),
        );
        let out = SassCompile::new(Vec::new()).apply(unit).unwrap();

        assert_eq!(out.relative, PathBuf::from("main.css"));
        let css = out.text().unwrap();
        assert!(css.contains(".nav a {"));
        assert!(css.contains("color: #c00;"));
    }

    #[test]
    fn test_imports_resolve_from_file_dir_and_load_paths() {
        let dir = tempdir().unwrap();
        let scss = dir.path().join("src/scss");
        let modules = dir.path().join("node_modules/theme");
        std::fs::create_dir_all(&scss).unwrap();
        std::fs::create_dir_all(&modules).unwrap();
        std::fs::write(scss.join("_vars.scss"), "$gap: 4px;\n").unwrap();
        std::fs::write(modules.join("_base.scss"), ".base { margin: 0; }\n").unwrap();

        let unit = FileUnit::new(
            scss.join("main.scss"),
            "main.scss",
            b"@import 'vars';\n@import 'theme/base';\n.x { padding: $gap; }\n".to_vec(),
        );
        let out = SassCompile::new(vec![dir.path().join("node_modules")])
            .apply(unit)
            .unwrap();
        let css = out.text().unwrap();
        assert!(css.contains(".base"));
        assert!(css.contains("padding: 4px;"));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let unit = FileUnit::new("/p/src/scss/bad.scss", "bad.scss", b".a { color: ".to_vec());
        let err = SassCompile::new(Vec::new()).apply(unit).unwrap_err();
        assert!(matches!(err, TransformError::Sass { .. }));
        assert_eq!(err.path(), std::path::Path::new("/p/src/scss/bad.scss"));
    }
}
