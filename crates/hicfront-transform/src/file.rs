use crate::{Transform, TransformError};
use std::path::{Path, PathBuf};

/// One file moving through a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUnit {
    /// Absolute path of the source file this unit was read from
    pub origin: PathBuf,

    /// Output path relative to the emit directory
    pub relative: PathBuf,

    /// Current contents
    pub contents: Vec<u8>,
}

impl FileUnit {
    pub fn new(
        origin: impl Into<PathBuf>,
        relative: impl Into<PathBuf>,
        contents: Vec<u8>,
    ) -> Self {
        Self {
            origin: origin.into(),
            relative: relative.into(),
            contents,
        }
    }

    /// Contents as UTF-8 text
    pub fn text(&self) -> Result<&str, TransformError> {
        std::str::from_utf8(&self.contents).map_err(|_| TransformError::Encoding {
            path: self.origin.clone(),
        })
    }

    /// Replace the contents with new text
    pub fn with_text(mut self, text: String) -> Self {
        self.contents = text.into_bytes();
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.relative.set_extension(extension);
        self
    }

    /// Directory of the source file
    pub fn origin_dir(&self) -> &Path {
        self.origin.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Insert a suffix before the extension: `app.js` → `app.min.js`
#[derive(Debug, Clone)]
pub struct Rename {
    suffix: String,
}

impl Rename {
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    fn renamed(&self, relative: &Path) -> PathBuf {
        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match relative.extension() {
            Some(ext) => format!("{}{}.{}", stem, self.suffix, ext.to_string_lossy()),
            None => format!("{}{}", stem, self.suffix),
        };
        relative.with_file_name(name)
    }
}

impl Transform for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&self, mut unit: FileUnit) -> Result<FileUnit, TransformError> {
        unit.relative = self.renamed(&unit.relative);
        Ok(unit)
    }
}
