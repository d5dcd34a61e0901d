//! File transforms composed by hicfront pipelines.
//!
//! Each transform takes one [`FileUnit`] and returns the transformed unit, or a
//! [`TransformError`] describing why that single file could not be processed.
//! Transforms never write to the output tree; emitting is the pipeline's job.

pub mod banner;
pub mod css;
pub mod error;
pub mod file;
pub mod markup;
pub mod sass;
pub mod script;

pub use banner::StampBanner;
pub use css::{browser_targets, minify_css, prefix_css, CssMinify, Prefix};
pub use error::TransformError;
pub use file::{FileUnit, Rename};
pub use markup::{IncludeResolver, ResolveIncludes};
pub use sass::SassCompile;
pub use script::{minify_script, ScriptMinify};

/// A single step applied to every file flowing through a pipeline
pub trait Transform: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Transform one file
    fn apply(&self, unit: FileUnit) -> Result<FileUnit, TransformError>;
}
