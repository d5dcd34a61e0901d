//! Content pipelines and vendor staging.
//!
//! A [`Pipeline`] reads every file matched by its [`SourceSet`], pushes it
//! through a list of [`Step`]s and writes whatever the steps emit. Per-file
//! transform failures become diagnostics in the [`PipelineReport`]; only
//! filesystem failures abort a run.

pub mod pipeline;
pub mod pipelines;
pub mod source;
pub mod vendor;

pub use hicfront_transform::TransformError;
pub use pipeline::{Pipeline, PipelineReport, Step};
pub use pipelines::{watch_set, Pipelines};
pub use source::SourceSet;
pub use vendor::{VendorReport, VendorStager};
