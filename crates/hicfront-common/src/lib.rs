//! Common types for hicfront
//!
//! This crate provides the configuration, project layout, banner metadata and
//! error taxonomy shared by every hicfront crate.

pub mod banner;
pub mod config;
pub mod error;
pub mod kind;

pub use banner::{Author, BannerMetadata, PackageMetadata};
pub use config::{
    BannerConfig, BuildConfig, MarkupConfig, ProjectLayout, ServerConfig, VendorPackage,
    WatchConfig, CONFIG_FILE,
};
pub use error::{BuildError, Result};
pub use kind::{PipelineKind, ReloadKind};
