//! Banner metadata stamped at the top of generated CSS and JS.

use crate::config::BannerConfig;
use crate::error::{BuildError, Result};
use chrono::Datelike;
use serde::Deserialize;
use std::path::Path;

/// The subset of package.json the banner needs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageMetadata {
    pub name: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub homepage: Option<String>,
    pub author: Option<Author>,
}

/// `author` is either a plain string or a person object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Person {
        name: String,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
}

impl Author {
    pub fn name(&self) -> &str {
        match self {
            Author::Name(name) => name,
            Author::Person { name, .. } => name,
        }
    }
}

impl PackageMetadata {
    /// Read package.json from path
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| BuildError::Metadata(format!("package.json: {}", e)))
    }
}

/// Provenance record rendered into the banner comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerMetadata {
    pub product: String,
    pub since: i32,
    pub title: String,
    pub version: String,
    pub homepage: String,
    pub author: String,
    pub year: i32,
}

impl BannerMetadata {
    /// Build banner metadata from package.json fields for a given year
    pub fn from_package(package: &PackageMetadata, banner: &BannerConfig, year: i32) -> Self {
        let title = package
            .title
            .clone()
            .or_else(|| package.name.clone())
            .unwrap_or_default();

        Self {
            product: banner.product.clone(),
            since: banner.since,
            title,
            version: package.version.clone().unwrap_or_default(),
            homepage: package.homepage.clone().unwrap_or_default(),
            author: package
                .author
                .as_ref()
                .map(|a| a.name().to_string())
                .unwrap_or_default(),
            year,
        }
    }

    /// Load package.json and stamp the current local year
    pub fn load(package_json: &Path, banner: &BannerConfig) -> Result<Self> {
        let package = PackageMetadata::read(package_json)?;
        let year = chrono::Local::now().year();
        Ok(Self::from_package(&package, banner, year))
    }

    /// Render the leading comment block, trailing blank line included
    pub fn render(&self) -> String {
        format!(
            "/*!\n * {} - {} v{} ({})\n * Copyright {}-{} {}\n */\n\n",
            self.product,
            self.title,
            self.version,
            self.homepage,
            self.since,
            self.year,
            self.author
        )
    }
}
