//! `hicfront.toml` configuration and the fixed project layout.
//!
//! Every field defaults to the layout and behaviour asset authors rely on, so a
//! project without a config file builds exactly like one with an empty file.

use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the optional config file at the project root
pub const CONFIG_FILE: &str = "hicfront.toml";

/// Top-level build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub markup: MarkupConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub banner: BannerConfig,

    /// Vendor allowlist; replaces the default set when present
    #[serde(default = "VendorPackage::defaults")]
    pub vendor: Vec<VendorPackage>,
}

/// Reload notifier listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Markup include settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// Trigger token for include directives and variables
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period before a changed pipeline re-runs
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Static parts of the banner header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerConfig {
    #[serde(default = "default_product")]
    pub product: String,

    /// First copyright year
    #[serde(default = "default_since")]
    pub since: i32,
}

/// One third-party package copied into the vendor tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorPackage {
    /// Display name used in logs and errors
    pub name: String,

    /// Directory to copy from, relative to `node_modules`
    pub source: PathBuf,

    /// Glob patterns, relative to `source`
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,

    /// File names to leave out
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Directory name under each vendor root
    pub dest: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_prefix() -> String {
    "@@".to_string()
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_product() -> String {
    "HIC Front".to_string()
}

fn default_since() -> i32 {
    2021
}

fn default_patterns() -> Vec<String> {
    vec!["**/*".to_string()]
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            markup: MarkupConfig::default(),
            watch: WatchConfig::default(),
            banner: BannerConfig::default(),
            vendor: VendorPackage::defaults(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            product: default_product(),
            since: default_since(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl VendorPackage {
    fn new(name: &str, source: &str, patterns: &[&str], exclude: &[&str], dest: &str) -> Self {
        Self {
            name: name.to_string(),
            source: PathBuf::from(source),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            exclude: exclude.iter().map(|e| e.to_string()).collect(),
            dest: PathBuf::from(dest),
        }
    }

    /// The stock allowlist: UI framework, icon font, DOM utilities, positioning engine
    pub fn defaults() -> Vec<VendorPackage> {
        vec![
            VendorPackage::new("bootstrap", "bootstrap/dist", &["**/*"], &[], "bootstrap"),
            VendorPackage::new(
                "bootstrap-icons",
                "bootstrap-icons/font",
                &["**/*"],
                &[],
                "bootstrap-icons",
            ),
            VendorPackage::new("jquery", "jquery/dist", &["*"], &["core.js"], "jquery"),
            VendorPackage::new(
                "popper",
                "@popperjs/core/dist/cjs",
                &["popper.js"],
                &[],
                "popper.js",
            ),
        ]
    }
}

impl BuildConfig {
    /// Load `hicfront.toml` from the project root, falling back to defaults
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("No {} at {}, using defaults", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: BuildConfig = toml::from_str(content)
            .map_err(|e| BuildError::Config(format!("{}: {}", CONFIG_FILE, e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.markup.prefix.trim().is_empty() {
            return Err(BuildError::Config("markup.prefix must not be empty".into()));
        }
        for package in &self.vendor {
            if package.patterns.is_empty() {
                return Err(BuildError::Config(format!(
                    "vendor package `{}` has no patterns",
                    package.name
                )));
            }
            if package.dest.is_absolute() || package.source.is_absolute() {
                return Err(BuildError::Config(format!(
                    "vendor package `{}` must use relative paths",
                    package.name
                )));
            }
        }
        Ok(())
    }
}

/// Fixed source and output directory names.
///
/// These names are the contract between the build and the asset authors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_json(&self) -> PathBuf {
        self.root.join("package.json")
    }

    pub fn node_modules(&self) -> PathBuf {
        self.root.join("node_modules")
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn styles_dir(&self) -> PathBuf {
        self.source_dir().join("scss")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.source_dir().join("js")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.source_dir().join("images")
    }

    /// Include-only fragments, relative to the source dir
    pub fn partials_name(&self) -> &'static str {
        "partials"
    }

    /// Vendor staging copy inside the source tree
    pub fn vendor_staging_dir(&self) -> PathBuf {
        self.source_dir().join("vendor")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("dist")
    }

    pub fn css_output_dir(&self) -> PathBuf {
        self.output_dir().join("css")
    }

    pub fn js_output_dir(&self) -> PathBuf {
        self.output_dir().join("js")
    }

    pub fn images_output_dir(&self) -> PathBuf {
        self.output_dir().join("images")
    }

    /// Vendor publish copy inside the output tree
    pub fn vendor_publish_dir(&self) -> PathBuf {
        self.output_dir().join("vendor")
    }

    /// Both vendor roots, staging first
    pub fn vendor_dirs(&self) -> [PathBuf; 2] {
        [self.vendor_staging_dir(), self.vendor_publish_dir()]
    }
}
