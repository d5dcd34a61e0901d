//! Vendor prefixing and minification with lightningcss.

use crate::{FileUnit, Transform, TransformError};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::sync::{Arc, RwLock};

/// lightningcss encodes versions as `major << 16 | minor << 8 | patch`
const fn version(major: u32, minor: u32) -> u32 {
    (major << 16) | (minor << 8)
}

/// Embedded browser support matrix
pub fn browser_targets() -> Targets {
    Targets::from(Browsers {
        android: Some(version(90, 0)),
        chrome: Some(version(90, 0)),
        edge: Some(version(90, 0)),
        firefox: Some(version(78, 0)),
        ios_saf: Some(version(12, 2)),
        opera: Some(version(76, 0)),
        safari: Some(version(13, 1)),
        samsung: Some(version(13, 0)),
        ..Browsers::default()
    })
}

/// Parse, prefix and print a stylesheet.
///
/// Rules and declarations lightningcss cannot parse (old IE hacks such as
/// `*zoom: 1`) are dropped with a warning instead of failing the file.
fn process(source: &str, filename: &str, minify: bool) -> Result<String, String> {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        filename: filename.to_string(),
        error_recovery: true,
        warnings: Some(warnings.clone()),
        ..ParserOptions::default()
    };
    let mut sheet = StyleSheet::parse(source, options).map_err(|e| e.to_string())?;

    if let Ok(warnings) = warnings.read() {
        for warning in warnings.iter() {
            tracing::warn!(file = filename, "Skipped invalid CSS: {}", warning);
        }
    }

    sheet
        .minify(MinifyOptions {
            targets: browser_targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let output = sheet
        .to_css(PrinterOptions {
            minify,
            targets: browser_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    Ok(output.code)
}

/// Add vendor prefixes, keeping expanded formatting.
///
/// Prefixed declarations are emitted next to the unprefixed one inside the
/// same rule; nothing is re-aligned or cascaded into child rules.
pub fn prefix_css(source: &str, filename: &str) -> Result<String, String> {
    let mut code = process(source, filename, false)?;
    if !code.is_empty() && !code.ends_with('\n') {
        code.push('\n');
    }
    Ok(code)
}

/// Minify a stylesheet
pub fn minify_css(source: &str, filename: &str) -> Result<String, String> {
    process(source, filename, true)
}

/// Pipeline step: vendor prefixing
#[derive(Debug, Clone, Default)]
pub struct Prefix;

/// Pipeline step: CSS minification
#[derive(Debug, Clone, Default)]
pub struct CssMinify;

fn css_step(
    unit: FileUnit,
    op: fn(&str, &str) -> Result<String, String>,
) -> Result<FileUnit, TransformError> {
    let filename = unit.relative.to_string_lossy().into_owned();
    let code = op(unit.text()?, &filename).map_err(|message| TransformError::Css {
        path: unit.origin.clone(),
        message,
    })?;
    Ok(unit.with_text(code))
}

impl Transform for Prefix {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn apply(&self, unit: FileUnit) -> Result<FileUnit, TransformError> {
        css_step(unit, prefix_css)
    }
}

impl Transform for CssMinify {
    fn name(&self) -> &'static str {
        "css-minify"
    }

    fn apply(&self, unit: FileUnit) -> Result<FileUnit, TransformError> {
        css_step(unit, minify_css)
    }
}
