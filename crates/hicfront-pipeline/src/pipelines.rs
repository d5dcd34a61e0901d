//! The four content pipelines wired to the project layout.

use crate::pipeline::{Pipeline, Step};
use crate::source::SourceSet;
use hicfront_common::{
    BannerMetadata, BuildConfig, BuildError, PipelineKind, ProjectLayout, Result,
};
use hicfront_transform::{
    CssMinify, IncludeResolver, Prefix, Rename, ResolveIncludes, SassCompile, ScriptMinify,
    StampBanner,
};
use std::sync::Arc;

/// All content pipelines of one project, shareable across tasks and watchers
#[derive(Debug, Clone)]
pub struct Pipelines {
    styles: Arc<Pipeline>,
    scripts: Arc<Pipeline>,
    markup: Arc<Pipeline>,
    images: Arc<Pipeline>,
}

impl Pipelines {
    pub fn new(
        layout: &ProjectLayout,
        config: &BuildConfig,
        banner: &BannerMetadata,
    ) -> Result<Self> {
        Ok(Self {
            styles: Arc::new(styles(layout, banner)?),
            scripts: Arc::new(scripts(layout, banner)?),
            markup: Arc::new(markup(layout, config)?),
            images: Arc::new(images(layout)?),
        })
    }

    pub fn get(&self, kind: PipelineKind) -> Arc<Pipeline> {
        match kind {
            PipelineKind::Styles => self.styles.clone(),
            PipelineKind::Scripts => self.scripts.clone(),
            PipelineKind::Markup => self.markup.clone(),
            PipelineKind::Images => self.images.clone(),
        }
    }
}

/// `src/scss/**/*.scss` → `dist/css/*.css` and `dist/css/*.min.css`.
///
/// Files starting with `_` are only reachable through imports.
pub fn styles(layout: &ProjectLayout, banner: &BannerMetadata) -> Result<Pipeline> {
    let sources = SourceSet::new(layout.styles_dir(), &["**/*.scss"])?.skip_underscored();
    let out = layout.css_output_dir();

    let steps = vec![
        Step::apply(SassCompile::new(vec![layout.node_modules()])),
        Step::apply(Prefix),
        Step::Fork(vec![
            Step::apply(StampBanner::new(banner)),
            Step::emit(&out),
        ]),
        Step::apply(CssMinify),
        Step::apply(StampBanner::new(banner)),
        Step::apply(Rename::suffix(".min")),
        Step::emit(out),
    ];

    Ok(Pipeline::new(PipelineKind::Styles, sources, steps))
}

/// `src/js/*.js` → `dist/js/*.min.js`; already minified files are skipped
pub fn scripts(layout: &ProjectLayout, banner: &BannerMetadata) -> Result<Pipeline> {
    let sources = SourceSet::new(layout.scripts_dir(), &["*.js"])?.exclude(&["*.min.js"])?;

    let steps = vec![
        Step::apply(ScriptMinify),
        Step::apply(StampBanner::new(banner)),
        Step::apply(Rename::suffix(".min")),
        Step::emit(layout.js_output_dir()),
    ];

    Ok(Pipeline::new(PipelineKind::Scripts, sources, steps))
}

/// `src/**/*.html` minus partials → `dist/`, includes expanded
pub fn markup(layout: &ProjectLayout, config: &BuildConfig) -> Result<Pipeline> {
    let partials = format!("{}/**", layout.partials_name());
    let sources = SourceSet::new(layout.source_dir(), &["**/*.html"])?.exclude(&[&partials])?;
    let resolver = IncludeResolver::new(&config.markup.prefix)
        .map_err(|e| BuildError::Config(format!("markup.prefix: {}", e)))?;

    let steps = vec![
        Step::apply(ResolveIncludes::new(resolver)),
        Step::emit(layout.output_dir()),
    ];

    Ok(Pipeline::new(PipelineKind::Markup, sources, steps))
}

/// `src/images/**/*` → `dist/images/`, byte for byte
pub fn images(layout: &ProjectLayout) -> Result<Pipeline> {
    let sources = SourceSet::new(layout.images_dir(), &["**/*"])?;
    Ok(Pipeline::new(
        PipelineKind::Images,
        sources,
        vec![Step::emit(layout.images_output_dir())],
    ))
}

/// Paths whose change re-runs a pipeline.
///
/// Wider than the build sources: a Sass partial or a markup fragment change
/// must rebuild the files that pull it in.
pub fn watch_set(kind: PipelineKind, layout: &ProjectLayout) -> Result<SourceSet> {
    match kind {
        PipelineKind::Styles => SourceSet::new(layout.styles_dir(), &["**/*"]),
        PipelineKind::Scripts => SourceSet::new(layout.scripts_dir(), &["**/*"]),
        PipelineKind::Markup => SourceSet::new(layout.source_dir(), &["**/*.html"]),
        PipelineKind::Images => SourceSet::new(layout.images_dir(), &["**/*"]),
    }
}
