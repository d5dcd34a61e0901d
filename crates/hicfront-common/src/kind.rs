use serde::{Deserialize, Serialize};
use std::fmt;

/// The four content pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    /// Sass → CSS
    Styles,

    /// JavaScript minification
    Scripts,

    /// HTML include assembly
    Markup,

    /// Verbatim image copy
    Images,
}

/// Class of update pushed to connected browsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReloadKind {
    /// Stylesheets are swapped in place
    StyleOnly,

    /// The page reloads
    Full,
}

impl PipelineKind {
    /// All content pipelines, in declaration order
    pub const ALL: [PipelineKind; 4] = [
        PipelineKind::Styles,
        PipelineKind::Scripts,
        PipelineKind::Markup,
        PipelineKind::Images,
    ];

    /// Short name used in logs and task names
    pub fn name(&self) -> &'static str {
        match self {
            PipelineKind::Styles => "styles",
            PipelineKind::Scripts => "scripts",
            PipelineKind::Markup => "markup",
            PipelineKind::Images => "images",
        }
    }

    /// Update class a run of this pipeline triggers
    pub fn reload_kind(&self) -> ReloadKind {
        match self {
            PipelineKind::Styles => ReloadKind::StyleOnly,
            _ => ReloadKind::Full,
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
