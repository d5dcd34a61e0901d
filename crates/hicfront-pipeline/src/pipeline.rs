use crate::source::SourceSet;
use hicfront_common::{BuildError, PipelineKind, ReloadKind, Result};
use hicfront_transform::{FileUnit, Transform, TransformError};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One stage of a pipeline
pub enum Step {
    /// Transform the current file
    Apply(Box<dyn Transform>),

    /// Write the current file under this directory at its relative path
    Emit(PathBuf),

    /// Run the nested steps on a copy, then continue with the unchanged file
    Fork(Vec<Step>),
}

impl Step {
    pub fn apply(transform: impl Transform + 'static) -> Self {
        Step::Apply(Box::new(transform))
    }

    pub fn emit(dir: impl Into<PathBuf>) -> Self {
        Step::Emit(dir.into())
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Apply(t) => write!(f, "Apply({})", t.name()),
            Step::Emit(dir) => write!(f, "Emit({})", dir.display()),
            Step::Fork(steps) => f.debug_tuple("Fork").field(steps).finish(),
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub kind: PipelineKind,

    /// Source files read
    pub processed: usize,

    /// Output files written, in write order
    pub written: Vec<PathBuf>,

    /// Per-file failures; their outputs were left untouched
    pub diagnostics: Vec<TransformError>,
}

impl PipelineReport {
    fn new(kind: PipelineKind) -> Self {
        Self {
            kind,
            processed: 0,
            written: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn reload_kind(&self) -> ReloadKind {
        self.kind.reload_kind()
    }
}

/// A source set and the steps every matched file goes through
#[derive(Debug)]
pub struct Pipeline {
    kind: PipelineKind,
    sources: SourceSet,
    steps: Vec<Step>,
}

/// Run steps on one file, collecting emitted outputs in memory
fn evaluate(
    steps: &[Step],
    mut unit: FileUnit,
    outputs: &mut Vec<(PathBuf, Vec<u8>)>,
) -> std::result::Result<(), TransformError> {
    for step in steps {
        match step {
            Step::Apply(transform) => unit = transform.apply(unit)?,
            Step::Emit(dir) => outputs.push((dir.join(&unit.relative), unit.contents.clone())),
            Step::Fork(branch) => evaluate(branch, unit.clone(), outputs)?,
        }
    }
    Ok(())
}

fn emit_dirs<'a>(steps: &'a [Step], dirs: &mut Vec<&'a Path>) {
    for step in steps {
        match step {
            Step::Emit(dir) if !dirs.contains(&dir.as_path()) => dirs.push(dir),
            Step::Fork(branch) => emit_dirs(branch, dirs),
            _ => {}
        }
    }
}

impl Pipeline {
    pub fn new(kind: PipelineKind, sources: SourceSet, steps: Vec<Step>) -> Self {
        Self {
            kind,
            sources,
            steps,
        }
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Directories this pipeline writes into
    pub fn output_dirs(&self) -> Vec<&Path> {
        let mut dirs = Vec::new();
        emit_dirs(&self.steps, &mut dirs);
        dirs
    }

    /// Process every source file.
    ///
    /// A file's outputs are written only once all of its steps succeeded, so a
    /// failing file never leaves a half-updated set of outputs behind.
    pub async fn run(&self) -> Result<PipelineReport> {
        let started = Instant::now();
        let files = self.sources.collect()?;
        let mut report = PipelineReport::new(self.kind);

        for dir in self.output_dirs() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| BuildError::io(dir, e))?;
        }

        for relative in files {
            let origin = self.sources.base().join(&relative);
            let contents = tokio::fs::read(&origin)
                .await
                .map_err(|e| BuildError::io(&origin, e))?;
            report.processed += 1;

            let unit = FileUnit::new(origin, relative, contents);
            let mut outputs = Vec::new();
            if let Err(e) = evaluate(&self.steps, unit, &mut outputs) {
                tracing::error!(pipeline = %self.kind, "{}", e);
                report.diagnostics.push(e);
                continue;
            }

            for (path, contents) in outputs {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| BuildError::io(parent, e))?;
                }
                tokio::fs::write(&path, contents)
                    .await
                    .map_err(|e| BuildError::io(&path, e))?;
                tracing::debug!("Wrote {}", path.display());
                report.written.push(path);
            }
        }

        tracing::info!(
            pipeline = %self.kind,
            files = report.processed,
            written = report.written.len(),
            errors = report.diagnostics.len(),
            "Finished in {:?}",
            started.elapsed()
        );

        Ok(report)
    }
}
