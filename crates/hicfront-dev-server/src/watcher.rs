//! Re-runs pipelines when their source files change.

use crate::hub::{ReloadHub, ReloadMessage};
use hicfront_common::{BuildError, PipelineKind, ProjectLayout, Result};
use hicfront_pipeline::{watch_set, Pipelines};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Watches every pipeline's sources and drives rebuilds
pub struct WatchOrchestrator {
    layout: ProjectLayout,
    pipelines: Pipelines,
    hub: Arc<ReloadHub>,
    debounce: Duration,
}

/// Live watchers and the channel they report into
pub struct ActiveWatch {
    _watchers: Vec<RecommendedWatcher>,
    rx: mpsc::UnboundedReceiver<PipelineKind>,
}

/// Wait for a change, then collect further changes until the debounce
/// period passes quietly. Returns `None` once every watcher is gone.
pub async fn next_batch(
    rx: &mut mpsc::UnboundedReceiver<PipelineKind>,
    debounce: Duration,
) -> Option<BTreeSet<PipelineKind>> {
    let first = rx.recv().await?;
    let mut batch = BTreeSet::from([first]);

    while let Ok(Some(kind)) = tokio::time::timeout(debounce, rx.recv()).await {
        batch.insert(kind);
    }
    Some(batch)
}

impl WatchOrchestrator {
    pub fn new(
        layout: ProjectLayout,
        pipelines: Pipelines,
        hub: Arc<ReloadHub>,
        debounce: Duration,
    ) -> Self {
        Self {
            layout,
            pipelines,
            hub,
            debounce,
        }
    }

    /// Install one watcher per pipeline
    pub fn watch(&self) -> Result<ActiveWatch> {
        // Event paths are absolute and resolved, so match against a resolved root
        let root = std::fs::canonicalize(self.layout.root())
            .map_err(|e| BuildError::io(self.layout.root(), e))?;
        let layout = ProjectLayout::new(root);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watchers = Vec::with_capacity(PipelineKind::ALL.len());
        for kind in PipelineKind::ALL {
            let set = watch_set(kind, &layout)?;
            let dir = set.base().to_path_buf();
            let tx = tx.clone();

            let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
                match res {
                    Ok(event) => {
                        if matches!(event.kind, EventKind::Access(_)) {
                            return;
                        }
                        if event.paths.iter().any(|path| set.contains(path)) {
                            tracing::debug!("{} change: {:?}", kind, event.paths);
                            let _ = tx.send(kind);
                        }
                    }
                    Err(e) => tracing::warn!("File watcher error: {}", e),
                }
            })
            .map_err(|e| BuildError::Watch(format!("cannot create watcher: {}", e)))?;

            watcher
                .watch(&dir, RecursiveMode::Recursive)
                .map_err(|e| BuildError::Watch(format!("cannot watch {}: {}", dir.display(), e)))?;
            tracing::debug!("Watching {} for {}", dir.display(), kind);
            watchers.push(watcher);
        }

        Ok(ActiveWatch {
            _watchers: watchers,
            rx,
        })
    }

    /// Re-run one pipeline and tell the browsers
    pub async fn rebuild(&self, kind: PipelineKind) {
        tracing::info!("Rebuilding {}", kind);
        match self.pipelines.get(kind).run().await {
            Ok(report) => self.hub.publish(&report),
            Err(e) => {
                tracing::error!("{} rebuild failed: {}", kind, e);
                self.hub.send(ReloadMessage::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Process change batches until the watchers stop
    pub async fn listen(&self, mut active: ActiveWatch) {
        while let Some(batch) = next_batch(&mut active.rx, self.debounce).await {
            for kind in batch {
                self.rebuild(kind).await;
            }
        }
    }

    /// Watch and rebuild until the task is cancelled
    pub async fn run(&self) -> Result<()> {
        let active = self.watch()?;
        tracing::info!("Watching {} for changes", self.layout.source_dir().display());
        self.listen(active).await;
        Ok(())
    }
}
