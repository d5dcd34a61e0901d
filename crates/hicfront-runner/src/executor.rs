//! Runs a compiled task graph on the tokio runtime.

use crate::graph::{StepId, TaskGraph};
use crate::task::{TaskKind, TaskRegistry};
use hicfront_common::{BannerMetadata, BuildConfig, BuildError, ProjectLayout, Result};
use hicfront_dev_server::{ReloadHub, ReloadServer, WatchOrchestrator};
use hicfront_pipeline::{Pipelines, VendorStager};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Everything a step needs, shared by all steps of a run
pub struct TaskContext {
    pub layout: ProjectLayout,
    pub config: BuildConfig,
    pub pipelines: Pipelines,
    pub vendor: VendorStager,
    pub hub: Arc<ReloadHub>,
}

impl TaskContext {
    pub fn new(
        layout: ProjectLayout,
        config: BuildConfig,
        banner: &BannerMetadata,
    ) -> Result<Self> {
        let pipelines = Pipelines::new(&layout, &config, banner)?;
        let vendor = VendorStager::new(layout.clone(), config.vendor.clone());
        let hub = Arc::new(ReloadHub::new(layout.output_dir()));
        Ok(Self {
            layout,
            config,
            pipelines,
            vendor,
            hub,
        })
    }

    /// Read `hicfront.toml` and `package.json` under `root`
    pub fn load(root: &Path) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let config = BuildConfig::load(root)?;
        let banner = BannerMetadata::load(&layout.package_json(), &config.banner)?;
        Self::new(layout, config, &banner)
    }

    /// Run one step
    pub async fn run_step(&self, kind: TaskKind) -> Result<()> {
        match kind {
            TaskKind::Clean => self.vendor.clean().await,
            TaskKind::Vendor => self.vendor.stage().await.map(|_| ()),
            TaskKind::Pipeline(kind) => {
                let report = self.pipelines.get(kind).run().await?;
                self.hub.publish(&report);
                Ok(())
            }
            TaskKind::Watch => {
                WatchOrchestrator::new(
                    self.layout.clone(),
                    self.pipelines.clone(),
                    self.hub.clone(),
                    self.config.watch.debounce(),
                )
                .run()
                .await
            }
            TaskKind::Serve => {
                ReloadServer::new(
                    self.layout.output_dir(),
                    self.hub.clone(),
                    self.config.server.bind_addr(),
                )
                .run()
                .await
            }
        }
    }
}

/// Executes tasks from a registry
pub struct Runner {
    registry: TaskRegistry,
}

impl Runner {
    pub fn new(registry: TaskRegistry) -> Result<Self> {
        registry.validate()?;
        Ok(Self { registry })
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Compile and execute a named task
    pub async fn run(&self, name: &str, context: Arc<TaskContext>) -> Result<()> {
        let graph = TaskGraph::compile(&self.registry, name)?;
        tracing::info!("Starting '{}'", name);
        let started = Instant::now();
        execute(&graph, context).await?;
        tracing::info!("Finished '{}' after {:?}", name, started.elapsed());
        Ok(())
    }
}

/// Kahn-style execution: every step whose predecessors have finished runs
/// concurrently. The first failure stops the run and aborts running steps.
pub async fn execute(graph: &TaskGraph, context: Arc<TaskContext>) -> Result<()> {
    let mut waiting: HashMap<StepId, usize> = graph
        .steps()
        .map(|id| (id, graph.predecessors(id).count()))
        .collect();
    let mut running = JoinSet::new();

    let spawn = |running: &mut JoinSet<(StepId, TaskKind, Result<()>)>, id: StepId| {
        if let Some(kind) = graph.kind(id) {
            let context = context.clone();
            running.spawn(async move {
                tracing::debug!("Starting step '{}'", kind);
                let result = context.run_step(kind).await;
                (id, kind, result)
            });
        }
    };

    let ready: Vec<StepId> = waiting
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    for id in ready {
        spawn(&mut running, id);
    }

    while let Some(joined) = running.join_next().await {
        let (id, kind, result) =
            joined.map_err(|e| BuildError::Graph(format!("step aborted: {}", e)))?;

        if let Err(e) = result {
            tracing::error!("'{}' failed: {}", kind, e);
            running.abort_all();
            return Err(e);
        }
        tracing::debug!("Finished step '{}'", kind);

        for next in graph.successors(id) {
            if let Some(count) = waiting.get_mut(&next) {
                *count -= 1;
                if *count == 0 {
                    spawn(&mut running, next);
                }
            }
        }
    }

    Ok(())
}
