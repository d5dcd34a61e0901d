use crate::task::{TaskExpr, TaskKind, TaskRegistry};
use hicfront_common::{BuildError, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// Step instance identifier (graph node index)
pub type StepId = NodeIndex;

/// Step instances of one task run; an edge means "finishes before"
#[derive(Debug, Clone)]
pub struct TaskGraph {
    /// Name of the task this graph was compiled from
    name: String,

    graph: DiGraph<TaskKind, ()>,
}

/// Entry and exit steps of a compiled sub-expression
struct Fragment {
    sources: Vec<StepId>,
    sinks: Vec<StepId>,
}

impl TaskGraph {
    /// Expand a named task, following references, into step instances
    pub fn compile(registry: &TaskRegistry, name: &str) -> Result<Self> {
        let task = registry.get(name)?;
        let mut graph = DiGraph::new();
        let mut stack = vec![name.to_string()];
        Self::expand(registry, &task.expr, &mut graph, &mut stack)?;

        let compiled = Self {
            name: name.to_string(),
            graph,
        };
        compiled.topological_order()?;
        Ok(compiled)
    }

    fn expand(
        registry: &TaskRegistry,
        expr: &TaskExpr,
        graph: &mut DiGraph<TaskKind, ()>,
        stack: &mut Vec<String>,
    ) -> Result<Fragment> {
        match expr {
            TaskExpr::Run(kind) => {
                let id = graph.add_node(*kind);
                Ok(Fragment {
                    sources: vec![id],
                    sinks: vec![id],
                })
            }
            TaskExpr::Ref(name) => {
                if stack.contains(name) {
                    return Err(BuildError::Graph(format!(
                        "task reference cycle: {} -> {}",
                        stack.join(" -> "),
                        name
                    )));
                }
                let task = registry.get(name)?;
                stack.push(name.clone());
                let fragment = Self::expand(registry, &task.expr, graph, stack)?;
                stack.pop();
                Ok(fragment)
            }
            TaskExpr::Series(parts) => {
                let mut result: Option<Fragment> = None;
                for part in parts {
                    let next = Self::expand(registry, part, graph, stack)?;
                    if next.sources.is_empty() {
                        continue;
                    }
                    result = Some(match result {
                        None => next,
                        Some(prev) => {
                            for &from in &prev.sinks {
                                for &to in &next.sources {
                                    graph.add_edge(from, to, ());
                                }
                            }
                            Fragment {
                                sources: prev.sources,
                                sinks: next.sinks,
                            }
                        }
                    });
                }
                Ok(result.unwrap_or(Fragment {
                    sources: Vec::new(),
                    sinks: Vec::new(),
                }))
            }
            TaskExpr::Parallel(parts) => {
                let mut fragment = Fragment {
                    sources: Vec::new(),
                    sinks: Vec::new(),
                };
                for part in parts {
                    let next = Self::expand(registry, part, graph, stack)?;
                    fragment.sources.extend(next.sources);
                    fragment.sinks.extend(next.sinks);
                }
                Ok(fragment)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn kind(&self, id: StepId) -> Option<TaskKind> {
        self.graph.node_weight(id).copied()
    }

    pub fn steps(&self) -> impl Iterator<Item = StepId> + '_ {
        self.graph.node_indices()
    }

    /// Steps that must finish before `id` starts
    pub fn predecessors(&self, id: StepId) -> impl Iterator<Item = StepId> + '_ {
        self.graph.neighbors_directed(id, Direction::Incoming)
    }

    /// Steps waiting on `id`
    pub fn successors(&self, id: StepId) -> impl Iterator<Item = StepId> + '_ {
        self.graph.neighbors_directed(id, Direction::Outgoing)
    }

    /// All steps in an order that respects every edge
    pub fn topological_order(&self) -> Result<Vec<StepId>> {
        petgraph::algo::toposort(&self.graph, None).map_err(|cycle| {
            BuildError::Graph(format!(
                "cycle in task `{}` at step {:?}",
                self.name,
                self.kind(cycle.node_id())
            ))
        })
    }
}
