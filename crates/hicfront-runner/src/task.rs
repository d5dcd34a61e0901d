//! Named tasks and the expressions they are built from.

use hicfront_common::{BuildError, PipelineKind, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Task run when none is named
pub const DEFAULT_TASK: &str = "default";

/// An atomic unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Delete both vendor roots
    Clean,

    /// Copy the vendor allowlist
    Vendor,

    /// Run one content pipeline
    Pipeline(PipelineKind),

    /// Rebuild on source changes, forever
    Watch,

    /// Serve the output tree with live reload, forever
    Serve,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Clean => write!(f, "clean"),
            TaskKind::Vendor => write!(f, "vendor"),
            TaskKind::Pipeline(kind) => write!(f, "{}", kind),
            TaskKind::Watch => write!(f, "watch"),
            TaskKind::Serve => write!(f, "serve"),
        }
    }
}

/// How a task is composed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskExpr {
    Run(TaskKind),

    /// Another named task
    Ref(String),

    /// Each part finishes before the next starts
    Series(Vec<TaskExpr>),

    /// Parts run concurrently
    Parallel(Vec<TaskExpr>),
}

impl TaskExpr {
    pub fn task(name: &str) -> Self {
        TaskExpr::Ref(name.to_string())
    }

    fn visit_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TaskExpr::Run(_) => {}
            TaskExpr::Ref(name) => out.push(name),
            TaskExpr::Series(parts) | TaskExpr::Parallel(parts) => {
                for part in parts {
                    part.visit_refs(out);
                }
            }
        }
    }

    /// Names referenced directly by this expression
    pub fn refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.visit_refs(&mut out);
        out
    }
}

impl fmt::Display for TaskExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, name: &str, parts: &[TaskExpr]| {
            write!(f, "{}(", name)?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", part)?;
            }
            write!(f, ")")
        };

        match self {
            TaskExpr::Run(kind) => write!(f, "<{}>", kind),
            TaskExpr::Ref(name) => write!(f, "{}", name),
            TaskExpr::Series(parts) => join(f, "series", parts),
            TaskExpr::Parallel(parts) => join(f, "parallel", parts),
        }
    }
}

/// A registered task
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub expr: TaskExpr,
}

/// All tasks the CLI can run, by name
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock task set
    pub fn standard() -> Self {
        let content = || {
            ["css", "js", "html", "images"]
                .into_iter()
                .map(TaskExpr::task)
                .collect::<Vec<_>>()
        };

        let mut registry = Self::new();
        registry.register("clean", "Delete the vendor tree", TaskExpr::Run(TaskKind::Clean));
        registry.register(
            "vendor",
            "Clean, then copy vendor packages",
            TaskExpr::Series(vec![TaskExpr::task("clean"), TaskExpr::Run(TaskKind::Vendor)]),
        );
        registry.register(
            "css",
            "Compile styles",
            TaskExpr::Run(TaskKind::Pipeline(PipelineKind::Styles)),
        );
        registry.register(
            "js",
            "Minify scripts",
            TaskExpr::Run(TaskKind::Pipeline(PipelineKind::Scripts)),
        );
        registry.register(
            "html",
            "Assemble pages",
            TaskExpr::Run(TaskKind::Pipeline(PipelineKind::Markup)),
        );
        registry.register(
            "images",
            "Copy images",
            TaskExpr::Run(TaskKind::Pipeline(PipelineKind::Images)),
        );
        registry.register(
            "build",
            "Clean, stage vendor files, then run every content pipeline",
            TaskExpr::Series(vec![
                TaskExpr::task("clean"),
                TaskExpr::task("vendor"),
                TaskExpr::Parallel(content()),
            ]),
        );
        registry.register(
            "watch",
            "Build, then rebuild on change and serve with live reload",
            TaskExpr::Series(vec![
                TaskExpr::task("build"),
                TaskExpr::Parallel(vec![
                    TaskExpr::Run(TaskKind::Watch),
                    TaskExpr::Run(TaskKind::Serve),
                ]),
            ]),
        );

        let mut default = vec![TaskExpr::Run(TaskKind::Vendor)];
        default.extend(content());
        registry.register(
            DEFAULT_TASK,
            "Stage vendor files and run every content pipeline, without cleaning",
            TaskExpr::Parallel(default),
        );

        registry
    }

    /// Add or replace a task
    pub fn register(&mut self, name: &str, description: &str, expr: TaskExpr) {
        self.tasks.insert(
            name.to_string(),
            Task {
                name: name.to_string(),
                description: description.to_string(),
                expr,
            },
        );
    }

    pub fn get(&self, name: &str) -> Result<&Task> {
        self.tasks
            .get(name)
            .ok_or_else(|| BuildError::UnknownTask(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Check that every reference resolves and no task refers back to itself
    pub fn validate(&self) -> Result<()> {
        for task in self.tasks.values() {
            for name in task.expr.refs() {
                if !self.tasks.contains_key(name) {
                    return Err(BuildError::Graph(format!(
                        "task `{}` refers to unknown task `{}`",
                        task.name, name
                    )));
                }
            }
        }
        for name in self.tasks.keys() {
            self.check_cycle(name, &mut Vec::new())?;
        }
        Ok(())
    }

    fn check_cycle<'a>(&'a self, name: &'a str, stack: &mut Vec<&'a str>) -> Result<()> {
        if stack.contains(&name) {
            stack.push(name);
            return Err(BuildError::Graph(format!(
                "task reference cycle: {}",
                stack.join(" -> ")
            )));
        }

        let task = self.get(name)?;
        stack.push(name);
        for next in task.expr.refs() {
            self.check_cycle(next, stack)?;
        }
        stack.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let registry = TaskRegistry::standard();
        registry.validate().unwrap();
        assert_eq!(
            registry.names(),
            vec!["build", "clean", "css", "default", "html", "images", "js", "vendor", "watch"]
        );
    }

    #[test]
    fn test_display() {
        let registry = TaskRegistry::standard();
        assert_eq!(
            registry.get("vendor").unwrap().expr.to_string(),
            "series(clean, <vendor>)"
        );
        assert_eq!(
            registry.get("default").unwrap().expr.to_string(),
            "parallel(<vendor>, css, js, html, images)"
        );
    }

    #[test]
    fn test_unknown_reference() {
        let mut registry = TaskRegistry::new();
        registry.register("a", "", TaskExpr::task("missing"));
        let err = registry.validate().unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_reference_cycle() {
        let mut registry = TaskRegistry::new();
        registry.register("a", "", TaskExpr::Series(vec![TaskExpr::task("b")]));
        registry.register("b", "", TaskExpr::Parallel(vec![TaskExpr::task("a")]));
        let err = registry.validate().unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_unknown_task() {
        let err = TaskRegistry::standard().get("deploy").unwrap_err();
        assert!(matches!(err, BuildError::UnknownTask(name) if name == "deploy"));
    }
}
