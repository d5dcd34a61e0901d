//! Task graph for hicfront.
//!
//! Named tasks live in a [`TaskRegistry`] as expressions over atomic steps,
//! `Series`, `Parallel` and references to other tasks. Running a task compiles
//! it into a [`TaskGraph`] of step instances which [`execute`] drives to
//! completion.

pub mod executor;
pub mod graph;
pub mod task;

pub use executor::{execute, Runner, TaskContext};
pub use graph::{StepId, TaskGraph};
pub use task::{Task, TaskExpr, TaskKind, TaskRegistry, DEFAULT_TASK};
