//! Task execution for modsmith
//!
//! A build is an immutable tree of [`Task`]s. Leaves run one [`Action`],
//! composites run their children in sequence or in parallel. The
//! [`Executor`] walks a tree once and returns a [`Summary`] with timing,
//! captured output and the first failure.

pub mod actions;
pub mod execution;
pub mod executor;
pub mod summary;
pub mod task;
pub mod tool;

pub use actions::{CreateDirectories, DeleteDirectories};
pub use execution::Execution;
pub use executor::{Detail, Executor, Failure, Marker, OverviewEntry};
pub use summary::{Outcome, Summary};
pub use task::{Action, FnAction, Task, TaskKind};
pub use tool::{RunTool, SystemToolRunner, ToolInvocation, ToolOutput, ToolRunner};
