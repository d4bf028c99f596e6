//! Immutable build task trees

use crate::execution::Execution;
use crate::tool::{RunTool, ToolInvocation, ToolRunner};
use async_trait::async_trait;
use modsmith_core::Result;
use std::fmt;
use std::sync::Arc;

/// The work performed by a leaf task
#[async_trait]
pub trait Action: Send + Sync {
    async fn execute(&self, execution: &mut Execution) -> Result<()>;
}

/// Adapts a synchronous closure into an [`Action`]
pub struct FnAction<F>(F);

#[async_trait]
impl<F> Action for FnAction<F>
where
    F: Fn(&mut Execution) -> Result<()> + Send + Sync,
{
    async fn execute(&self, execution: &mut Execution) -> Result<()> {
        (self.0)(execution)
    }
}

#[derive(Clone)]
pub enum TaskKind {
    Leaf(Arc<dyn Action>),
    Composite {
        parallel: bool,
        children: Vec<Arc<Task>>,
    },
}

/// A named node of a build tree.
///
/// Names are for humans and need not be unique. A tree is never mutated once
/// built, so one tree may be executed any number of times.
#[derive(Clone)]
pub struct Task {
    name: String,
    kind: TaskKind,
}

impl Task {
    pub fn leaf(name: impl Into<String>, action: impl Action + 'static) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Leaf(Arc::new(action)),
        }
    }

    /// Leaf running a synchronous closure
    pub fn leaf_fn<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut Execution) -> Result<()> + Send + Sync + 'static,
    {
        Self::leaf(name, FnAction(action))
    }

    /// Leaf running one tool invocation
    pub fn run(invocation: ToolInvocation, runner: Arc<dyn ToolRunner>) -> Self {
        let name = invocation.display_name();
        Self::leaf(name, RunTool::new(invocation, runner))
    }

    pub fn sequence(name: impl Into<String>, children: impl IntoIterator<Item = Task>) -> Self {
        Self::composite(name, false, children)
    }

    pub fn parallel(name: impl Into<String>, children: impl IntoIterator<Item = Task>) -> Self {
        Self::composite(name, true, children)
    }

    fn composite(
        name: impl Into<String>,
        parallel: bool,
        children: impl IntoIterator<Item = Task>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Composite {
                parallel,
                children: children.into_iter().map(Arc::new).collect(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TaskKind::Composite { .. })
    }

    /// Whether children run concurrently; only meaningful with two or more children
    pub fn is_parallel(&self) -> bool {
        matches!(&self.kind, TaskKind::Composite { parallel: true, children } if children.len() > 1)
    }

    pub fn children(&self) -> &[Arc<Task>] {
        match &self.kind {
            TaskKind::Leaf(_) => &[],
            TaskKind::Composite { children, .. } => children,
        }
    }

    /// Total number of nodes in this tree, composites included
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|child| child.size()).sum::<usize>()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TaskKind::Leaf(_) => f.debug_struct("Task").field("name", &self.name).finish(),
            TaskKind::Composite { parallel, children } => f
                .debug_struct("Task")
                .field("name", &self.name)
                .field("parallel", parallel)
                .field("children", children)
                .finish(),
        }
    }
}
