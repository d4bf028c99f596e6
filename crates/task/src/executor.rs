//! Depth-first task tree executor.
//!
//! Sequential composites stop at the first failing child. Parallel composites
//! spawn every child on the runtime and wait for all of them; the failure
//! that completes first is the one reported. Failures never escape as
//! errors, they are returned as data in the [`Summary`].

use crate::execution::Execution;
use crate::summary::Summary;
use crate::task::{Action, Task, TaskKind};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use modsmith_core::Error;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{error, info, trace, warn, Instrument};
use uuid::Uuid;

/// The first failure of a subtree
#[derive(Debug, Clone)]
pub struct Failure {
    pub task: String,
    pub error: Arc<Error>,
}

impl Failure {
    fn new(task: &str, error: Error) -> Self {
        Self {
            task: task.to_string(),
            error: Arc::new(error),
        }
    }
}

/// Kind of an overview line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// A composite started
    Begin,
    /// A leaf finished
    Leaf,
    /// A composite finished, after all of its children
    End,
}

/// One line of the execution overview
#[derive(Debug, Clone)]
pub struct OverviewEntry {
    pub marker: Marker,
    pub thread: String,
    pub duration: Option<Duration>,
    pub task: String,
    /// Links a leaf entry to its [`Detail`]
    pub detail: Option<Uuid>,
}

/// Captured output of one leaf execution
#[derive(Debug, Clone)]
pub struct Detail {
    pub id: Uuid,
    pub task: String,
    pub started: chrono::DateTime<Utc>,
    pub duration: Duration,
    pub out: String,
    pub err: String,
}

impl Detail {
    /// Anchor used to cross-reference overview and details
    pub fn caption(&self) -> String {
        caption(self.id)
    }
}

pub(crate) fn caption(id: Uuid) -> String {
    format!("task-execution-details-{}", id.simple())
}

/// Append-only records shared by concurrently running branches
#[derive(Default)]
struct Journal {
    executed: AtomicUsize,
    overview: Mutex<Vec<OverviewEntry>>,
    details: Mutex<Vec<Detail>>,
}

impl Journal {
    fn record(&self, entry: OverviewEntry) {
        self.overview.lock().push(entry);
    }
}

/// Runs task trees
#[derive(Debug, Clone, Default)]
pub struct Executor;

impl Executor {
    pub fn new() -> Self {
        Self
    }

    /// Execute the whole tree once and report what happened
    pub async fn execute(&self, root: impl Into<Arc<Task>>) -> Summary {
        let root = root.into();
        let journal = Arc::new(Journal::default());
        let started = Utc::now();
        let start = Instant::now();

        let failure = execute_node(Arc::clone(&journal), Arc::clone(&root), 0).await;
        let duration = start.elapsed();

        let executed = journal.executed.load(Ordering::SeqCst);
        let overview = std::mem::take(&mut *journal.overview.lock());
        let details = std::mem::take(&mut *journal.details.lock());

        match &failure {
            Some(failure) => error!(
                task = %root.name(),
                failed = %failure.task,
                executed,
                duration_ms = duration.as_millis() as u64,
                "build failed"
            ),
            None => info!(
                task = %root.name(),
                executed,
                duration_ms = duration.as_millis() as u64,
                "build completed"
            ),
        }

        Summary::new(
            root.name().to_string(),
            started,
            duration,
            executed,
            failure,
            overview,
            details,
        )
    }
}

fn execute_node(
    journal: Arc<Journal>,
    task: Arc<Task>,
    depth: usize,
) -> BoxFuture<'static, Option<Failure>> {
    async move {
        let indent = "  ".repeat(depth);
        let sign = if task.is_composite() { '+' } else { '*' };
        trace!("{indent}{sign} {}", task.name());

        match task.kind() {
            TaskKind::Leaf(action) => execute_leaf(&journal, &task, Arc::clone(action), &indent).await,
            TaskKind::Composite { parallel, children } => {
                execute_composite(&journal, &task, *parallel, children, depth, &indent).await
            }
        }
    }
    .boxed()
}

async fn execute_leaf(
    journal: &Journal,
    task: &Task,
    action: Arc<dyn Action>,
    indent: &str,
) -> Option<Failure> {
    let mut execution = Execution::new();
    let result = AssertUnwindSafe(action.execute(&mut execution))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(Error::task_panicked(task.name(), panic_message(&*payload))));

    let duration = execution.start().elapsed();
    let id = execution.id();
    let started = execution.started();
    let (out, err) = execution.into_streams();

    if !out.is_empty() {
        info!(task = %task.name(), output = %indent_lines(indent, &out), "task_output");
    }
    if !err.is_empty() {
        warn!(task = %task.name(), output = %indent_lines(indent, &err), "task_error_output");
    }

    journal.record(OverviewEntry {
        marker: Marker::Leaf,
        thread: thread_label(),
        duration: Some(duration),
        task: task.name().to_string(),
        detail: Some(id),
    });
    journal.details.lock().push(Detail {
        id,
        task: task.name().to_string(),
        started,
        duration,
        out,
        err,
    });
    journal.executed.fetch_add(1, Ordering::SeqCst);

    match result {
        Ok(()) => None,
        Err(e) => {
            error!(task = %task.name(), error = %e, "task execution failed");
            Some(Failure::new(task.name(), e))
        }
    }
}

async fn execute_composite(
    journal: &Arc<Journal>,
    task: &Task,
    parallel: bool,
    children: &[Arc<Task>],
    depth: usize,
    indent: &str,
) -> Option<Failure> {
    let start = Instant::now();
    journal.record(OverviewEntry {
        marker: Marker::Begin,
        thread: thread_label(),
        duration: None,
        task: task.name().to_string(),
        detail: None,
    });

    let failure = if parallel && children.len() > 1 {
        let mut set = JoinSet::new();
        for child in children {
            let span = tracing::info_span!("task", name = child.name());
            set.spawn(
                execute_node(Arc::clone(journal), Arc::clone(child), depth + 1).instrument(span),
            );
        }

        let mut first = None;
        while let Some(joined) = set.join_next().await {
            let failure = joined.unwrap_or_else(|e| {
                Some(Failure::new(
                    task.name(),
                    Error::task_panicked(task.name(), e.to_string()),
                ))
            });
            if first.is_none() {
                first = failure;
            }
        }
        first
    } else {
        let mut failure = None;
        for child in children {
            failure = execute_node(Arc::clone(journal), Arc::clone(child), depth + 1).await;
            if failure.is_some() {
                break;
            }
        }
        failure
    };

    if failure.is_some() {
        return failure;
    }

    trace!("{indent}= {}", task.name());
    journal.record(OverviewEntry {
        marker: Marker::End,
        thread: thread_label(),
        duration: Some(start.elapsed()),
        task: task.name().to_string(),
        detail: None,
    });
    journal.executed.fetch_add(1, Ordering::SeqCst);
    None
}

fn thread_label() -> String {
    let id = format!("{:?}", std::thread::current().id());
    id.trim_start_matches("ThreadId(")
        .trim_end_matches(')')
        .to_string()
}

fn indent_lines(indent: &str, text: &str) -> String {
    if indent.is_empty() {
        return text.trim_end().to_string();
    }
    text.lines()
        .map(|line| format!("{indent}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ToolInvocation, ToolOutput, ToolRunner};
    use async_trait::async_trait;
    use modsmith_core::Result;
    use std::sync::atomic::AtomicBool;

    fn noop(name: &str) -> Task {
        Task::leaf_fn(name, |_| Ok(()))
    }

    fn failing(name: &str) -> Task {
        Task::leaf_fn(name, |_| Err(Error::configuration("boom")))
    }

    struct ExitCode(i32);

    #[async_trait]
    impl ToolRunner for ExitCode {
        async fn run(&self, _invocation: &ToolInvocation) -> Result<ToolOutput> {
            Ok(ToolOutput {
                code: self.0,
                ..ToolOutput::default()
            })
        }
    }

    #[tokio::test]
    async fn test_noop_tree_executes_every_node() {
        let tree = Task::sequence(
            "root",
            [
                noop("a"),
                Task::parallel("p", [noop("b"), noop("c"), noop("d")]),
                Task::sequence("s", [noop("e")]),
            ],
        );
        let size = tree.size();
        let summary = Executor::new().execute(tree).await;
        assert!(summary.failure().is_none());
        assert_eq!(summary.executed(), size);
        assert_eq!(summary.details().len(), 5);
    }

    #[tokio::test]
    async fn test_sequence_stops_at_failing_tool() {
        let ran_third = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran_third);
        let tree = Task::sequence(
            "build",
            [
                noop("first"),
                Task::run(ToolInvocation::new("javac").arg("-d"), Arc::new(ExitCode(2))),
                Task::leaf_fn("third", move |_| {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }),
            ],
        );

        let summary = Executor::new().execute(tree).await;
        assert_eq!(summary.executed(), 2);
        assert!(!ran_third.load(Ordering::SeqCst));

        let failure = summary.failure().unwrap();
        assert_eq!(failure.task, "Run javac -d");
        assert!(matches!(
            *failure.error,
            Error::CommandExecution {
                exit_code: Some(2),
                ..
            }
        ));
        assert_eq!(summary.details().len(), 2);
    }

    #[tokio::test]
    async fn test_parallel_runs_all_children_despite_failure() {
        let tree = Task::parallel(
            "tests",
            [noop("a"), failing("b"), noop("c"), failing("d")],
        );
        let summary = Executor::new().execute(tree).await;
        assert_eq!(summary.executed(), 4);
        let failure = summary.failure().unwrap();
        assert!(failure.task == "b" || failure.task == "d");
    }

    #[tokio::test]
    async fn test_panicking_leaf_is_a_failure() {
        let tree = Task::sequence(
            "root",
            [Task::leaf_fn("explode", |_| panic!("kaboom"))],
        );
        let summary = Executor::new().execute(tree).await;
        let failure = summary.failure().unwrap();
        assert_eq!(failure.task, "explode");
        match &*failure.error {
            Error::TaskPanicked { message, .. } => assert_eq!(message, "kaboom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_details_capture_output_exactly() {
        let tree = Task::leaf_fn("print", |execution| {
            execution.write_out("line 1\nline 2\n");
            execution.write_err("warn 1");
            Ok(())
        });
        let summary = Executor::new().execute(tree).await;
        let detail = &summary.details()[0];
        assert_eq!(detail.out, "line 1\nline 2\n");
        assert_eq!(detail.err, "warn 1");

        let leaf = &summary.overview()[0];
        assert_eq!(leaf.marker, Marker::Leaf);
        assert_eq!(leaf.detail, Some(detail.id));
    }

    #[tokio::test]
    async fn test_overview_order_for_sequence() {
        let tree = Task::sequence("root", [noop("a"), noop("b")]);
        let summary = Executor::new().execute(tree).await;
        let lines: Vec<_> = summary
            .overview()
            .iter()
            .map(|entry| (entry.marker, entry.task.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![
                (Marker::Begin, "root"),
                (Marker::Leaf, "a"),
                (Marker::Leaf, "b"),
                (Marker::End, "root"),
            ]
        );
    }

    #[tokio::test]
    async fn test_tree_can_be_executed_twice() {
        let tree = Arc::new(Task::parallel("p", [noop("a"), noop("b")]));
        let executor = Executor::new();
        let first = executor.execute(Arc::clone(&tree)).await;
        let second = executor.execute(tree).await;
        assert_eq!(first.executed(), 3);
        assert_eq!(second.executed(), 3);
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(indent_lines("  ", "a\nb\n"), "  a\n  b");
        assert_eq!(indent_lines("", "a\n"), "a");
    }
}
