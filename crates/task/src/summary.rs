use crate::executor::{caption, Detail, Failure, Marker, OverviewEntry};
use chrono::{DateTime, Utc};
use modsmith_core::{Error, Result};
use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of a whole-tree execution
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Success,
    Failed(&'a Failure),
}

/// Report of one whole-tree execution
#[derive(Debug, Clone)]
pub struct Summary {
    root: String,
    started: DateTime<Utc>,
    duration: Duration,
    executed: usize,
    failure: Option<Failure>,
    overview: Vec<OverviewEntry>,
    details: Vec<Detail>,
}

impl Summary {
    pub(crate) fn new(
        root: String,
        started: DateTime<Utc>,
        duration: Duration,
        executed: usize,
        failure: Option<Failure>,
        overview: Vec<OverviewEntry>,
        details: Vec<Detail>,
    ) -> Self {
        Self {
            root,
            started,
            duration,
            executed,
            failure,
            overview,
            details,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of tasks that ran to completion, failing leaves included
    pub fn executed(&self) -> usize {
        self.executed
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn outcome(&self) -> Outcome<'_> {
        match &self.failure {
            Some(failure) => Outcome::Failed(failure),
            None => Outcome::Success,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.failure.is_none()
    }

    pub fn overview(&self) -> &[OverviewEntry] {
        &self.overview
    }

    pub fn details(&self) -> &[Detail] {
        &self.details
    }

    /// Turn a recorded failure into an error naming the failing task
    pub fn assert_successful(&self) -> Result<()> {
        match &self.failure {
            Some(failure) => Err(Error::build_failed(
                failure.task.clone(),
                self.root.clone(),
                failure.error.clone(),
            )),
            None => Ok(()),
        }
    }

    pub fn to_markdown(&self) -> Vec<String> {
        let mut md = vec![
            "# Summary".to_string(),
            format!("- {} ({})", std::env::consts::OS, std::env::consts::ARCH),
            format!("- Executed task `{}`", self.root),
            format!("- Started {}", self.started.to_rfc3339()),
            format!("- Build took {}", format_duration(self.duration)),
        ];
        md.extend(self.failure_details());
        md.extend(self.overview_table());
        md.extend(self.detail_sections());
        md
    }

    fn failure_details(&self) -> Vec<String> {
        let Some(failure) = &self.failure else {
            return Vec::new();
        };
        let mut md = vec![
            String::new(),
            "## Failure Details".to_string(),
            format!("### {} failed", failure.task),
            "```text".to_string(),
        ];
        md.extend(failure.error.to_string().lines().map(str::to_string));
        let mut source = failure.error.source();
        while let Some(cause) = source {
            md.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        md.push("```".to_string());
        md
    }

    fn overview_table(&self) -> Vec<String> {
        if self.overview.is_empty() {
            return Vec::new();
        }
        let mut md = vec![
            String::new(),
            "## Task Execution Overview".to_string(),
            "|    |Thread|Duration|Caption".to_string(),
            "|----|-----:|-------:|-------".to_string(),
        ];
        for entry in &self.overview {
            let kind = match entry.marker {
                Marker::Begin => '+',
                Marker::Leaf => ' ',
                Marker::End => '=',
            };
            let duration = entry
                .duration
                .map(|d| d.as_millis().to_string())
                .unwrap_or_default();
            let mut line = format!(
                "|{kind:>4}|{:>6}|{duration:>8}| {}",
                entry.thread, entry.task
            );
            if let Some(id) = entry.detail {
                line.push_str(&format!(" [...](#{})", caption(id)));
            }
            md.push(line);
        }
        md
    }

    fn detail_sections(&self) -> Vec<String> {
        if self.details.is_empty() {
            return Vec::new();
        }
        let mut md = vec![String::new(), "## Task Execution Details".to_string()];
        for detail in &self.details {
            md.push(String::new());
            md.push(format!("### {}", detail.caption()));
            md.push(format!(" - **{}**", detail.task));
            md.push(format!(" - Started = {}", detail.started.to_rfc3339()));
            md.push(format!(" - Duration = {}", format_duration(detail.duration)));
            if !detail.out.trim().is_empty() {
                md.push(String::new());
                md.push("Normal (expected) output".to_string());
                md.push("```".to_string());
                md.push(detail.out.trim().to_string());
                md.push("```".to_string());
            }
            if !detail.err.trim().is_empty() {
                md.push(String::new());
                md.push("Error output".to_string());
                md.push("```".to_string());
                md.push(detail.err.trim().to_string());
                md.push("```".to_string());
            }
        }
        md
    }

    /// Write `summary/<prefix>-<timestamp>.md` below `workspace` and replace `summary.md`
    pub fn write(&self, workspace: &Path, prefix: &str) -> Result<PathBuf> {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let directory = workspace.join("summary");
        let file = directory.join(format!("{prefix}-{timestamp}.md"));
        let mut markdown = self.to_markdown().join("\n");
        markdown.push('\n');

        std::fs::create_dir_all(&directory)
            .map_err(|e| Error::file_system(&directory, "create summary directory", e))?;
        std::fs::write(&file, &markdown)
            .map_err(|e| Error::file_system(&file, "write summary", e))?;
        let latest = workspace.join("summary.md");
        std::fs::write(&latest, &markdown)
            .map_err(|e| Error::file_system(&latest, "write summary", e))?;
        Ok(file)
    }
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis} ms")
    } else {
        format!("{:.3} s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Executor, Task};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_assert_successful() {
        let ok = Executor::new()
            .execute(Task::leaf_fn("ok", |_| Ok(())))
            .await;
        assert!(ok.assert_successful().is_ok());
        assert!(matches!(ok.outcome(), Outcome::Success));

        let failed = Executor::new()
            .execute(Task::sequence(
                "Build app",
                [
                    Task::leaf_fn("prepare", |_| Ok(())),
                    Task::leaf_fn("compile", |_| Err(Error::configuration("bad"))),
                ],
            ))
            .await;
        assert!(matches!(failed.outcome(), Outcome::Failed(f) if f.task == "compile"));
        let err = failed.assert_successful().unwrap_err();
        assert_eq!(err.to_string(), "compile failed");
        match err {
            Error::BuildFailed { task, root, source } => {
                assert_eq!(task, "compile");
                assert_eq!(root, "Build app");
                assert!(Arc::ptr_eq(&source, &failed.failure().unwrap().error));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_markdown_sections() {
        let summary = Executor::new()
            .execute(Task::sequence(
                "root",
                [
                    Task::leaf_fn("hello", |execution| {
                        execution.write_out("hello world\n");
                        Ok(())
                    }),
                    Task::leaf_fn("broken", |execution| {
                        execution.write_err("warning: oops\n");
                        Err(Error::configuration("broken"))
                    }),
                ],
            ))
            .await;

        let md = summary.to_markdown();
        assert_eq!(md[0], "# Summary");
        assert!(md.contains(&"- Executed task `root`".to_string()));
        assert!(md.contains(&"### broken failed".to_string()));
        assert!(md.contains(&"|    |Thread|Duration|Caption".to_string()));
        assert!(md.contains(&"hello world".to_string()));
        assert!(md.contains(&"warning: oops".to_string()));

        let caption = summary.details()[0].caption();
        assert!(md.iter().any(|line| line.ends_with(&format!("(#{caption})"))));
        assert!(md.contains(&format!("### {caption}")));
    }

    #[tokio::test]
    async fn test_write_summary_files() {
        let dir = TempDir::new().unwrap();
        let summary = Executor::new()
            .execute(Task::leaf_fn("only", |_| Ok(())))
            .await;

        let file = summary.write(dir.path(), "build").unwrap();
        assert!(file.starts_with(dir.path().join("summary")));
        let name = file.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("build-") && name.ends_with(".md"));
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            std::fs::read_to_string(dir.path().join("summary.md")).unwrap()
        );
    }
}
