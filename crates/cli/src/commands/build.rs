use eyre::WrapErr;
use modsmith_config::BuildConfig;
use modsmith_resolve::{ResolveMissingModules, Resolver};
use modsmith_task::{CreateDirectories, Executor, SystemToolRunner, Task, ToolInvocation, ToolRunner};
use modsmith_transfer::Transfer;
use std::sync::Arc;
use tracing::{error, info};

const FOUNDATION_TOOLS: [&str; 3] = ["javac", "jar", "javadoc"];

/// Task tree of a build
pub fn plan(
    config: &BuildConfig,
    resolver: Arc<Resolver>,
    runner: Arc<dyn ToolRunner>,
    verbose: bool,
) -> Task {
    let versions = if verbose {
        Task::parallel(
            "Print version of various foundation tools",
            FOUNDATION_TOOLS.map(|tool| {
                Task::run(ToolInvocation::new(tool).arg("--version"), Arc::clone(&runner))
            }),
        )
    } else {
        Task::run(ToolInvocation::new("javac").arg("--version"), runner)
    };

    Task::sequence(
        "Build project",
        [
            Task::leaf(
                "Create workspace",
                CreateDirectories::new([config.workspace_dir()]),
            ),
            versions,
            ResolveMissingModules::task(resolver),
        ],
    )
}

pub async fn execute(config: BuildConfig, verbose: bool) -> eyre::Result<()> {
    let workspace = config.workspace_dir();
    let fetcher = Arc::new(Transfer::new()?);
    let resolver = Arc::new(Resolver::new(config.clone(), fetcher)?);
    let task = plan(&config, resolver, Arc::new(SystemToolRunner), verbose);

    let summary = Executor::new().execute(task).await;
    let report = summary
        .write(&workspace, "build")
        .wrap_err("failed to write build summary")?;

    if summary.is_successful() {
        info!(
            tasks = summary.executed(),
            duration_ms = summary.duration().as_millis() as u64,
            summary = %report.display(),
            "build succeeded"
        );
    } else {
        error!(summary = %report.display(), "build failed");
    }
    summary.assert_successful()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsmith_config::{BuildConfigBuilder, CoordinateTable};
    use tempfile::TempDir;

    fn resolver(config: &BuildConfig) -> Arc<Resolver> {
        let fetcher = Arc::new(Transfer::new().unwrap());
        Arc::new(Resolver::new(config.clone(), fetcher).unwrap())
    }

    fn config(base: &std::path::Path) -> BuildConfig {
        BuildConfigBuilder::new(base)
            .unwrap()
            .coordinates(CoordinateTable::empty())
            .runtime_modules(Vec::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_plan_shape() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());

        let quiet = plan(&config, resolver(&config), Arc::new(SystemToolRunner), false);
        let names: Vec<_> = quiet.children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["Create workspace", "Run javac --version", "Resolve missing modules"]
        );
        assert_eq!(quiet.size(), 4);

        let verbose = plan(&config, resolver(&config), Arc::new(SystemToolRunner), true);
        let versions = &verbose.children()[1];
        assert!(versions.is_parallel());
        assert_eq!(versions.children().len(), FOUNDATION_TOOLS.len());
        assert_eq!(verbose.size(), 7);
    }
}
