use modsmith_config::BuildConfig;
use modsmith_task::{DeleteDirectories, Executor, Task};
use tracing::info;

pub async fn execute(config: BuildConfig) -> eyre::Result<()> {
    let workspace = config.workspace_dir();
    let task = Task::leaf("Delete workspace", DeleteDirectories::new([workspace.clone()]));
    Executor::new().execute(task).await.assert_successful()?;
    info!(workspace = %workspace.display(), "workspace cleaned");
    Ok(())
}
