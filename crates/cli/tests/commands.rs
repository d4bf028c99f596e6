use modsmith_cli::Commands;
use modsmith_core::CONFIG_FILENAME;
use tempfile::TempDir;

#[tokio::test]
async fn clean_removes_workspace() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILENAME),
        "workspace = \"out\"\nruntime_modules = []\n",
    )
    .unwrap();
    let workspace = dir.path().join("out/summary");
    std::fs::create_dir_all(&workspace).unwrap();
    std::fs::write(workspace.join("summary.md"), "# Summary\n").unwrap();

    Commands::Clean.execute(dir.path(), false).await.unwrap();
    assert!(!dir.path().join("out").exists());

    // nothing left to delete
    Commands::Clean.execute(dir.path(), false).await.unwrap();
}

#[tokio::test]
async fn version_needs_no_configuration() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILENAME), "not valid toml [").unwrap();

    Commands::Version.execute(dir.path(), false).await.unwrap();
    assert!(Commands::Info.execute(dir.path(), false).await.is_err());
}
