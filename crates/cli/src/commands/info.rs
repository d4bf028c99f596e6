use modsmith_config::BuildConfig;
use modsmith_resolve::{LibraryProvider, ModuleProvider, RuntimeProvider, SourceProvider};
use std::fmt::Write as _;

/// Render the configuration and what every provider declares and requires
pub fn render(config: &BuildConfig, providers: &[&dyn ModuleProvider]) -> eyre::Result<String> {
    let mut out = String::new();
    writeln!(out, "base        {}", config.base.display())?;
    writeln!(out, "library     {}", config.library_dir().display())?;
    for source in config.source_dirs() {
        writeln!(out, "sources     {}", source.display())?;
    }
    writeln!(out, "workspace   {}", config.workspace_dir().display())?;
    writeln!(out, "repository  {}", config.repository)?;
    writeln!(out, "attempts    {}", config.max_fetch_attempts)?;
    let modifiers: Vec<_> = config.modifiers.iter().map(|m| format!("{m:?}")).collect();
    writeln!(out, "modifiers   {}", modifiers.join(", "))?;

    for provider in providers {
        let scan = provider.scan()?;
        writeln!(out)?;
        writeln!(out, "[{}] {} module(s)", provider.kind(), scan.modules.len())?;
        for module in &scan.modules {
            writeln!(out, "  {module}")?;
        }
        for (module, versions) in scan.requires.iter() {
            let versions: Vec<_> = versions.iter().map(|v| v.to_string()).collect();
            if versions.is_empty() {
                writeln!(out, "  requires {module}")?;
            } else {
                writeln!(out, "  requires {module} ({})", versions.join(", "))?;
            }
        }
    }
    Ok(out)
}

pub async fn execute(config: BuildConfig) -> eyre::Result<()> {
    let text = tokio::task::spawn_blocking(move || -> eyre::Result<String> {
        let runtime = RuntimeProvider::from_config(&config);
        let library = LibraryProvider::new(config.library_dir());
        let sources = SourceProvider::new(config.source_dirs())?;
        render(&config, &[&runtime, &library, &sources])
    })
    .await??;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsmith_config::BuildConfigBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_render_lists_source_modules() {
        let dir = TempDir::new().unwrap();
        let module = dir.path().join("src/app");
        std::fs::create_dir_all(&module).unwrap();
        std::fs::write(
            module.join("module-info.java"),
            "module app { requires lib.x /*1.2.3*/; }",
        )
        .unwrap();
        let config = BuildConfigBuilder::new(dir.path())
            .unwrap()
            .runtime_modules(["java.base@17".to_string()])
            .build()
            .unwrap();

        let runtime = RuntimeProvider::from_config(&config);
        let sources = SourceProvider::new(config.source_dirs()).unwrap();
        let text = render(&config, &[&runtime, &sources]).unwrap();

        assert!(text.contains("[runtime] 1 module(s)"));
        assert!(text.contains("  java.base@17"));
        assert!(text.contains("[sources] 1 module(s)"));
        assert!(text.contains("  requires lib.x (1.2.3)"));
    }
}
