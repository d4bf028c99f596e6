use crate::fetcher::ArtifactFetcher;
use crate::library::LibraryProvider;
use crate::modifiers;
use crate::provider::{ModuleProvider, ModuleScan};
use crate::runtime::RuntimeProvider;
use crate::source::SourceProvider;
use modsmith_config::{BuildConfig, FetchTarget};
use modsmith_core::{Error, RequiresMap, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, Instrument};

/// One artifact fetch dispatched by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedModule {
    pub module: String,
    pub uri: String,
    pub path: PathBuf,
}

/// Report of a converged resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Fetch rounds it took; zero when nothing was missing
    pub rounds: usize,
    pub fetched: Vec<FetchedModule>,
    pub declared: BTreeSet<String>,
    pub required: RequiresMap,
}

/// Working set of one resolution
struct State {
    runtime: ModuleScan,
    sources: ModuleScan,
    library: ModuleScan,
}

impl State {
    fn declared(&self) -> BTreeSet<String> {
        let mut declared = self.runtime.declared();
        declared.extend(self.library.declared());
        declared.extend(self.sources.declared());
        declared
    }
}

/// Fetches required modules into the library until every one is declared
pub struct Resolver {
    config: BuildConfig,
    fetcher: Arc<dyn ArtifactFetcher>,
    runtime: Arc<dyn ModuleProvider>,
    sources: Arc<dyn ModuleProvider>,
    library: Arc<LibraryProvider>,
}

impl Resolver {
    /// Providers are derived from the configuration
    pub fn new(config: BuildConfig, fetcher: Arc<dyn ArtifactFetcher>) -> Result<Self> {
        let runtime = Arc::new(RuntimeProvider::from_config(&config));
        let sources = Arc::new(SourceProvider::new(config.source_dirs())?);
        let library = Arc::new(LibraryProvider::new(config.library_dir()));
        Ok(Self {
            config,
            fetcher,
            runtime,
            sources,
            library,
        })
    }

    pub fn with_runtime(mut self, provider: impl ModuleProvider + 'static) -> Self {
        self.runtime = Arc::new(provider);
        self
    }

    pub fn with_sources(mut self, provider: impl ModuleProvider + 'static) -> Self {
        self.sources = Arc::new(provider);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Merged requirements of library and sources plus configured extras
    fn required(&self, state: &State) -> Result<RequiresMap> {
        let mut required = RequiresMap::merge_all([&state.library.requires, &state.sources.requires]);
        for requirement in &self.config.requires {
            required.add(requirement.clone());
        }
        modifiers::apply(&self.config.modifiers, &mut required);
        required.validate()?;
        Ok(required)
    }

    /// Run the resolution loop.
    ///
    /// Runtime and sources are scanned once, the library after every round.
    /// Fails on a version conflict, an unmapped module, or a module still
    /// missing after `max_fetch_attempts` fetches.
    pub async fn resolve(&self) -> Result<Resolution> {
        let mut state = State {
            runtime: scan(self.runtime.clone()).await?,
            sources: scan(self.sources.clone()).await?,
            library: scan(self.library.clone()).await?,
        };
        let mut attempts: BTreeMap<String, u32> = BTreeMap::new();
        let mut fetched = Vec::new();
        let mut rounds = 0;

        loop {
            let required = self.required(&state)?;
            let declared = state.declared();
            let missing = required.missing(&declared);
            if missing.is_empty() {
                info!(
                    rounds,
                    fetched = fetched.len(),
                    declared = declared.len(),
                    "module resolution complete"
                );
                fetched.sort_by(|a: &FetchedModule, b| a.module.cmp(&b.module));
                return Ok(Resolution {
                    rounds,
                    fetched,
                    declared,
                    required,
                });
            }

            rounds += 1;
            let mut targets = Vec::with_capacity(missing.len());
            for module in &missing {
                let count = attempts.entry(module.clone()).or_insert(0);
                if *count >= self.config.max_fetch_attempts {
                    return Err(Error::unresolved_module(module, *count));
                }
                *count += 1;
                targets.push(self.config.fetch_target(module, required.single_version(module))?);
            }
            info!(round = rounds, missing = ?missing, "fetching missing modules");

            fetched.extend(self.fetch_all(targets).await?);
            state.library = scan(self.library.clone()).await?;
        }
    }

    async fn fetch_all(&self, targets: Vec<FetchTarget>) -> Result<Vec<FetchedModule>> {
        let directory = self.library.directory().to_path_buf();
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| Error::file_system(&directory, "create library directory", e))?;

        let mut join_set = JoinSet::new();
        for target in targets {
            let fetcher = Arc::clone(&self.fetcher);
            let path = directory.join(target.file_name());
            let span = info_span!("fetch", module = %target.module);
            join_set.spawn(
                async move {
                    debug!(uri = %target.uri, path = %path.display(), "dispatching fetch");
                    let path = fetcher.fetch(&target.uri, &path).await;
                    FetchedModule {
                        module: target.module,
                        uri: target.uri,
                        path,
                    }
                }
                .instrument(span),
            );
        }

        let mut fetched = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(module) => fetched.push(module),
                Err(e) => return Err(Error::task_panicked("fetch", e.to_string())),
            }
        }
        Ok(fetched)
    }
}

async fn scan(provider: Arc<dyn ModuleProvider>) -> Result<ModuleScan> {
    let kind = provider.kind();
    let scan = tokio::task::spawn_blocking(move || provider.scan())
        .await
        .map_err(|e| Error::task_panicked(format!("scan {kind}"), e.to_string()))??;
    debug!(provider = %kind, modules = scan.modules.len(), "provider scanned");
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::fixture;
    use async_trait::async_trait;
    use modsmith_config::{BuildConfigBuilder, CoordinateTable};
    use modsmith_core::{ModuleDescriptor, ModuleRequires, Version, MODULE_INFO_CLASS};
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    struct NoFetch;

    #[async_trait]
    impl ArtifactFetcher for NoFetch {
        async fn fetch(&self, _uri: &str, path: &Path) -> PathBuf {
            panic!("unexpected fetch of {}", path.display());
        }
    }

    fn config(base: &Path) -> BuildConfig {
        BuildConfigBuilder::new(base)
            .unwrap()
            .coordinates(CoordinateTable::empty())
            .runtime_modules(Vec::new())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_library_and_sources_conflict() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());

        let library = config.library_dir();
        std::fs::create_dir_all(&library).unwrap();
        let descriptor = ModuleDescriptor::new("lib.b").with_requires(
            ModuleRequires::new("mod.a").with_version(Version::parse("2.0").unwrap()),
        );
        let mut writer = ZipWriter::new(std::fs::File::create(library.join("lib.b.jar")).unwrap());
        writer
            .start_file(MODULE_INFO_CLASS, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&fixture::module_info(&descriptor)).unwrap();
        writer.finish().unwrap();

        let sources = dir.path().join("src/app");
        std::fs::create_dir_all(&sources).unwrap();
        std::fs::write(
            sources.join("module-info.java"),
            "module app { requires mod.a /*1.0*/; requires lib.b; }",
        )
        .unwrap();

        let err = Resolver::new(config, Arc::new(NoFetch))
            .unwrap()
            .resolve()
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "multiple versions requested for module 'mod.a': 1.0, 2.0"
        );
    }

    #[tokio::test]
    async fn test_runtime_satisfies_requirements() {
        let dir = TempDir::new().unwrap();
        let sources = dir.path().join("src/app");
        std::fs::create_dir_all(&sources).unwrap();
        std::fs::write(
            sources.join("module-info.java"),
            "module app { requires java.sql; }",
        )
        .unwrap();

        let resolution = Resolver::new(config(dir.path()), Arc::new(NoFetch))
            .unwrap()
            .with_runtime(RuntimeProvider::explicit(["java.base", "java.sql"]))
            .resolve()
            .await
            .unwrap();
        assert_eq!(resolution.rounds, 0);
        assert!(resolution.declared.contains("java.sql"));
        assert!(resolution.required.contains("java.sql"));
    }
}
