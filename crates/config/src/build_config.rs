//! Build configuration with precedence: defaults, project file, environment

use crate::coordinates::{CoordinateTable, PatternEntry};
use crate::placeholder::Platform;
use crate::target::{FetchTarget, LinkOverride};
use modsmith_core::{
    constants::{
        CONFIG_FILENAME, DEFAULT_LIBRARY_DIR, DEFAULT_MAX_FETCH_ATTEMPTS, DEFAULT_SOURCE_DIR,
        DEFAULT_WORKSPACE_DIR, ENV_PREFIX, MAVEN_CENTRAL,
    },
    Error, Requirement, Result, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Adjustments applied to the required module set before computing what is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LibraryModifier {
    /// Require the matching JUnit test engine for each JUnit API in use
    #[serde(rename = "add-missing-junit-test-engines")]
    AddMissingJUnitTestEngines,
    /// Require the JUnit platform console once any engine is required
    #[serde(rename = "add-missing-junit-platform-console")]
    AddMissingJUnitPlatformConsole,
}

impl LibraryModifier {
    pub fn all() -> BTreeSet<Self> {
        BTreeSet::from([
            Self::AddMissingJUnitTestEngines,
            Self::AddMissingJUnitPlatformConsole,
        ])
    }
}

/// Where a configuration layer came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    EnvironmentVariable(String),
}

/// Fully layered build configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project base directory; relative paths below resolve against it
    pub base: PathBuf,
    pub library: PathBuf,
    pub sources: Vec<PathBuf>,
    pub workspace: PathBuf,
    pub repository: String,
    /// Fetch attempts allowed per module before giving up
    pub max_fetch_attempts: u32,
    pub links: BTreeMap<String, LinkOverride>,
    pub requires: Vec<Requirement>,
    pub modifiers: BTreeSet<LibraryModifier>,
    pub coordinates: CoordinateTable,
    /// Explicit runtime module names; `None` means detect
    pub runtime_modules: Option<Vec<String>>,
    /// Layers applied, in order
    pub sources_applied: Vec<ConfigSource>,
}

/// Shape of `modsmith.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    library: Option<PathBuf>,
    sources: Option<Vec<PathBuf>>,
    workspace: Option<PathBuf>,
    repository: Option<String>,
    max_fetch_attempts: Option<u32>,
    links: BTreeMap<String, LinkOverride>,
    requires: Vec<String>,
    modifiers: Option<BTreeSet<LibraryModifier>>,
    coordinates: BTreeMap<String, String>,
    coordinate_patterns: Vec<PatternEntry>,
    runtime_modules: Option<Vec<String>>,
}

impl BuildConfig {
    /// Built-in defaults for a project rooted at `base`
    pub fn defaults(base: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            base: base.into(),
            library: PathBuf::from(DEFAULT_LIBRARY_DIR),
            sources: vec![PathBuf::from(DEFAULT_SOURCE_DIR)],
            workspace: PathBuf::from(DEFAULT_WORKSPACE_DIR),
            repository: MAVEN_CENTRAL.to_string(),
            max_fetch_attempts: DEFAULT_MAX_FETCH_ATTEMPTS,
            links: BTreeMap::new(),
            requires: Vec::new(),
            modifiers: LibraryModifier::all(),
            coordinates: CoordinateTable::bundled()?,
            runtime_modules: None,
            sources_applied: vec![ConfigSource::Default],
        })
    }

    /// Load with full precedence, reading overrides from the process environment
    pub fn load(base: impl Into<PathBuf>) -> Result<Self> {
        Self::load_with_env(base, |key| std::env::var(key).ok())
    }

    pub fn load_with_env(
        base: impl Into<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::defaults(base)?;

        let path = config.base.join(CONFIG_FILENAME);
        if path.is_file() {
            config.apply_file(&path)?;
        }
        config.apply_env(env)?;
        config.validate()?;

        debug!(
            base = %config.base.display(),
            layers = config.sources_applied.len(),
            "loaded build configuration"
        );
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read config file", e))?;
        let file: FileConfig = toml::from_str(&content).map_err(|e| {
            Error::configuration(format!("failed to parse '{}': {e}", path.display()))
        })?;

        if let Some(library) = file.library {
            self.library = library;
        }
        if let Some(sources) = file.sources {
            self.sources = sources;
        }
        if let Some(workspace) = file.workspace {
            self.workspace = workspace;
        }
        if let Some(repository) = file.repository {
            self.repository = repository;
        }
        if let Some(attempts) = file.max_fetch_attempts {
            self.max_fetch_attempts = attempts;
        }
        if let Some(modifiers) = file.modifiers {
            self.modifiers = modifiers;
        }
        if let Some(runtime_modules) = file.runtime_modules {
            self.runtime_modules = Some(runtime_modules);
        }
        self.links.extend(file.links);
        for requires in &file.requires {
            self.requires.push(Requirement::parse(requires)?);
        }

        let coordinates = std::mem::take(&mut self.coordinates);
        self.coordinates = coordinates
            .with_custom(file.coordinates)
            .with_patterns(&file.coordinate_patterns)?;

        self.sources_applied
            .push(ConfigSource::ConfigFile(path.to_path_buf()));
        Ok(())
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        let key = |name: &str| format!("{ENV_PREFIX}{name}");

        if let Some(library) = env(&key("LIBRARY")) {
            self.library = PathBuf::from(library);
            self.sources_applied
                .push(ConfigSource::EnvironmentVariable(key("LIBRARY")));
        }
        if let Some(workspace) = env(&key("WORKSPACE")) {
            self.workspace = PathBuf::from(workspace);
            self.sources_applied
                .push(ConfigSource::EnvironmentVariable(key("WORKSPACE")));
        }
        if let Some(repository) = env(&key("REPOSITORY")) {
            self.repository = repository;
            self.sources_applied
                .push(ConfigSource::EnvironmentVariable(key("REPOSITORY")));
        }
        if let Some(attempts) = env(&key("MAX_FETCH_ATTEMPTS")) {
            self.max_fetch_attempts = attempts.trim().parse().map_err(|_| {
                Error::configuration(format!(
                    "{} must be a positive integer, got '{attempts}'",
                    key("MAX_FETCH_ATTEMPTS")
                ))
            })?;
            self.sources_applied
                .push(ConfigSource::EnvironmentVariable(key("MAX_FETCH_ATTEMPTS")));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_fetch_attempts == 0 {
            return Err(Error::configuration(
                "max_fetch_attempts must be at least 1",
            ));
        }
        if self.repository.trim().is_empty() {
            return Err(Error::configuration("repository must not be empty"));
        }
        Ok(())
    }

    pub fn library_dir(&self) -> PathBuf {
        self.base.join(&self.library)
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.base.join(&self.workspace)
    }

    pub fn source_dirs(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|dir| self.base.join(dir)).collect()
    }

    pub fn platform(&self) -> Platform {
        self.coordinates.platform()
    }

    /// Determine what to fetch for a missing `module`.
    ///
    /// A link override wins over the coordinate table. The fetched version is
    /// `requested` when given, otherwise the default of the matching entry.
    pub fn fetch_target(&self, module: &str, requested: Option<&Version>) -> Result<FetchTarget> {
        let platform = self.platform();

        if let Some(link) = self.links.get(module) {
            let version = requested.or(link.version.as_ref()).cloned();
            return Ok(FetchTarget {
                module: module.to_string(),
                uri: platform.expand(&link.uri, version.as_ref()),
                version,
                classifier: None,
            });
        }

        match self.coordinates.lookup(module)? {
            Some(coordinate) => {
                let version = requested.cloned().unwrap_or_else(|| coordinate.version.clone());
                Ok(FetchTarget {
                    module: module.to_string(),
                    uri: coordinate.uri(&self.repository, &version),
                    classifier: coordinate.classifier.clone(),
                    version: Some(version),
                })
            }
            None => Err(Error::unmapped_module(module)),
        }
    }
}

/// Builder for programmatic configurations
pub struct BuildConfigBuilder {
    config: BuildConfig,
}

impl BuildConfigBuilder {
    /// Start from the built-in defaults
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            config: BuildConfig::defaults(base)?,
        })
    }

    pub fn library(mut self, library: impl Into<PathBuf>) -> Self {
        self.config.library = library.into();
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = PathBuf>) -> Self {
        self.config.sources = sources.into_iter().collect();
        self
    }

    pub fn workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.config.workspace = workspace.into();
        self
    }

    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.config.repository = repository.into();
        self
    }

    pub fn max_fetch_attempts(mut self, attempts: u32) -> Self {
        self.config.max_fetch_attempts = attempts;
        self
    }

    pub fn link(mut self, module: impl Into<String>, link: LinkOverride) -> Self {
        self.config.links.insert(module.into(), link);
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.config.requires.push(requirement);
        self
    }

    pub fn modifiers(mut self, modifiers: impl IntoIterator<Item = LibraryModifier>) -> Self {
        self.config.modifiers = modifiers.into_iter().collect();
        self
    }

    pub fn coordinates(mut self, coordinates: CoordinateTable) -> Self {
        self.config.coordinates = coordinates;
        self
    }

    pub fn runtime_modules(mut self, modules: impl IntoIterator<Item = String>) -> Self {
        self.config.runtime_modules = Some(modules.into_iter().collect());
        self
    }

    pub fn build(self) -> Result<BuildConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
