//! Modules the Java runtime already provides

use crate::provider::{ModuleProvider, ModuleScan, ProviderKind};
use modsmith_config::BuildConfig;
use modsmith_core::{ModuleDescriptor, Result, Version};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// System modules of a Java runtime.
///
/// A detecting provider runs the launcher on first use of `modules` or
/// `scan`, never on construction.
#[derive(Debug, Clone)]
pub struct RuntimeProvider {
    launcher: Option<PathBuf>,
    modules: OnceLock<Vec<ModuleDescriptor>>,
}

impl RuntimeProvider {
    /// Runtime with exactly the given modules
    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            launcher: None,
            modules: OnceLock::from(parse_listing(names)),
        }
    }

    /// Ask the host `java` for its system modules
    pub fn detect() -> Self {
        Self::detect_with(java_launcher())
    }

    /// Ask `launcher --list-modules` for the system modules.
    ///
    /// A missing or failing launcher yields an empty runtime.
    pub fn detect_with(launcher: impl Into<PathBuf>) -> Self {
        Self {
            launcher: Some(launcher.into()),
            modules: OnceLock::new(),
        }
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        match &config.runtime_modules {
            Some(names) => Self::explicit(names),
            None => Self::detect(),
        }
    }

    /// Listed modules; blocks on the launcher the first time for a detecting provider
    pub fn modules(&self) -> &[ModuleDescriptor] {
        self.modules.get_or_init(|| match &self.launcher {
            Some(launcher) => list_modules(launcher),
            None => Vec::new(),
        })
    }

    /// Whether the module listing is already known
    pub fn is_listed(&self) -> bool {
        self.modules.get().is_some()
    }
}

impl ModuleProvider for RuntimeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Runtime
    }

    fn scan(&self) -> Result<ModuleScan> {
        Ok(ModuleScan::forcing_only(self.modules().to_vec()))
    }
}

fn list_modules(java: &Path) -> Vec<ModuleDescriptor> {
    match Command::new(java).arg("--list-modules").output() {
        Ok(output) if output.status.success() => {
            let listing = String::from_utf8_lossy(&output.stdout);
            let modules = parse_listing(listing.lines());
            debug!(
                java = %java.display(),
                modules = modules.len(),
                "detected runtime modules"
            );
            modules
        }
        Ok(output) => {
            warn!(
                java = %java.display(),
                code = ?output.status.code(),
                "listing runtime modules failed, assuming none"
            );
            Vec::new()
        }
        Err(e) => {
            warn!(java = %java.display(), error = %e, "java launcher unavailable, assuming no runtime modules");
            Vec::new()
        }
    }
}

fn parse_listing<I, S>(lines: I) -> Vec<ModuleDescriptor>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| parse_module_line(line.as_ref()))
        .collect()
}

fn java_launcher() -> PathBuf {
    let executable = if cfg!(windows) { "java.exe" } else { "java" };
    match std::env::var_os("JAVA_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join("bin").join(executable),
        _ => PathBuf::from(executable),
    }
}

/// Parse `name[@version]`, ignoring anything after whitespace
fn parse_module_line(line: &str) -> Option<ModuleDescriptor> {
    let token = line.split_whitespace().next()?;
    let (name, version) = match token.split_once('@') {
        Some((name, version)) => (name, Version::parse(version).ok()),
        None => (token, None),
    };
    if name.is_empty() {
        return None;
    }
    let descriptor = ModuleDescriptor::new(name);
    Some(match version {
        Some(version) => descriptor.with_version(version),
        None => descriptor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_listing() {
        let provider = RuntimeProvider::explicit([
            "java.base@17.0.2",
            "java.sql@17.0.2 file:///opt/jdk",
            "jdk.jfr",
            "",
            "   ",
        ]);
        let scan = provider.scan().unwrap();
        let declared: Vec<_> = scan.declared().into_iter().collect();
        assert_eq!(declared, vec!["java.base", "java.sql", "jdk.jfr"]);
        assert!(scan.requires.is_empty());

        let base = &provider.modules()[0];
        assert_eq!(base.version, Some(Version::parse("17.0.2").unwrap()));
        assert_eq!(provider.modules()[2].version, None);
    }

    #[test]
    fn test_from_config_uses_explicit_list() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = modsmith_config::BuildConfigBuilder::new(dir.path())
            .unwrap()
            .runtime_modules(["java.base".to_string()])
            .build()
            .unwrap();
        let provider = RuntimeProvider::from_config(&config);
        assert!(provider.is_listed());
        assert_eq!(provider.modules().len(), 1);
        assert_eq!(provider.kind(), ProviderKind::Runtime);
    }

    #[test]
    fn test_missing_launcher_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = RuntimeProvider::detect_with(dir.path().join("no-java"));
        assert!(provider.scan().unwrap().modules.is_empty());
        assert!(provider.is_listed());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detection_runs_on_scan_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("ran");
        let launcher = dir.path().join("java");
        std::fs::write(
            &launcher,
            format!(
                "#!/bin/sh\ntouch '{}'\necho 'java.base@17'\necho 'java.sql@17'\n",
                marker.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&launcher, std::fs::Permissions::from_mode(0o755)).unwrap();

        let provider = RuntimeProvider::detect_with(&launcher);
        assert!(!provider.is_listed());
        assert!(!marker.exists());

        let scan = tokio::task::spawn_blocking(move || provider.scan())
            .await
            .unwrap()
            .unwrap();
        assert!(marker.exists());
        let declared: Vec<_> = scan.declared().into_iter().collect();
        assert_eq!(declared, vec!["java.base", "java.sql"]);
    }
}
