//! Modules declared by `module-info.java` files below the source roots

use crate::provider::{ModuleProvider, ModuleScan, ProviderKind};
use modsmith_core::{
    Error, ModuleDescriptor, ModuleRequires, RequiresModifier, Result, Version, MODULE_INFO_JAVA,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const NAME_PATTERN: &str = r"(?:open\s+)?module\s+([\w.$]+)\s*\{";
const REQUIRES_PATTERN: &str =
    r"requires\s+((?:(?:transitive|static)\s+)*)([\w.$]+)\s*(?:/\*\s*([^*\s]+)\s*\*/)?\s*;";
const COMMENT_PATTERN: &str = r"(?s)/\*.*?\*/|//[^\n]*";

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::configuration(format!("invalid descriptor pattern '{pattern}': {e}")))
}

#[derive(Debug, Clone)]
pub struct SourceProvider {
    roots: Vec<PathBuf>,
    name: Regex,
    requires: Regex,
    comment: Regex,
}

impl SourceProvider {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Result<Self> {
        Ok(Self {
            roots: roots.into_iter().collect(),
            name: compile(NAME_PATTERN)?,
            requires: compile(REQUIRES_PATTERN)?,
            comment: compile(COMMENT_PATTERN)?,
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Every `module-info.java` below the roots, sorted
    pub fn descriptors(&self) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for root in self.roots.iter().filter(|root| root.is_dir()) {
            for entry in WalkDir::new(root).follow_links(true) {
                let entry = entry.map_err(|e| {
                    let path = e.path().unwrap_or(root.as_path()).to_path_buf();
                    match e.into_io_error() {
                        Some(source) => Error::file_system(path, "walk sources", source),
                        None => Error::configuration(format!(
                            "cannot walk source root {}",
                            root.display()
                        )),
                    }
                })?;
                if entry.file_type().is_file() && entry.file_name() == MODULE_INFO_JAVA {
                    found.push(entry.into_path());
                }
            }
        }
        found.sort();
        Ok(found)
    }

    /// Parse the name and `requires` clauses of a module declaration
    pub fn parse(&self, path: &Path, text: &str) -> Result<ModuleDescriptor> {
        let text = self.strip_comments(text);

        let name = self
            .name
            .captures(&text)
            .and_then(|captures| captures.get(1))
            .ok_or_else(|| Error::malformed_descriptor(path, "expected a module declaration"))?
            .as_str();

        let mut descriptor = ModuleDescriptor::new(name);
        for captures in self.requires.captures_iter(&text) {
            let mut requires = ModuleRequires::new(&captures[2]);
            for keyword in captures[1].split_whitespace() {
                let modifier = match keyword {
                    "transitive" => RequiresModifier::Transitive,
                    _ => RequiresModifier::Static,
                };
                requires = requires.with_modifier(modifier);
            }
            if let Some(version) = captures.get(3) {
                let version = Version::parse(version.as_str()).map_err(|e| {
                    Error::malformed_descriptor(path, format!("requires {}: {e}", &captures[2]))
                })?;
                requires = requires.with_version(version);
            }
            descriptor = descriptor.with_requires(requires);
        }
        Ok(descriptor)
    }

    /// Blank out comments, except a single-token `/*version*/` right before `;`
    fn strip_comments(&self, text: &str) -> String {
        let mut stripped = String::with_capacity(text.len());
        let mut last = 0;
        for comment in self.comment.find_iter(text) {
            stripped.push_str(&text[last..comment.start()]);
            last = comment.end();
            if is_version_marker(comment.as_str(), &text[comment.end()..]) {
                stripped.push_str(comment.as_str());
            } else {
                stripped.push(' ');
            }
        }
        stripped.push_str(&text[last..]);
        stripped
    }
}

fn is_version_marker(comment: &str, rest: &str) -> bool {
    let Some(body) = comment
        .strip_prefix("/*")
        .and_then(|body| body.strip_suffix("*/"))
    else {
        return false;
    };
    let body = body.trim();
    !body.is_empty()
        && !body.contains(|c: char| c.is_whitespace() || c == '*')
        && rest.trim_start().starts_with(';')
}

impl ModuleProvider for SourceProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sources
    }

    fn scan(&self) -> Result<ModuleScan> {
        let modules = self
            .descriptors()?
            .iter()
            .map(|path| {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| Error::file_system(path, "read module descriptor", e))?;
                self.parse(path, &text)
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(roots = self.roots.len(), modules = modules.len(), "scanned sources");
        Ok(ModuleScan::all_requires(modules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn provider() -> SourceProvider {
        SourceProvider::new(Vec::new()).unwrap()
    }

    #[test]
    fn test_parse_requires_clauses() {
        let text = r#"
            // module old.name {
            open module org.example.app {
                requires lib.x;
                requires transitive static org.example.api /*2.1*/;
                requires static   org.apiguardian.api;
                // requires commented.out;
                requires org.junit.jupiter.api /* 5.6.0-M1 */ ;
                exports org.example.app;
            }
        "#;
        let descriptor = provider().parse(Path::new("module-info.java"), text).unwrap();
        assert_eq!(descriptor.name, "org.example.app");

        let names: Vec<_> = descriptor.requires.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["lib.x", "org.example.api", "org.apiguardian.api", "org.junit.jupiter.api"]
        );

        let api = &descriptor.requires[1];
        assert!(api.has(RequiresModifier::Transitive));
        assert!(api.has(RequiresModifier::Static));
        assert_eq!(api.compiled_version, Some(Version::parse("2.1").unwrap()));
        assert_eq!(
            descriptor.requires[3].compiled_version,
            Some(Version::parse("5.6.0-M1").unwrap())
        );
        assert!(descriptor.requires[0].modifiers.is_empty());
    }

    #[test]
    fn test_block_comments_are_ignored() {
        let text = r#"
            /* requires ghost.module; */
            module app {
                /**
                 * Uses: requires legacy.lib;
                 */
                requires lib.x; /* requires spent.lib; */
                requires lib.y /*1.0*/; // requires line.lib;
            }
        "#;
        let descriptor = provider().parse(Path::new("module-info.java"), text).unwrap();
        assert_eq!(descriptor.name, "app");

        let names: Vec<_> = descriptor.requires.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["lib.x", "lib.y"]);
        assert_eq!(
            descriptor.requires[1].compiled_version,
            Some(Version::parse("1.0").unwrap())
        );
    }

    #[test]
    fn test_commented_module_declaration_is_skipped() {
        let text = "/* module old.name { */ module new.name { requires lib.x; }";
        let descriptor = provider().parse(Path::new("module-info.java"), text).unwrap();
        assert_eq!(descriptor.name, "new.name");
    }

    #[test]
    fn test_missing_module_name_is_malformed() {
        let err = provider()
            .parse(Path::new("broken/module-info.java"), "requires x;")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { path, .. } if path.ends_with("broken/module-info.java")));
    }

    #[test]
    fn test_scan_keeps_static_requires() {
        let dir = TempDir::new().unwrap();
        let module_dir = dir.path().join("src/app/main/java");
        std::fs::create_dir_all(&module_dir).unwrap();
        std::fs::write(
            module_dir.join(MODULE_INFO_JAVA),
            "module app { requires lib.x; requires static lib.y; }",
        )
        .unwrap();

        let scan = SourceProvider::new([dir.path().join("src"), dir.path().join("absent")])
            .unwrap()
            .scan()
            .unwrap();
        assert_eq!(scan.declared().into_iter().collect::<Vec<_>>(), vec!["app"]);
        assert_eq!(scan.requires.modules().collect::<Vec<_>>(), vec!["lib.x", "lib.y"]);
        assert!(scan.requires.versions("lib.x").unwrap().is_empty());
    }
}
