//! Layered lookup from module names to remote artifact coordinates.
//!
//! Exact user entries win over the bundled defaults, and regex patterns
//! (user patterns first) are only consulted when no exact entry matches.

use crate::placeholder::Platform;
use modsmith_core::{Error, Result, Version, ARCHIVE_EXTENSION};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const BUNDLED_DEFAULTS: &str = include_str!("defaults.toml");

/// A Maven-style `group:artifact:version[:classifier]` coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: Version,
    pub classifier: Option<String>,
}

impl Coordinate {
    pub fn parse(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.trim().split(':').collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(Error::invalid_coordinate(
                value,
                "expected group:artifact:version[:classifier]",
            ));
        }
        if parts[..3].iter().any(|part| part.is_empty()) {
            return Err(Error::invalid_coordinate(value, "empty coordinate part"));
        }
        let version = Version::parse(parts[2])
            .map_err(|e| Error::invalid_coordinate(value, e.to_string()))?;
        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version,
            classifier: parts
                .get(3)
                .filter(|classifier| !classifier.is_empty())
                .map(|classifier| classifier.to_string()),
        })
    }

    /// Location of the artifact for `version` below `repository`
    pub fn uri(&self, repository: &str, version: &Version) -> String {
        let file = match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, version, classifier, ARCHIVE_EXTENSION
            ),
            None => format!("{}-{}.{}", self.artifact, version, ARCHIVE_EXTENSION),
        };
        format!(
            "{}/{}/{}/{}/{}",
            repository.trim_end_matches('/'),
            self.group.replace('.', "/"),
            self.artifact,
            version,
            file
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

/// A regex-keyed coordinate template; `$1`.. refer to capture groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    #[serde(rename = "match")]
    pub pattern: String,
    pub coordinate: String,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    regex: Regex,
    template: String,
}

impl CompiledPattern {
    fn compile(entry: &PatternEntry) -> Result<Self> {
        let regex = Regex::new(&entry.pattern).map_err(|e| {
            Error::configuration(format!("invalid coordinate pattern '{}': {e}", entry.pattern))
        })?;
        Ok(Self {
            regex,
            template: entry.coordinate.clone(),
        })
    }

    fn apply(&self, module: &str) -> Option<String> {
        let captures = self.regex.captures(module)?;
        let mut expanded = self.template.clone();
        for index in (1..captures.len()).rev() {
            let value = captures.get(index).map_or("", |m| m.as_str());
            expanded = expanded.replace(&format!("${index}"), value);
        }
        Some(expanded)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TableDocument {
    coordinates: BTreeMap<String, String>,
    patterns: Vec<PatternEntry>,
}

/// Module name to coordinate lookup
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    custom: BTreeMap<String, String>,
    defaults: BTreeMap<String, String>,
    patterns: Vec<CompiledPattern>,
    platform: Platform,
}

impl CoordinateTable {
    /// Table holding only the bundled defaults
    pub fn bundled() -> Result<Self> {
        let document: TableDocument = toml::from_str(BUNDLED_DEFAULTS)
            .map_err(|e| Error::configuration(format!("bundled coordinates: {e}")))?;
        let patterns = document
            .patterns
            .iter()
            .map(CompiledPattern::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            custom: BTreeMap::new(),
            defaults: document.coordinates,
            patterns,
            platform: Platform::host(),
        })
    }

    /// Table without any entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add user entries that take precedence over the defaults
    pub fn with_custom(
        mut self,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.custom.extend(entries);
        self
    }

    /// Add user patterns, tried before the bundled ones
    pub fn with_patterns(mut self, entries: &[PatternEntry]) -> Result<Self> {
        let mut patterns = entries
            .iter()
            .map(CompiledPattern::compile)
            .collect::<Result<Vec<_>>>()?;
        patterns.append(&mut self.patterns);
        self.patterns = patterns;
        Ok(self)
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Look up the coordinate for `module`
    pub fn lookup(&self, module: &str) -> Result<Option<Coordinate>> {
        let raw = self
            .custom
            .get(module)
            .or_else(|| self.defaults.get(module))
            .cloned()
            .or_else(|| self.patterns.iter().find_map(|pattern| pattern.apply(module)));
        match raw {
            Some(raw) => Coordinate::parse(&self.platform.expand(&raw, None)).map(Some),
            None => Ok(None),
        }
    }

    /// Number of exact entries across both layers
    pub fn len(&self) -> usize {
        self.custom.len()
            + self
                .defaults
                .keys()
                .filter(|module| !self.custom.contains_key(*module))
                .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        let coordinate = Coordinate::parse("org.opentest4j:opentest4j:1.2.0").unwrap();
        assert_eq!(coordinate.group, "org.opentest4j");
        assert_eq!(coordinate.artifact, "opentest4j");
        assert_eq!(coordinate.version.as_str(), "1.2.0");
        assert_eq!(coordinate.classifier, None);

        let classified = Coordinate::parse("org.lwjgl:lwjgl:3.2.3:natives-linux").unwrap();
        assert_eq!(classified.classifier.as_deref(), Some("natives-linux"));
        assert_eq!(classified.to_string(), "org.lwjgl:lwjgl:3.2.3:natives-linux");

        assert!(Coordinate::parse("g:a").is_err());
        assert!(Coordinate::parse("g::1.0").is_err());
        assert!(Coordinate::parse("g:a:x").is_err());
    }

    #[test]
    fn test_maven_uri() {
        let coordinate = Coordinate::parse("org.junit.jupiter:junit-jupiter-api:5.6.0-M1").unwrap();
        let version = coordinate.version.clone();
        assert_eq!(
            coordinate.uri("https://repo1.maven.org/maven2/", &version),
            "https://repo1.maven.org/maven2/org/junit/jupiter/junit-jupiter-api/5.6.0-M1/junit-jupiter-api-5.6.0-M1.jar"
        );

        let natives = Coordinate::parse("org.lwjgl:lwjgl:3.2.3:natives-linux").unwrap();
        assert!(natives
            .uri("https://repo", &natives.version)
            .ends_with("/org/lwjgl/lwjgl/3.2.3/lwjgl-3.2.3-natives-linux.jar"));
    }

    #[test]
    fn test_bundled_defaults() {
        let table = CoordinateTable::bundled()
            .unwrap()
            .with_platform(Platform::for_os("linux"));
        let jupiter = table.lookup("org.junit.jupiter.api").unwrap().unwrap();
        assert_eq!(jupiter.artifact, "junit-jupiter-api");
        assert_eq!(jupiter.version.as_str(), "5.6.0-M1");

        let natives = table.lookup("org.lwjgl.natives").unwrap().unwrap();
        assert_eq!(natives.classifier.as_deref(), Some("natives-linux"));

        assert!(table.lookup("com.example.unknown").unwrap().is_none());
    }

    #[test]
    fn test_patterns_fill_families() {
        let table = CoordinateTable::bundled()
            .unwrap()
            .with_platform(Platform::for_os("windows"));

        let controls = table.lookup("javafx.controls").unwrap().unwrap();
        assert_eq!(controls.group, "org.openjfx");
        assert_eq!(controls.artifact, "javafx-controls");
        assert_eq!(controls.classifier.as_deref(), Some("win"));

        let glfw = table.lookup("org.lwjgl.glfw").unwrap().unwrap();
        assert_eq!(glfw.artifact, "lwjgl-glfw");
        assert_eq!(glfw.classifier, None);

        let glfw_natives = table.lookup("org.lwjgl.glfw.natives").unwrap().unwrap();
        assert_eq!(glfw_natives.artifact, "lwjgl-glfw");
        assert_eq!(glfw_natives.classifier.as_deref(), Some("natives-windows"));
    }

    #[test]
    fn test_custom_entries_take_precedence() {
        let table = CoordinateTable::bundled()
            .unwrap()
            .with_custom([(
                "org.opentest4j".to_string(),
                "org.opentest4j:opentest4j:1.1.1".to_string(),
            )])
            .with_patterns(&[PatternEntry {
                pattern: r"^com\.acme\.(\w+)$".to_string(),
                coordinate: "com.acme:acme-$1:2.0".to_string(),
            }])
            .unwrap();

        let opentest4j = table.lookup("org.opentest4j").unwrap().unwrap();
        assert_eq!(opentest4j.version.as_str(), "1.1.1");

        let acme = table.lookup("com.acme.tools").unwrap().unwrap();
        assert_eq!(acme.artifact, "acme-tools");
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let result = CoordinateTable::empty().with_patterns(&[PatternEntry {
            pattern: "(".to_string(),
            coordinate: "g:a:1".to_string(),
        }]);
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }
}
