use crate::errors::{Error, Result};
use crate::module::ModuleDescriptor;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A required module with the versions requested for it.
///
/// An empty version set means any version is acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub module: String,
    pub versions: BTreeSet<Version>,
}

impl Requirement {
    pub fn any(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            versions: BTreeSet::new(),
        }
    }

    pub fn exact(module: impl Into<String>, version: Version) -> Self {
        Self {
            module: module.into(),
            versions: BTreeSet::from([version]),
        }
    }

    /// Parse `name` or `name@version`
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let (module, version) = match value.split_once('@') {
            Some((module, version)) => (module.trim(), Some(version)),
            None => (value, None),
        };
        if module.is_empty() {
            return Err(Error::configuration(format!(
                "requirement '{value}' has no module name"
            )));
        }
        match version {
            Some(version) => Ok(Self::exact(module, Version::parse(version)?)),
            None => Ok(Self::any(module)),
        }
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.module)?;
        let mut versions = self.versions.iter();
        if let Some(first) = versions.next() {
            write!(f, "@{first}")?;
            for version in versions {
                write!(f, "|{version}")?;
            }
        }
        Ok(())
    }
}

/// Required module names mapped to the union of versions requested for them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiresMap {
    entries: BTreeMap<String, BTreeSet<Version>>,
}

impl RequiresMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the requirements of the given descriptors.
    ///
    /// With `forcing_only`, requirements that never force a fetch are left out.
    pub fn from_descriptors<'a>(
        descriptors: impl IntoIterator<Item = &'a ModuleDescriptor>,
        forcing_only: bool,
    ) -> Self {
        let mut map = Self::new();
        for descriptor in descriptors {
            for requires in &descriptor.requires {
                if forcing_only && !requires.forces_presence() {
                    continue;
                }
                match &requires.compiled_version {
                    Some(version) => map.insert_version(&requires.name, version.clone()),
                    None => map.insert(&requires.name),
                }
            }
        }
        map
    }

    /// Require a module without constraining its version
    pub fn insert(&mut self, module: &str) {
        self.entries.entry(module.to_string()).or_default();
    }

    pub fn insert_version(&mut self, module: &str, version: Version) {
        self.entries
            .entry(module.to_string())
            .or_default()
            .insert(version);
    }

    pub fn add(&mut self, requirement: Requirement) {
        self.entries
            .entry(requirement.module)
            .or_default()
            .extend(requirement.versions);
    }

    /// Union `other` into this map, per module
    pub fn merge(&mut self, other: &RequiresMap) {
        for (module, versions) in &other.entries {
            self.entries
                .entry(module.clone())
                .or_default()
                .extend(versions.iter().cloned());
        }
    }

    pub fn merge_all<'a>(maps: impl IntoIterator<Item = &'a RequiresMap>) -> Self {
        let mut merged = Self::new();
        for map in maps {
            merged.merge(map);
        }
        merged
    }

    /// Fail on the first module with more than one distinct requested version
    pub fn validate(&self) -> Result<()> {
        match self
            .entries
            .iter()
            .find(|(_, versions)| versions.len() > 1)
        {
            Some((module, versions)) => Err(Error::version_conflict(module, versions)),
            None => Ok(()),
        }
    }

    /// Required modules not in `declared`
    pub fn missing(&self, declared: &BTreeSet<String>) -> BTreeSet<String> {
        self.entries
            .keys()
            .filter(|module| !declared.contains(*module))
            .cloned()
            .collect()
    }

    pub fn versions(&self, module: &str) -> Option<&BTreeSet<Version>> {
        self.entries.get(module)
    }

    /// The requested version of `module` if exactly one was requested
    pub fn single_version(&self, module: &str) -> Option<&Version> {
        match self.entries.get(module) {
            Some(versions) if versions.len() == 1 => versions.iter().next(),
            _ => None,
        }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.entries.contains_key(module)
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, BTreeSet<Version>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Requirement> for RequiresMap {
    fn from_iter<I: IntoIterator<Item = Requirement>>(iter: I) -> Self {
        let mut map = Self::new();
        for requirement in iter {
            map.add(requirement);
        }
        map
    }
}

impl<'a> IntoIterator for &'a RequiresMap {
    type Item = (&'a String, &'a BTreeSet<Version>);
    type IntoIter = btree_map::Iter<'a, String, BTreeSet<Version>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleRequires, RequiresModifier};

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_requirement() {
        let any = Requirement::parse("org.junit.jupiter").unwrap();
        assert_eq!(any.module, "org.junit.jupiter");
        assert!(any.versions.is_empty());

        let exact = Requirement::parse("lib.x@1.2.3").unwrap();
        assert_eq!(exact.module, "lib.x");
        assert_eq!(exact.versions, BTreeSet::from([v("1.2.3")]));
        assert_eq!(exact.to_string(), "lib.x@1.2.3");

        assert!(Requirement::parse("@1.0").is_err());
        assert!(Requirement::parse("lib.x@").is_err());
    }

    #[test]
    fn test_merge_keeps_union() {
        let sources: RequiresMap = [Requirement::exact("mod.a", v("1.0"))].into_iter().collect();
        let library: RequiresMap = [Requirement::exact("mod.a", v("2.0")), Requirement::any("mod.b")]
            .into_iter()
            .collect();

        let merged = RequiresMap::merge_all([&sources, &library]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.versions("mod.a").map(BTreeSet::len), Some(2));
        assert!(merged.versions("mod.b").is_some_and(BTreeSet::is_empty));
    }

    #[test]
    fn test_validate_reports_conflict() {
        let sources: RequiresMap = [Requirement::exact("mod.a", v("1.0"))].into_iter().collect();
        let library: RequiresMap = [Requirement::exact("mod.a", v("2.0"))].into_iter().collect();
        let merged = RequiresMap::merge_all([&sources, &library]);

        let err = merged.validate().unwrap_err();
        match &err {
            Error::VersionConflict { module, versions } => {
                assert_eq!(module, "mod.a");
                assert_eq!(versions, &vec!["1.0".to_string(), "2.0".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_equal_versions_do_not_conflict() {
        let mut map = RequiresMap::new();
        map.insert_version("mod.a", v("1.0"));
        map.insert_version("mod.a", v("1.0.0"));
        map.insert("mod.a");
        assert!(map.validate().is_ok());
        assert_eq!(map.single_version("mod.a"), Some(&v("1.0")));
    }

    #[test]
    fn test_missing() {
        let map: RequiresMap = ["a", "b", "c"].into_iter().map(Requirement::any).collect();
        let declared = BTreeSet::from(["b".to_string()]);
        let missing: Vec<_> = map.missing(&declared).into_iter().collect();
        assert_eq!(missing, vec!["a", "c"]);
    }

    #[test]
    fn test_from_descriptors_filters_non_forcing() {
        let descriptor = ModuleDescriptor::new("app")
            .with_requires(ModuleRequires::new("lib.x").with_version(v("1.2.3")))
            .with_requires(ModuleRequires::new("lib.opt").with_modifier(RequiresModifier::Static))
            .with_requires(
                ModuleRequires::new("java.base").with_modifier(RequiresModifier::Mandated),
            );

        let forcing = RequiresMap::from_descriptors([&descriptor], true);
        assert_eq!(forcing.modules().collect::<Vec<_>>(), vec!["lib.x"]);
        assert_eq!(forcing.single_version("lib.x"), Some(&v("1.2.3")));

        let all = RequiresMap::from_descriptors([&descriptor], false);
        assert_eq!(all.len(), 3);
    }
}
