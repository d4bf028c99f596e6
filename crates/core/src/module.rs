use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Modifier attached to a `requires` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiresModifier {
    Transitive,
    Static,
    Synthetic,
    Mandated,
}

impl RequiresModifier {
    /// Decode the access flags of a compiled `requires` entry
    pub fn from_flags(flags: u16) -> BTreeSet<Self> {
        let mut modifiers = BTreeSet::new();
        if flags & 0x0020 != 0 {
            modifiers.insert(Self::Transitive);
        }
        if flags & 0x0040 != 0 {
            modifiers.insert(Self::Static);
        }
        if flags & 0x1000 != 0 {
            modifiers.insert(Self::Synthetic);
        }
        if flags & 0x8000 != 0 {
            modifiers.insert(Self::Mandated);
        }
        modifiers
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Transitive => "transitive",
            Self::Static => "static",
            Self::Synthetic => "synthetic",
            Self::Mandated => "mandated",
        }
    }
}

impl fmt::Display for RequiresModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One `requires` clause of a module descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRequires {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub modifiers: BTreeSet<RequiresModifier>,
    /// Version recorded at compile time, or given inline in source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiled_version: Option<Version>,
}

impl ModuleRequires {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: BTreeSet::new(),
            compiled_version: None,
        }
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: RequiresModifier) -> Self {
        self.modifiers.insert(modifier);
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.compiled_version = Some(version);
        self
    }

    pub fn has(&self, modifier: RequiresModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Whether this requirement obliges the module to be present.
    ///
    /// Optional (`static`) requirements and those that only exist because the
    /// runtime implies them (`synthetic`, `mandated`) never force a fetch.
    pub fn forces_presence(&self) -> bool {
        !(self.has(RequiresModifier::Static)
            || self.has(RequiresModifier::Synthetic)
            || self.has(RequiresModifier::Mandated))
    }
}

/// A module declared by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<ModuleRequires>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<String>,
    /// Named only by an archive file, without a compiled descriptor
    #[serde(default)]
    pub automatic: bool,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            main_class: None,
            requires: Vec::new(),
            exports: Vec::new(),
            automatic: false,
        }
    }

    /// Descriptor for an archive that carries no compiled module info
    pub fn automatic(name: impl Into<String>) -> Self {
        Self {
            automatic: true,
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    #[must_use]
    pub fn with_requires(mut self, requires: ModuleRequires) -> Self {
        self.requires.push(requires);
        self
    }

    pub fn is_application(&self) -> bool {
        self.main_class.is_some()
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}
