use modsmith_core::{ModuleDescriptor, RequiresMap, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Where a set of declared modules comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Runtime,
    Library,
    Sources,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Runtime => "runtime",
            ProviderKind::Library => "library",
            ProviderKind::Sources => "sources",
        };
        f.write_str(name)
    }
}

/// Modules found by one provider together with what they require
#[derive(Debug, Clone, Default)]
pub struct ModuleScan {
    pub modules: Vec<ModuleDescriptor>,
    pub requires: RequiresMap,
}

impl ModuleScan {
    /// Scan whose requirements keep every `requires` clause
    pub fn all_requires(modules: Vec<ModuleDescriptor>) -> Self {
        let requires = RequiresMap::from_descriptors(&modules, false);
        Self { modules, requires }
    }

    /// Scan whose requirements skip clauses that never force a module to be present
    pub fn forcing_only(modules: Vec<ModuleDescriptor>) -> Self {
        let requires = RequiresMap::from_descriptors(&modules, true);
        Self { modules, requires }
    }

    pub fn declared(&self) -> BTreeSet<String> {
        self.modules.iter().map(|module| module.name.clone()).collect()
    }
}

/// A source of declared modules
pub trait ModuleProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn scan(&self) -> Result<ModuleScan>;
}
